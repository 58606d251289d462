//! The message orchestrator (component L): drives the first line,
//! header section, and body through one resumable state machine, and
//! dispatches each header line to its typed sub-parser.

use crate::catalog::HdrKind;
use crate::error::{Outcome, PResult, SipError};
use crate::field::Field;
use crate::firstline::{parse_first_line, FirstLine};
use crate::headerline::{parse_header_line, HeaderLine};
use crate::headers::{
    parse_bounded_uint, parse_call_id, parse_cseq, parse_name_addr, ContactList, CSeq, HeaderList, NameAddr,
    CONTENT_LENGTH_BOUNDS, EXPIRES_BOUNDS,
};

/// Flags controlling how [`Message::step`] frames the body and how it
/// treats a truncated buffer, per the orchestrator's three body policies.
pub type StepFlags = u8;

/// Skip body consumption entirely: the moment headers end, the body is
/// left empty and the message is finished, regardless of Content-Length.
pub const SKIP_BODY: StepFlags = 1 << 0;
/// Content-Length is mandatory; its absence is reported as [`SipError::NoClen`]
/// instead of falling back to consume-to-end-of-buffer framing.
pub const CLEN_REQUIRED: StepFlags = 1 << 1;
/// No further bytes will ever arrive for this message. A truncated
/// first line, header section, or Content-Length-framed body is
/// reported as [`SipError::Trunc`] instead of `Outcome::MoreBytes`.
pub const NO_MORE_DATA: StepFlags = 1 << 2;

/// Which section of the message [`Message::step`] is currently in.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Phase {
    /// Nothing parsed yet.
    #[default]
    Init,
    /// Parsing the Request-Line or Status-Line.
    FirstLine,
    /// Parsing header lines.
    Headers,
    /// Consuming the message body.
    Body,
    /// The whole message has been parsed.
    Fin,
}

/// Which well-known headers have actually been seen, so callers can
/// distinguish "absent" from "present but empty".
#[derive(Copy, Clone, Debug, Default)]
pub struct Flags {
    /// A Via header was seen.
    pub has_via: bool,
    /// A From header was seen.
    pub has_from: bool,
    /// A To header was seen.
    pub has_to: bool,
    /// A Call-ID header was seen.
    pub has_call_id: bool,
    /// A CSeq header was seen.
    pub has_cseq: bool,
    /// A Max-Forwards header was seen.
    pub has_max_forwards: bool,
    /// A Content-Length header was seen.
    pub has_content_length: bool,
    /// An Expires header was seen.
    pub has_expires: bool,
}

/// A fully- or partially-parsed SIP message. Every call to [`Message::step`]
/// resumes from wherever the last one left off; `buf` only ever grows at
/// the tail between calls.
#[derive(Clone, Debug, Default)]
pub struct Message {
    /// The Request-Line or Status-Line.
    pub first_line: FirstLine,
    /// Which well-known headers were actually seen.
    pub flags: Flags,
    /// Every header line seen, in order, for signature purposes.
    pub headers: HeaderList,

    /// From header, parsed as a name-addr.
    pub from: NameAddr,
    /// To header, parsed as a name-addr.
    pub to: NameAddr,
    /// Call-ID header value.
    pub call_id: Field,
    /// CSeq header, parsed into number and method.
    pub cseq: CSeq,
    /// Max-Forwards header value.
    pub max_forwards: u32,
    /// Contact header values.
    pub contacts: ContactList,
    /// Content-Length header value.
    pub content_length: u32,
    /// Expires header value.
    pub expires: u32,
    /// P-Asserted-Identity header values; like Contact, this is a
    /// comma-separated list of name-addrs, not a single value.
    pub p_asserted_identity: ContactList,
    /// Route header values.
    pub route: ContactList,
    /// Record-Route header values.
    pub record_route: ContactList,
    /// Most recent Via raw value; `headers.seen` distinguishes "one Via"
    /// from "several Via"s this crate doesn't separately store.
    pub via: Field,

    /// The message body, framed by Content-Length.
    pub body: Field,

    phase: Phase,
    current: HeaderLine,
}

impl Message {
    /// Resets this message to its default state, discarding any
    /// in-progress scan.
    pub fn reset(&mut self) {
        *self = Message::default();
    }

    /// Advances parsing as far as `buf` allows, starting at `i`. Returns
    /// `Outcome::Ok` once the whole message (headers + body) has been
    /// consumed, `Outcome::MoreBytes` if more data is needed, or an
    /// error for anything structurally invalid. `flags` selects the
    /// body-framing and truncation policy; see [`SKIP_BODY`],
    /// [`CLEN_REQUIRED`], [`NO_MORE_DATA`].
    pub fn step(&mut self, buf: &[u8], i: usize, flags: StepFlags) -> PResult {
        let mut pos = i;

        if self.phase == Phase::Init {
            self.phase = Phase::FirstLine;
        }

        if self.phase == Phase::FirstLine {
            match parse_first_line(buf, pos, &mut self.first_line)? {
                (end, Outcome::MoreBytes) => return more_bytes_or_trunc(end, flags),
                (end, _) => {
                    log::trace!("first line parsed, request={}", self.first_line.is_request);
                    pos = end;
                    self.phase = Phase::Headers;
                }
            }
        }

        if self.phase == Phase::Headers {
            loop {
                match parse_header_line(buf, pos, &mut self.current)? {
                    (end, Outcome::MoreBytes) => return more_bytes_or_trunc(end, flags),
                    (end, Outcome::Empty) => {
                        log::debug!("headers done, {} lines seen", self.headers.seen);
                        pos = end;
                        self.phase = Phase::Body;
                        break;
                    }
                    (end, _) => {
                        self.dispatch_header(buf)?;
                        pos = end;
                        self.current.reset();
                    }
                }
            }
        }

        if self.phase == Phase::Body {
            return self.consume_body(buf, pos, flags);
        }

        Ok((pos, Outcome::Ok))
    }

    fn dispatch_header(&mut self, buf: &[u8]) -> Result<(), (usize, SipError)> {
        let hl = &self.current;
        self.headers.push(hl.kind, hl.compact);
        let value = hl.value;

        match hl.kind {
            HdrKind::Via => {
                self.via = value;
                self.flags.has_via = true;
            }
            HdrKind::From => {
                parse_name_addr(buf, value.offs(), &mut self.from).map_err(|(_, e)| e)?;
                self.flags.has_from = true;
            }
            HdrKind::To => {
                parse_name_addr(buf, value.offs(), &mut self.to).map_err(|(_, e)| e)?;
                self.flags.has_to = true;
            }
            HdrKind::CallId => {
                self.call_id = parse_call_id(buf, value).map_err(|e| (value.offs(), e))?;
                self.flags.has_call_id = true;
            }
            HdrKind::CSeq => {
                self.cseq = parse_cseq(buf, value).map_err(|e| (value.offs(), e))?;
                self.flags.has_cseq = true;
            }
            HdrKind::MaxForwards => {
                self.max_forwards = parse_bounded_uint(buf, value, EXPIRES_BOUNDS).map_err(|e| (value.offs(), e))?;
                self.flags.has_max_forwards = true;
            }
            HdrKind::Contact => {
                self.contacts.parse_all(buf, value.offs()).map_err(|(_, e)| e)?;
            }
            HdrKind::ContentLength => {
                self.content_length =
                    parse_bounded_uint(buf, value, CONTENT_LENGTH_BOUNDS).map_err(|e| (value.offs(), e))?;
                self.flags.has_content_length = true;
            }
            HdrKind::Expires => {
                self.expires = parse_bounded_uint(buf, value, EXPIRES_BOUNDS).map_err(|e| (value.offs(), e))?;
                self.flags.has_expires = true;
            }
            HdrKind::PAssertedIdentity => {
                self.p_asserted_identity.parse_all(buf, value.offs()).map_err(|(_, e)| e)?;
                if self.p_asserted_identity.star {
                    return Err((value.offs(), SipError::ValBad));
                }
            }
            HdrKind::Route => {
                self.route.parse_all(buf, value.offs()).map_err(|(_, e)| e)?;
            }
            HdrKind::RecordRoute => {
                self.record_route.parse_all(buf, value.offs()).map_err(|(_, e)| e)?;
            }
            HdrKind::UserAgent | HdrKind::Other | HdrKind::None => {}
        }
        Ok(())
    }

    fn consume_body(&mut self, buf: &[u8], pos: usize, flags: StepFlags) -> PResult {
        if flags & SKIP_BODY != 0 {
            self.body = Field::from_range(pos, pos);
            self.phase = Phase::Fin;
            return Ok((pos, Outcome::Ok));
        }

        if self.flags.has_content_length {
            let need = self.content_length as usize;
            let available = buf.len().saturating_sub(pos);
            if available < need {
                if flags & NO_MORE_DATA != 0 {
                    // Permit the truncation: deliver whatever is present
                    // as the body, but the message as a whole is
                    // terminally truncated, not merely incomplete.
                    self.body = Field::from_range(pos, buf.len());
                    log::debug!("body truncated, wanted {} got {}", need, available);
                    return Err((buf.len(), SipError::Trunc));
                }
                return Ok((pos, Outcome::MoreBytes));
            }
            self.body = Field::from_range(pos, pos + need);
            let end = pos + need;
            self.phase = Phase::Fin;
            log::trace!("body consumed, {} bytes", need);
            Ok((end, Outcome::Ok))
        } else if flags & CLEN_REQUIRED != 0 {
            log::debug!("no Content-Length and CLEN_REQUIRED set");
            Err((pos, SipError::NoClen))
        } else {
            // No Content-Length and none required: there is no framing
            // information at all, so whatever is currently in the
            // buffer is taken to be the whole body.
            let end = buf.len();
            self.body = Field::from_range(pos, end);
            self.phase = Phase::Fin;
            log::trace!("body consumed to end of buffer, {} bytes", end - pos);
            Ok((end, Outcome::Ok))
        }
    }
}

fn more_bytes_or_trunc(end: usize, flags: StepFlags) -> PResult {
    if flags & NO_MORE_DATA != 0 {
        Err((end, SipError::Trunc))
    } else {
        Ok((end, Outcome::MoreBytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVITE: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
Content-Length: 4\r\n\
\r\n\
BODY";

    #[test]
    fn full_invite_round_trip() {
        let mut msg = Message::default();
        let (end, outcome) = msg.step(INVITE, 0, 0).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, INVITE.len());
        assert!(msg.first_line.is_request);
        assert_eq!(msg.max_forwards, 70);
        assert_eq!(msg.call_id.get(INVITE), b"a84b4c76e66710@pc33.atlanta.com");
        assert_eq!(msg.cseq.number, 314159);
        assert_eq!(msg.from.tag.get(INVITE), b"1928301774");
        assert_eq!(msg.contacts.values().len(), 1);
        assert_eq!(msg.body.get(INVITE), b"BODY");
        assert!(msg.flags.has_content_length);
    }

    #[test]
    fn resumable_across_arbitrary_splits() {
        for split in 1..INVITE.len() {
            let mut msg = Message::default();
            let first = &INVITE[..split];
            if let Ok((_, Outcome::Ok)) = msg.step(first, 0, 0) {
                continue;
            }
            let (end, outcome) = msg.step(INVITE, 0, 0).unwrap();
            assert_eq!(outcome, Outcome::Ok);
            assert_eq!(end, INVITE.len());
            assert_eq!(msg.body.get(INVITE), b"BODY");
        }
    }

    #[test]
    fn missing_content_length_consumes_to_end_of_buffer() {
        let input = b"OPTIONS sip:bob@biloxi.com SIP/2.0\r\nCall-ID: x@y\r\n\r\nwhatever is left";
        let mut msg = Message::default();
        let (end, outcome) = msg.step(input, 0, 0).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, input.len());
        assert_eq!(msg.body.get(input), b"whatever is left");
    }

    #[test]
    fn missing_content_length_with_clen_required_is_an_error() {
        let input = b"OPTIONS sip:bob@biloxi.com SIP/2.0\r\nCall-ID: x@y\r\n\r\n";
        let mut msg = Message::default();
        let err = msg.step(input, 0, CLEN_REQUIRED).unwrap_err();
        assert_eq!(err.1, SipError::NoClen);
    }

    #[test]
    fn skip_body_leaves_body_empty_even_with_content_length() {
        let mut msg = Message::default();
        let (end, outcome) = msg.step(INVITE, 0, SKIP_BODY).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert!(msg.body.is_empty());
        assert!(end < INVITE.len(), "body bytes are left unconsumed");
    }

    #[test]
    fn truncated_content_length_body_with_no_more_data_is_terminal() {
        let input = b"OPTIONS sip:bob@biloxi.com SIP/2.0\r\nCall-ID: x@y\r\nContent-Length: 10\r\n\r\nshort";
        let mut msg = Message::default();
        let err = msg.step(input, 0, NO_MORE_DATA).unwrap_err();
        assert_eq!(err.1, SipError::Trunc);
        assert_eq!(msg.body.get(input), b"short");
    }

    #[test]
    fn truncated_content_length_body_without_no_more_data_asks_for_more() {
        let input = b"OPTIONS sip:bob@biloxi.com SIP/2.0\r\nCall-ID: x@y\r\nContent-Length: 10\r\n\r\nshort";
        let mut msg = Message::default();
        let (_, outcome) = msg.step(input, 0, 0).unwrap();
        assert_eq!(outcome, Outcome::MoreBytes);
    }

    #[test]
    fn truncated_headers_with_no_more_data_is_terminal() {
        let input = b"OPTIONS sip:bob@biloxi.com SIP/2.0\r\nCall-ID: x@y";
        let mut msg = Message::default();
        let err = msg.step(input, 0, NO_MORE_DATA).unwrap_err();
        assert_eq!(err.1, SipError::Trunc);
    }
}
