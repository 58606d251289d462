//! Header-line grammar (component K): `name SP* ":" LWS* value LWS* CRLF`,
//! with the blank line that ends the header section recognized as its
//! own outcome. Dispatch to a header's typed body parser happens one
//! level up, in [`crate::message`] — this module only delimits name and
//! value and classifies the name via the header catalog.

use crate::catalog::{is_compact_form, lookup_header, HdrKind};
use crate::error::{Outcome, PResult, SipError};
use crate::field::Field;
use crate::lex::{skip_crlf, skip_lws, skip_token, CrlfStatus, LwsStatus};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
enum Phase {
    #[default]
    Start,
    Name,
    Colon,
    Value,
    Done,
}

/// One delimited header line.
#[derive(Copy, Clone, Debug, Default)]
pub struct HeaderLine {
    /// Raw header name, as written on the line.
    pub name: Field,
    /// Which well-known header this name resolves to.
    pub kind: HdrKind,
    /// Whether the name used its compact (single-letter) form.
    pub compact: bool,
    /// Raw value, LWS-trimmed at both ends; any interior folded CRLFs
    /// remain as literal bytes (zero-copy — nothing is rewritten).
    pub value: Field,
    phase: Phase,
    name_end: usize,
}

impl HeaderLine {
    /// Resets this header line to its default state, discarding any
    /// in-progress scan.
    pub fn reset(&mut self) {
        *self = HeaderLine::default();
    }
}

/// Parses one header line (or the blank line ending the header
/// section) starting at `i`. `Outcome::Empty` means the blank line was
/// consumed and there are no more headers; `Outcome::Ok` means a header
/// was fully parsed.
pub fn parse_header_line(buf: &[u8], i: usize, hl: &mut HeaderLine) -> PResult {
    if hl.phase == Phase::Start {
        let (end, _, status) = skip_crlf(buf, i);
        match status {
            CrlfStatus::Ok => return Ok((end, Outcome::Empty)),
            CrlfStatus::MoreBytes => return Ok((i, Outcome::MoreBytes)),
            CrlfStatus::NoCr => {}
        }
        let name_end = skip_token(buf, i);
        if name_end >= buf.len() {
            return Ok((name_end, Outcome::MoreBytes));
        }
        if name_end == i {
            return Err((i, SipError::BadChar));
        }
        hl.name = Field::from_range(i, name_end);
        hl.compact = is_compact_form(hl.name.get(buf));
        hl.kind = lookup_header(hl.name.get(buf));
        hl.name_end = name_end;
        hl.phase = Phase::Colon;
    }

    if hl.phase == Phase::Colon {
        let mut pos = hl.name_end;
        while pos < buf.len() && matches!(buf[pos], b' ' | b'\t') {
            pos += 1;
        }
        if pos >= buf.len() {
            return Ok((pos, Outcome::MoreBytes));
        }
        if buf[pos] != b':' {
            return Err((pos, SipError::BadChar));
        }
        pos += 1;
        let (after_sws, _, status) = skip_lws(buf, pos);
        match status {
            LwsStatus::MoreBytes => return Ok((pos, Outcome::MoreBytes)),
            LwsStatus::EndOfHeader => {
                // Value is empty and the line ends right after the colon.
                hl.value = Field::from_range(pos, pos);
                hl.phase = Phase::Done;
                return Ok((after_sws, Outcome::Ok));
            }
            LwsStatus::Ok => {
                hl.name_end = after_sws; // reuse as "value scan start"
                hl.phase = Phase::Value;
            }
        }
    }

    scan_value(buf, hl)
}

fn scan_value(buf: &[u8], hl: &mut HeaderLine) -> PResult {
    let value_start = hl.name_end;
    let mut pos = value_start;
    let mut value_end = value_start;
    loop {
        while pos < buf.len() && !matches!(buf[pos], b' ' | b'\t' | b'\r' | b'\n') {
            pos += 1;
        }
        if pos >= buf.len() {
            return Ok((pos, Outcome::MoreBytes));
        }
        value_end = pos;
        let (after, _, status) = skip_lws(buf, pos);
        match status {
            LwsStatus::MoreBytes => return Ok((pos, Outcome::MoreBytes)),
            LwsStatus::EndOfHeader => {
                hl.value = Field::from_range(value_start, value_end);
                hl.phase = Phase::Done;
                return Ok((after, Outcome::Ok));
            }
            LwsStatus::Ok => pos = after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_header() {
        let v = b"Call-ID: a84b4c76e66710\r\n";
        let mut hl = HeaderLine::default();
        let (end, outcome) = parse_header_line(v, 0, &mut hl).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, v.len());
        assert_eq!(hl.name.get(v), b"Call-ID");
        assert_eq!(hl.kind, HdrKind::CallId);
        assert_eq!(hl.value.get(v), b"a84b4c76e66710");
    }

    #[test]
    fn compact_form_recognized() {
        let v = b"f: sip:alice@atlanta.com\r\n";
        let mut hl = HeaderLine::default();
        let (_, outcome) = parse_header_line(v, 0, &mut hl).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert!(hl.compact);
        assert_eq!(hl.kind, HdrKind::From);
    }

    #[test]
    fn folded_value_kept_raw() {
        let v = b"Subject: Project X\r\n  Discussion\r\n";
        let mut hl = HeaderLine::default();
        let (end, outcome) = parse_header_line(v, 0, &mut hl).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, v.len());
        assert_eq!(hl.value.get(v), b"Project X\r\n  Discussion");
    }

    #[test]
    fn blank_line_ends_headers() {
        let v = b"\r\nbody";
        let mut hl = HeaderLine::default();
        let (end, outcome) = parse_header_line(v, 0, &mut hl).unwrap();
        assert_eq!(outcome, Outcome::Empty);
        assert_eq!(end, 2);
    }

    #[test]
    fn colon_with_no_leading_space_before_it() {
        let v = b"To :sip:bob@b.com\r\n";
        let mut hl = HeaderLine::default();
        let (_, outcome) = parse_header_line(v, 0, &mut hl).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(hl.value.get(v), b"sip:bob@b.com");
    }

    #[test]
    fn split_mid_header_resumes() {
        let full = b"Max-Forwards: 70\r\n";
        for split in 1..full.len() {
            let mut hl = HeaderLine::default();
            if let Ok((_, Outcome::Ok)) = parse_header_line(&full[..split], 0, &mut hl) {
                continue;
            }
            let (end, outcome) = parse_header_line(full, 0, &mut hl).unwrap();
            assert_eq!(outcome, Outcome::Ok);
            assert_eq!(end, full.len());
            assert_eq!(hl.value.get(full), b"70");
        }
    }
}
