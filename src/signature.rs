//! Message signatures (component M): a compact, fixed-size fingerprint
//! of a request's shape — method plus the order and compactness of a
//! fixed set of well-known headers, plus a character-class sketch of
//! the Call-ID and From-tag — cheap enough to compute on every message
//! and compare without ever touching the bytes again.
//!
//! Replies carry no signature: [`compute`] returns [`MsgSig::EMPTY`]
//! whenever [`crate::firstline::FirstLine::is_request`] is false.

use crate::catalog::{HdrKind, Method};
use crate::field::Field;
use crate::ip::{contains_ip4, contains_ip6};
use crate::message::Message;

/// The recognized headers a signature tracks, in the fixed order their
/// 3-bit position is drawn from. `Contact` only contributes a position
/// on `INVITE`; every other entry applies to any request method.
const SIGNATURE_SET: [HdrKind; 8] = [
    HdrKind::CallId,
    HdrKind::Contact,
    HdrKind::CSeq,
    HdrKind::From,
    HdrKind::MaxForwards,
    HdrKind::To,
    HdrKind::Via,
    HdrKind::UserAgent,
];

/// Number of ASCII hex characters [`MsgSig::write_hex`] ever emits:
/// 1 (method) + 8 (header ids) + 1 + 4 + 2 (Call-ID: `I` + flags + len)
/// + 1 + 4 (From-tag: `F` + flags).
pub const MAX_SIG_CHARS: usize = 1 + SIGNATURE_SET.len() + 7 + 5;

/// A single-pass character-class sketch of a short opaque string (a
/// Call-ID or a From-tag), per [`classify`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ClassSig {
    /// The 16 classification flags, packed per [`classify`]'s doc.
    pub flags: u16,
    /// Length of the classified string in bytes, after eliding any
    /// skipped range, capped at 255.
    pub len: u8,
}

const FLAG_AT: u16 = 1 << 0;
const FLAG_DOT: u16 = 1 << 1;
const FLAG_COLON: u16 = 1 << 2;
const FLAG_DASH: u16 = 1 << 3;
const FLAG_STAR: u16 = 1 << 4;
const FLAG_SLASH: u16 = 1 << 5;
const FLAG_PLUS: u16 = 1 << 6;
const FLAG_EQ: u16 = 1 << 7;
const FLAG_UNDERSCORE: u16 = 1 << 8;
const FLAG_PIPE: u16 = 1 << 9;
const FLAG_HEX: u16 = 1 << 10;
const FLAG_BASE64: u16 = 1 << 11;
const FLAG_DIG_BLOCKS: u16 = 1 << 12;
const FLAG_IP_START: u16 = 1 << 13;
const FLAG_IP_MIDDLE: u16 = 1 << 14;
const FLAG_IP_END: u16 = 1 << 15;

#[inline]
fn is_block_separator(b: u8) -> bool {
    matches!(
        b,
        b'@' | b'.' | b':' | b'-' | b'*' | b'/' | b'+' | b'=' | b'_' | b'|' | b'&'
    )
}

#[inline]
fn is_base64_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

/// Scans `s` once, optionally eliding the byte range `skip` (used to
/// drop an embedded IP literal before classification), and builds a
/// [`ClassSig`]. Tracks, over the non-skipped bytes: the separator
/// characters observed (`@ . : - * / + = _ |`, each its own flag bit),
/// whether the string is an even-length run of hex digits in a single
/// case (`hex_encoding`, length >= 10), whether it's a valid base64
/// string (`base64_encoding`, length >= 10 and a multiple of 4, `=`
/// only as up to two trailing padding characters), and whether a
/// single separator byte splits the string into equal-length digit
/// blocks (`dig_blocks`). `ip_start`/`ip_middle`/`ip_end` record where
/// `skip` fell relative to `s`.
pub fn classify(s: &[u8], skip: Option<(usize, usize)>) -> ClassSig {
    let mut flags: u16 = 0;
    let mut eff_len: usize = 0;

    let mut saw_lower = false;
    let mut saw_upper = false;
    let mut hex_ok = true;

    let mut base64_ok = true;
    let mut pad_started = false;
    let mut pad_count = 0u8;

    let mut single_sep: Option<u8> = None;
    let mut multi_sep = false;
    let mut block_len: usize = 0;
    let mut established_block_len: Option<usize> = None;
    let mut dig_blocks_ok = true;
    let mut saw_separator = false;

    for (idx, &b) in s.iter().enumerate() {
        if let Some((start, end)) = skip {
            if idx >= start && idx < end {
                continue;
            }
        }
        eff_len += 1;

        if b.is_ascii_hexdigit() {
            if b.is_ascii_lowercase() {
                saw_lower = true;
            }
            if b.is_ascii_uppercase() {
                saw_upper = true;
            }
        } else {
            hex_ok = false;
        }

        if is_base64_char(b) {
            if b == b'=' {
                pad_started = true;
                pad_count += 1;
            } else if pad_started {
                base64_ok = false;
            }
        } else {
            base64_ok = false;
        }

        match b {
            b'@' => flags |= FLAG_AT,
            b'.' => flags |= FLAG_DOT,
            b':' => flags |= FLAG_COLON,
            b'-' => flags |= FLAG_DASH,
            b'*' => flags |= FLAG_STAR,
            b'/' => flags |= FLAG_SLASH,
            b'+' => flags |= FLAG_PLUS,
            b'=' => flags |= FLAG_EQ,
            b'_' => flags |= FLAG_UNDERSCORE,
            b'|' => flags |= FLAG_PIPE,
            _ => {}
        }

        if is_block_separator(b) {
            saw_separator = true;
            match single_sep {
                None => single_sep = Some(b),
                Some(c) if c != b => multi_sep = true,
                _ => {}
            }
            match established_block_len {
                None => established_block_len = Some(block_len),
                Some(l) if l != block_len => dig_blocks_ok = false,
                _ => {}
            }
            if block_len == 0 {
                dig_blocks_ok = false;
            }
            block_len = 0;
        } else if b.is_ascii_digit() {
            block_len += 1;
        } else {
            dig_blocks_ok = false;
        }
    }

    if !saw_separator || multi_sep || eff_len == 0 {
        dig_blocks_ok = false;
    } else if established_block_len != Some(block_len) {
        dig_blocks_ok = false;
    }

    let hex_encoding = hex_ok
        && eff_len >= 10
        && !(saw_lower && saw_upper)
        && (eff_len % 2 == 0 || (dig_blocks_ok && block_len % 2 == 0));
    let base64_encoding = base64_ok && pad_count <= 2 && eff_len >= 10 && eff_len % 4 == 0;

    if hex_encoding {
        flags |= FLAG_HEX;
    }
    if base64_encoding {
        flags |= FLAG_BASE64;
    }
    if dig_blocks_ok {
        flags |= FLAG_DIG_BLOCKS;
    }

    if let Some((start, end)) = skip {
        if start == 0 {
            flags |= FLAG_IP_START;
        } else if end >= s.len() {
            flags |= FLAG_IP_END;
        } else {
            flags |= FLAG_IP_MIDDLE;
        }
    }

    ClassSig {
        flags,
        len: eff_len.min(255) as u8,
    }
}

fn find_embedded_ip(s: &[u8]) -> Option<(usize, usize)> {
    if let Some((start, end, _)) = contains_ip4(s, 0) {
        return Some((start, end));
    }
    if let Some((start, end, _)) = contains_ip6(s, 0) {
        return Some((start, end));
    }
    None
}

/// Maps a [`Method`] to the 4-bit code [`MsgSig::write_hex`] emits for
/// it. Stable across crate versions since it's part of the wire format
/// of a signature string, not an implementation detail.
fn method_code(m: Method) -> u8 {
    match m {
        Method::Invite => 0,
        Method::Ack => 1,
        Method::Options => 2,
        Method::Bye => 3,
        Method::Cancel => 4,
        Method::Register => 5,
        Method::Prack => 6,
        Method::Subscribe => 7,
        Method::Notify => 8,
        Method::Publish => 9,
        Method::Info => 10,
        Method::Refer => 11,
        Method::Message => 12,
        Method::Update => 13,
        Method::Other => 14,
    }
}

#[inline]
fn hex_digit(n: u8) -> u8 {
    match n & 0xf {
        0..=9 => b'0' + (n & 0xf),
        v => b'a' + (v - 10),
    }
}

/// A request's fingerprint: method, the order/compactness of a fixed
/// header set, and character-class sketches of its Call-ID and
/// From-tag. Empty (all-zero) for responses and for any request whose
/// first line hasn't been classified yet.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct MsgSig {
    /// The request method this signature was computed for.
    pub method: Method,
    header_ids: [u8; SIGNATURE_SET.len()],
    header_id_count: usize,
    /// Character-class sketch of the Call-ID, with any embedded IP
    /// literal elided first.
    pub call_id: ClassSig,
    /// Character-class flags of the From-tag (its length isn't part of
    /// the wire format, so only `flags` is kept).
    pub from_tag_flags: u16,
}

impl MsgSig {
    /// The signature of a response, or of a request not yet parsed far
    /// enough to compute one.
    pub const EMPTY: MsgSig = MsgSig {
        method: Method::Other,
        header_ids: [0; SIGNATURE_SET.len()],
        header_id_count: 0,
        call_id: ClassSig { flags: 0, len: 0 },
        from_tag_flags: 0,
    };

    /// The header ids this signature carries, one 4-bit id (3-bit
    /// position in [`SIGNATURE_SET`], 1-bit compact-form flag) per
    /// first occurrence of a recognized header, in appearance order.
    pub fn header_ids(&self) -> &[u8] {
        &self.header_ids[..self.header_id_count]
    }

    /// Writes this signature's hex form into `out`, returning the
    /// number of bytes written (at most [`MAX_SIG_CHARS`]). Format: one
    /// hex digit for the method, one hex digit per header id, `I` + 4
    /// hex digits (Call-ID flags) + 2 hex digits (Call-ID length),
    /// `F` + 4 hex digits (From-tag flags).
    pub fn write_hex(&self, out: &mut [u8]) -> usize {
        let mut n = 0;
        let mut put = |byte: u8| {
            out[n] = byte;
            n += 1;
        };

        put(hex_digit(method_code(self.method)));
        for &id in self.header_ids() {
            put(hex_digit(id));
        }

        put(b'I');
        for shift in [12, 8, 4, 0] {
            put(hex_digit(((self.call_id.flags >> shift) & 0xf) as u8));
        }
        for shift in [4, 0] {
            put(hex_digit((self.call_id.len >> shift) & 0xf));
        }

        put(b'F');
        for shift in [12, 8, 4, 0] {
            put(hex_digit(((self.from_tag_flags >> shift) & 0xf) as u8));
        }

        n
    }

    /// [`MsgSig::write_hex`], allocating its own `String`. Only
    /// available with the `std` feature; `write_hex` works everywhere.
    #[cfg(feature = "std")]
    pub fn to_string(&self) -> std::string::String {
        let mut buf = [0u8; MAX_SIG_CHARS];
        let n = self.write_hex(&mut buf);
        std::string::String::from_utf8(buf[..n].to_vec()).expect("write_hex only emits ASCII")
    }
}

/// Computes the signature of `msg` against its own buffer `buf`. Always
/// [`MsgSig::EMPTY`] for a response.
pub fn compute(msg: &Message, buf: &[u8]) -> MsgSig {
    if !msg.first_line.is_request {
        return MsgSig::EMPTY;
    }
    let method = msg.first_line.method;

    let mut header_ids = [0u8; SIGNATURE_SET.len()];
    let mut count = 0usize;
    let mut seen = [false; SIGNATURE_SET.len()];

    for &(kind, compact) in msg.headers.entries() {
        if kind == HdrKind::Contact && method != Method::Invite {
            continue;
        }
        if let Some(pos) = SIGNATURE_SET.iter().position(|&k| k == kind) {
            if seen[pos] {
                continue;
            }
            seen[pos] = true;
            if count < header_ids.len() {
                header_ids[count] = ((pos as u8) << 1) | (compact as u8);
                count += 1;
            }
        }
    }

    let call_id_bytes = field_bytes(msg.call_id, buf);
    let skip = find_embedded_ip(call_id_bytes);
    let call_id = classify(call_id_bytes, skip);

    let from_tag_bytes = field_bytes(msg.from.tag, buf);
    let from_tag = classify(from_tag_bytes, None);

    MsgSig {
        method,
        header_ids,
        header_id_count: count,
        call_id,
        from_tag_flags: from_tag.flags,
    }
}

#[inline]
fn field_bytes(f: Field, buf: &[u8]) -> &[u8] {
    f.get(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Outcome;

    #[test]
    fn classify_plain_decimal_is_not_hex_or_base64() {
        let sig = classify(b"1234567890", None);
        assert_eq!(sig.flags & FLAG_HEX, 0);
        assert_eq!(sig.flags & FLAG_BASE64, 0);
        assert_eq!(sig.len, 10);
    }

    #[test]
    fn classify_recognizes_monocase_hex() {
        let sig = classify(b"a84b4c76e6671000", None);
        assert_ne!(sig.flags & FLAG_HEX, 0);
    }

    #[test]
    fn classify_mixed_case_hex_chars_is_not_hex_encoding() {
        let sig = classify(b"A84b4C76e6671000", None);
        assert_eq!(sig.flags & FLAG_HEX, 0);
    }

    #[test]
    fn classify_short_string_never_flags_hex_or_base64() {
        let sig = classify(b"ab12", None);
        assert_eq!(sig.flags & FLAG_HEX, 0);
        assert_eq!(sig.flags & FLAG_BASE64, 0);
    }

    #[test]
    fn classify_recognizes_base64() {
        let sig = classify(b"YWxpY2U6c2VjcmV0==", None);
        assert_ne!(sig.flags & FLAG_BASE64, 0);
    }

    #[test]
    fn classify_dig_blocks_on_equal_length_runs() {
        let sig = classify(b"1234-5678-9012", None);
        assert_ne!(sig.flags & FLAG_DIG_BLOCKS, 0);
        assert_ne!(sig.flags & FLAG_DASH, 0);
    }

    #[test]
    fn classify_uneven_blocks_is_not_dig_blocks() {
        let sig = classify(b"12-3456-78", None);
        assert_eq!(sig.flags & FLAG_DIG_BLOCKS, 0);
    }

    #[test]
    fn classify_elides_skip_range_from_length_and_flags() {
        let whole = b"pc33.192.0.2.1.atlanta.com";
        let (start, end) = find_embedded_ip(whole).unwrap();
        let sig = classify(whole, Some((start, end)));
        assert_eq!(sig.len as usize, whole.len() - (end - start));
        assert_ne!(sig.flags & FLAG_IP_MIDDLE, 0);
    }

    const INVITE: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
User-Agent: softphone\r\n\
Content-Length: 0\r\n\r\n";

    #[test]
    fn invite_signature_includes_contact() {
        let mut msg = Message::default();
        let (_, outcome) = msg.step(INVITE, 0, 0).unwrap();
        assert_eq!(outcome, Outcome::Ok);

        let sig = compute(&msg, INVITE);
        assert_eq!(sig.method, Method::Invite);
        // Via, Max-Forwards, To, From, Call-ID, CSeq, Contact, User-Agent.
        assert_eq!(sig.header_ids().len(), 8);
    }

    const OPTIONS: &[u8] = b"OPTIONS sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 1 OPTIONS\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
Content-Length: 0\r\n\r\n";

    #[test]
    fn contact_is_omitted_on_non_invite() {
        let mut msg = Message::default();
        let (_, outcome) = msg.step(OPTIONS, 0, 0).unwrap();
        assert_eq!(outcome, Outcome::Ok);

        let sig = compute(&msg, OPTIONS);
        assert_eq!(sig.method, Method::Options);
        // Via, Max-Forwards, To, From, Call-ID, CSeq: Contact excluded.
        assert_eq!(sig.header_ids().len(), 6);
        let contact_pos = SIGNATURE_SET.iter().position(|&k| k == HdrKind::Contact).unwrap() as u8;
        for &id in sig.header_ids() {
            assert_ne!(id >> 1, contact_pos);
        }
    }

    #[test]
    fn responses_have_empty_signature() {
        let input = b"SIP/2.0 200 OK\r\nCSeq: 1 INVITE\r\nContent-Length: 0\r\n\r\n";
        let mut msg = Message::default();
        let (_, outcome) = msg.step(input, 0, 0).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(compute(&msg, input), MsgSig::EMPTY);
    }

    #[test]
    fn write_hex_matches_format_shape() {
        let mut msg = Message::default();
        msg.step(INVITE, 0, 0).unwrap();
        let sig = compute(&msg, INVITE);

        let mut buf = [0u8; MAX_SIG_CHARS];
        let n = sig.write_hex(&mut buf);
        let text = core::str::from_utf8(&buf[..n]).unwrap();

        assert!(text.len() <= MAX_SIG_CHARS);
        let i_pos = text.find('I').expect("Call-ID marker present");
        let f_pos = text.find('F').expect("From-tag marker present");
        assert!(f_pos > i_pos);
        assert_eq!(text.len() - f_pos, 5); // 'F' + 4 hex digits
        assert_eq!(f_pos - i_pos, 7); // 'I' + 4 hex + 2 hex
    }

    #[cfg(feature = "std")]
    #[test]
    fn to_string_agrees_with_write_hex() {
        let mut msg = Message::default();
        msg.step(INVITE, 0, 0).unwrap();
        let sig = compute(&msg, INVITE);

        let mut buf = [0u8; MAX_SIG_CHARS];
        let n = sig.write_hex(&mut buf);
        let expected = core::str::from_utf8(&buf[..n]).unwrap();
        assert_eq!(sig.to_string(), expected);
    }
}
