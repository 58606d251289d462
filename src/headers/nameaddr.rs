//! The unified name-addr body shared by From, To, Contact,
//! P-Asserted-Identity, Route and Record-Route: `[display-name] "<" addr-spec ">"
//! *(";" generic-param)` or the bare `addr-spec *(";" generic-param)` form,
//! plus the Contact-only `"*"` wildcard and comma-separated multi-value
//! continuation.

use crate::bytecase::eq;
use crate::error::{Outcome, PResult, SipError};
use crate::field::Field;
use crate::lex::{skip_lws, skip_token, LwsStatus};
use crate::uri::params::{next_param, scan_params_section, ParamCtx, ParamScan};
use crate::uri::{parse_uri, Uri};

/// One parsed name-addr value.
#[derive(Copy, Clone, Debug, Default)]
pub struct NameAddr {
    /// `*` wildcard (Contact only); when set, no other field is valid.
    pub star: bool,
    /// Raw display-name span, quotes included if quoted-string form was
    /// used. Empty when no display name was present.
    pub display_name: Field,
    /// The parsed URI (`addr-spec`), angle-bracketed or bare.
    pub uri: Uri,
    /// Raw `;`-prefixed generic-param list (including the leading `;`).
    pub params: Field,
    /// `tag` parameter value, empty when absent.
    pub tag: Field,
    /// Whether a `q` parameter was present.
    pub has_q: bool,
    /// Fixed-point `q` value, thousandths (`q=0.8` -> `800`); valid only
    /// when `has_q`.
    pub q_millis: u16,
    /// Whether an `expires` parameter was present.
    pub has_expires: bool,
    /// `expires` parameter value, seconds; valid only when `has_expires`.
    pub expires: u32,
    /// Whether the `lr` parameter was present.
    pub lr: bool,
}

impl NameAddr {
    /// Resets this value to its default state, discarding any
    /// in-progress scan.
    pub fn reset(&mut self) {
        *self = NameAddr::default();
    }
}

#[inline]
fn is_terminator(b: u8) -> bool {
    matches!(b, b',' | b'\r' | b'\n')
}

/// Parses one name-addr value starting at `i`. On success the returned
/// offset points just past this value's own content (before any
/// separating comma/CRLF), and the outcome distinguishes whether a `,`
/// follows (`MoreValues`, caller re-invokes at the offset past the
/// comma and any LWS) from the value being the last (`Ok`).
pub fn parse_name_addr(buf: &[u8], i: usize, na: &mut NameAddr) -> PResult {
    let (mut pos, _, lws_status) = skip_lws(buf, i);
    if lws_status == LwsStatus::MoreBytes {
        return Ok((i, Outcome::MoreBytes));
    }

    if pos < buf.len() && buf[pos] == b'*' {
        let after = pos + 1;
        if after >= buf.len() || is_terminator(buf[after]) || buf[after] == b' ' {
            na.star = true;
            return finish_and_check_comma(buf, after);
        }
    }

    if pos < buf.len() && buf[pos] == b'"' {
        match scan_quoted(buf, pos) {
            Some(end) => {
                na.display_name = Field::from_range(pos, end);
                pos = end;
            }
            None => return Ok((pos, Outcome::MoreBytes)),
        }
        pos = skip_lws_plain(buf, pos)?;
        if pos >= buf.len() || buf[pos] != b'<' {
            return Err((pos, SipError::Bad));
        }
    } else {
        let word_start = pos;
        let mut scan = pos;
        let mut last_token_end = pos;
        loop {
            let tok_end = skip_token(buf, scan);
            if tok_end == scan {
                break;
            }
            last_token_end = tok_end;
            let (after_ws, _, status) = skip_lws(buf, tok_end);
            if status == LwsStatus::MoreBytes {
                return Ok((tok_end, Outcome::MoreBytes));
            }
            scan = after_ws;
            if scan >= buf.len() || buf[scan] != b'<' {
                // Not followed by another token-then-maybe-'<': if we
                // never hit '<', this was actually the bare addr-spec,
                // not a display name.
                break;
            }
        }
        if scan < buf.len() && buf[scan] == b'<' {
            na.display_name = Field::from_range(word_start, last_token_end);
            pos = scan;
        } else {
            pos = word_start;
        }
    }

    if pos < buf.len() && buf[pos] == b'<' {
        let uri_start = pos + 1;
        match parse_uri(buf, uri_start, &mut na.uri) {
            Ok((end, Outcome::MoreBytes)) => return Ok((end, Outcome::MoreBytes)),
            Ok((end, _)) => {
                if end >= buf.len() {
                    return Ok((end, Outcome::MoreBytes));
                }
                if buf[end] != b'>' {
                    return Err((end, SipError::Bad));
                }
                pos = end + 1;
            }
            Err((epos, _)) => return Err((epos, SipError::Bad)),
        }
        pos = parse_generic_params(buf, pos, na)?;
    } else {
        // Bare addr-spec: no display name, no angle brackets. The URI
        // parser consumes its own trailing params/headers; we alias
        // them as this value's param list too since the wire grammar
        // doesn't let us tell the two apart without angle brackets.
        match parse_uri(buf, pos, &mut na.uri) {
            Ok((end, Outcome::MoreBytes)) => return Ok((end, Outcome::MoreBytes)),
            Ok((end, _)) => pos = end,
            Err((epos, _)) => return Err((epos, SipError::Bad)),
        }
        na.params = na.uri.params;
        scan_known_params(buf, na);
    }

    finish_and_check_comma(buf, pos)
}

fn skip_lws_plain(buf: &[u8], i: usize) -> Result<usize, (usize, SipError)> {
    let (pos, _, status) = skip_lws(buf, i);
    match status {
        LwsStatus::MoreBytes => Err((i, SipError::Bad)),
        _ => Ok(pos),
    }
}

fn parse_generic_params(buf: &[u8], from: usize, na: &mut NameAddr) -> Result<usize, (usize, SipError)> {
    let (end, outcome) = scan_params_section(buf, from);
    if outcome == Outcome::MoreBytes {
        return Err((end, SipError::Bad));
    }
    na.params = Field::from_range(from, end);
    scan_known_params(buf, na);
    Ok(end)
}

fn scan_known_params(buf: &[u8], na: &mut NameAddr) {
    if na.params.is_empty() {
        return;
    }
    let field_end = na.params.end();
    let mut pos = na.params.offs();
    if pos < field_end && buf[pos] == b';' {
        pos += 1;
    }
    while pos < field_end {
        let (next, scan) = next_param(buf, pos, ParamCtx::UriParam);
        let tok = match scan {
            ParamScan::Found(t) => t,
            _ => break,
        };
        let name = tok.name.get(buf);
        if eq(name, b"tag") && tok.has_value {
            na.tag = tok.value;
        } else if eq(name, b"lr") {
            na.lr = true;
        } else if eq(name, b"q") && tok.has_value {
            if let Some(millis) = parse_q_value(tok.value.get(buf)) {
                na.has_q = true;
                na.q_millis = millis;
            }
        } else if eq(name, b"expires") && tok.has_value {
            if let Ok(v) = parse_plain_uint(tok.value.get(buf)) {
                na.has_expires = true;
                na.expires = v;
            }
        }
        pos = next;
        if pos < field_end && buf[pos] == b';' {
            pos += 1;
        } else {
            break;
        }
    }
}

/// `qvalue = ( "0" [ "." 0*4DIGIT ] ) / ( "1" [ "." 0*4("0") ] )`, folded
/// to thousandths. A 4th fractional digit is accepted (so it doesn't
/// fail the whole header) but carries no extra precision in `q_millis`
/// beyond the first 3 digits — it is parsed and discarded. Returns
/// `None` (not `ValBad`) on malformed input — the caller treats an
/// unparsed `q` as absent rather than failing the whole header.
fn parse_q_value(v: &[u8]) -> Option<u16> {
    if v.is_empty() || v.len() > 6 {
        return None;
    }
    let mut parts = v.splitn(2, |&b| b == b'.');
    let whole = parts.next()?;
    let frac = parts.next();
    if whole != b"0" && whole != b"1" {
        return None;
    }
    let whole_val: u16 = if whole == b"1" { 1000 } else { 0 };
    let frac_val: u16 = match frac {
        None => 0,
        Some(digits) if digits.len() <= 4 && digits.iter().all(u8::is_ascii_digit) => {
            let mut val = 0u16;
            let mut scale = 100u16;
            for &d in digits.iter().take(3) {
                val += (d - b'0') as u16 * scale;
                scale /= 10;
            }
            val
        }
        Some(_) => return None,
    };
    let total = whole_val + frac_val;
    if total > 1000 {
        None
    } else {
        Some(total)
    }
}

fn parse_plain_uint(v: &[u8]) -> Result<u32, ()> {
    if v.is_empty() || v.len() > 10 {
        return Err(());
    }
    let mut val: u32 = 0;
    for &b in v {
        if !b.is_ascii_digit() {
            return Err(());
        }
        val = val.checked_mul(10).ok_or(())?.checked_add((b - b'0') as u32).ok_or(())?;
    }
    Ok(val)
}

fn finish_and_check_comma(buf: &[u8], from: usize) -> PResult {
    let (pos, _, status) = skip_lws(buf, from);
    match status {
        LwsStatus::MoreBytes => Ok((from, Outcome::MoreBytes)),
        _ => {
            if pos < buf.len() && buf[pos] == b',' {
                Ok((pos + 1, Outcome::MoreValues))
            } else {
                Ok((pos, Outcome::Ok))
            }
        }
    }
}

fn scan_quoted(buf: &[u8], open: usize) -> Option<usize> {
    let mut pos = open + 1;
    while pos < buf.len() {
        match buf[pos] {
            b'"' => return Some(pos + 1),
            b'\\' => {
                let esc = pos + 1;
                if esc >= buf.len() || matches!(buf[esc], b'\r' | b'\n') {
                    return None;
                }
                pos = esc + 1;
            }
            _ => pos += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_bracket_with_tag() {
        let v = br#"Bob <sip:bob@biloxi.com>;tag=a6c85cf"#;
        let mut na = NameAddr::default();
        let (end, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, v.len());
        assert_eq!(na.display_name.get(v), b"Bob");
        assert_eq!(na.uri.host.get(v), b"biloxi.com");
        assert_eq!(na.tag.get(v), b"a6c85cf");
    }

    #[test]
    fn quoted_display_name() {
        let v = br#""Bob Smith" <sip:bob@biloxi.com>"#;
        let mut na = NameAddr::default();
        let (_, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(na.display_name.get(v), br#""Bob Smith""#);
    }

    #[test]
    fn bare_addr_spec() {
        let v = b"sip:bob@biloxi.com";
        let mut na = NameAddr::default();
        let (end, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, v.len());
        assert!(na.display_name.is_empty());
        assert_eq!(na.uri.host.get(v), b"biloxi.com");
    }

    #[test]
    fn contact_star_wildcard() {
        let v = b"*";
        let mut na = NameAddr::default();
        let (end, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(end, v.len());
        assert!(na.star);
    }

    #[test]
    fn multi_value_comma_continuation() {
        let v = b"<sip:alice@a.com>;q=0.8, <sip:bob@b.com>;q=0.5";
        let mut na = NameAddr::default();
        let (next, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::MoreValues);
        assert!(na.has_q);
        assert_eq!(na.q_millis, 800);

        let mut na2 = NameAddr::default();
        let (end, outcome2) = parse_name_addr(v, next, &mut na2).unwrap();
        assert_eq!(outcome2, Outcome::Ok);
        assert_eq!(end, v.len());
        assert_eq!(na2.uri.host.get(v), b"b.com");
        assert_eq!(na2.q_millis, 500);
    }

    #[test]
    fn four_fractional_digits_are_accepted() {
        let v = br#"<sip:alice@a.com>;q=0.1234"#;
        let mut na = NameAddr::default();
        let (_, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert!(na.has_q);
        assert_eq!(na.q_millis, 123);
    }

    #[test]
    fn five_fractional_digits_are_rejected() {
        let v = br#"<sip:alice@a.com>;q=0.12345"#;
        let mut na = NameAddr::default();
        let (_, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert!(!na.has_q, "malformed q is dropped, not fatal");
    }

    #[test]
    fn lr_and_route_uri() {
        let v = b"<sip:proxy.example.com;lr>";
        let mut na = NameAddr::default();
        let (_, outcome) = parse_name_addr(v, 0, &mut na).unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert!(na.uri.params.get(v) == b";lr");
    }
}
