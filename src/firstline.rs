//! Request-line / Status-line parsing (component I): discriminates a
//! request from a response, then extracts the method/Request-URI or the
//! status-code/reason-phrase.

use crate::bytecase::prefix_match;
use crate::catalog::{lookup_method, Method};
use crate::error::{Outcome, PResult, SipError};
use crate::field::Field;
use crate::lex::{scan_uint, skip_crlf, skip_token, CrlfStatus};
use crate::uri::{parse_uri, Uri};

const VERSION: &[u8] = b"SIP/2.0";

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
enum Phase {
    #[default]
    Discriminate,
    ReqUri,
    ReqVersion,
    ReqCrlf,
    RespStatus,
    RespReason,
    RespCrlf,
    Done,
}

/// Either a Request-Line or a Status-Line, resumable across `MoreBytes`.
#[derive(Copy, Clone, Debug, Default)]
pub struct FirstLine {
    /// `true` for a Request-Line, `false` for a Status-Line.
    pub is_request: bool,
    /// The recognized method, or `Method::Other` for an extension method.
    pub method: Method,
    /// Raw method token, as written.
    pub method_raw: Field,
    /// The Request-URI.
    pub uri: Uri,
    /// The `SIP-Version` token (`"SIP/2.0"`).
    pub version: Field,
    /// Parsed 3-digit status code.
    pub status_code: u16,
    /// Raw 3-digit status code token.
    pub status_raw: Field,
    /// Reason phrase, possibly empty.
    pub reason: Field,
    phase: Phase,
}

impl FirstLine {
    /// Resets this value to its default state, discarding any
    /// in-progress scan.
    pub fn reset(&mut self) {
        *self = FirstLine::default();
    }
}

/// Parses the first line starting at `i`. On `Outcome::Ok` the returned
/// offset points just past the line's terminating CRLF.
pub fn parse_first_line(buf: &[u8], i: usize, fl: &mut FirstLine) -> PResult {
    if fl.phase == Phase::Discriminate {
        let rest = &buf[i..];
        let (matched, is_version) = prefix_match(rest, VERSION);
        if is_version {
            // Must be followed by a space to really be the status line
            // (as opposed to an extension method literally spelled
            // "SIP/2.0something", which the token grammar forbids anyway
            // since '/' isn't a token character — so this is unambiguous).
            fl.is_request = false;
            fl.version = Field::from_range(i, i + matched);
            fl.phase = Phase::RespStatus;
        } else if matched < VERSION.len() && rest.len() < VERSION.len() {
            return Ok((i, Outcome::MoreBytes));
        } else {
            let end = skip_token(buf, i);
            if end >= buf.len() {
                return Ok((end, Outcome::MoreBytes));
            }
            if end == i {
                return Err((end, SipError::BadChar));
            }
            if buf[end] != b' ' {
                return Err((end, SipError::BadChar));
            }
            fl.is_request = true;
            fl.method_raw = Field::from_range(i, end);
            fl.method = lookup_method(fl.method_raw.get(buf));
            fl.phase = Phase::ReqUri;
            return parse_request_uri(buf, end + 1, fl);
        }
    }

    match fl.phase {
        Phase::ReqUri => parse_request_uri(buf, i, fl),
        Phase::ReqVersion => parse_request_version(buf, i, fl),
        Phase::ReqCrlf => finish_crlf(buf, i, fl),
        Phase::RespStatus => parse_status_code(buf, i, fl),
        Phase::RespReason => parse_reason(buf, i, fl),
        Phase::RespCrlf => finish_crlf(buf, i, fl),
        Phase::Done => Ok((i, Outcome::Ok)),
        Phase::Discriminate => unreachable!("handled above"),
    }
}

fn parse_request_uri(buf: &[u8], i: usize, fl: &mut FirstLine) -> PResult {
    match parse_uri(buf, i, &mut fl.uri) {
        Ok((end, Outcome::MoreBytes)) => Ok((end, Outcome::MoreBytes)),
        Ok((end, _)) => {
            fl.phase = Phase::ReqVersion;
            parse_request_version(buf, end, fl)
        }
        Err((pos, _)) => Err((pos, SipError::BadChar)),
    }
}

fn parse_request_version(buf: &[u8], i: usize, fl: &mut FirstLine) -> PResult {
    if i >= buf.len() {
        return Ok((i, Outcome::MoreBytes));
    }
    if buf[i] != b' ' {
        return Err((i, SipError::BadChar));
    }
    let vstart = i + 1;
    let rest = &buf[vstart..];
    let (matched, ok) = prefix_match(rest, VERSION);
    if !ok {
        if rest.len() < VERSION.len() {
            return Ok((vstart, Outcome::MoreBytes));
        }
        return Err((vstart, SipError::BadChar));
    }
    fl.version = Field::from_range(vstart, vstart + matched);
    fl.phase = Phase::ReqCrlf;
    finish_crlf(buf, vstart + matched, fl)
}

fn parse_status_code(buf: &[u8], i: usize, fl: &mut FirstLine) -> PResult {
    if i >= buf.len() {
        return Ok((i, Outcome::MoreBytes));
    }
    if buf[i] != b' ' {
        return Err((i, SipError::BadChar));
    }
    let start = i + 1;
    if buf.len() < start + 4 {
        // Need to see all 3 digits plus the following SP to be sure.
        return Ok((start, Outcome::MoreBytes));
    }
    for &d in &buf[start..start + 3] {
        if !d.is_ascii_digit() {
            return Err((start, SipError::ValNotNumber));
        }
    }
    if buf[start + 3] != b' ' {
        return Err((start + 3, SipError::BadChar));
    }
    let (_, accum) = scan_uint(buf, start);
    fl.status_raw = Field::from_range(start, start + 3);
    fl.status_code = accum.value as u16;
    fl.phase = Phase::RespReason;
    parse_reason(buf, start + 4, fl)
}

fn parse_reason(buf: &[u8], i: usize, fl: &mut FirstLine) -> PResult {
    let mut pos = i;
    loop {
        if pos >= buf.len() {
            return Ok((pos, Outcome::MoreBytes));
        }
        match buf[pos] {
            b'\r' | b'\n' => break,
            _ => pos += 1,
        }
    }
    fl.reason = Field::from_range(i, pos);
    fl.phase = Phase::RespCrlf;
    finish_crlf(buf, pos, fl)
}

fn finish_crlf(buf: &[u8], i: usize, fl: &mut FirstLine) -> PResult {
    let (end, _, status) = skip_crlf(buf, i);
    match status {
        CrlfStatus::Ok => {
            fl.phase = Phase::Done;
            Ok((end, Outcome::Ok))
        }
        CrlfStatus::MoreBytes => Ok((i, Outcome::MoreBytes)),
        CrlfStatus::NoCr => Err((i, SipError::NoCr)),
    }
}
