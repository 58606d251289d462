//! SIP/SIPS/TEL URI parsing (component E) and the parameter/header
//! sub-grammars that hang off it (component F, in [`params`]).

pub mod params;

use crate::bytecase::eq;
use crate::error::{Outcome, UResult, UriError};
use crate::field::Field;
use crate::ip::{ip6_prefix, Ip6Status};
use crate::uri::params::{uri_headers_eq, uri_params_eq};

/// Which scheme a [`Uri`] was recognized as.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum UriScheme {
    /// Not yet determined / unrecognized scheme.
    #[default]
    Invalid,
    /// `sip:`
    Sip,
    /// `sips:`
    Sips,
    /// `tel:`
    Tel,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
enum Phase {
    #[default]
    Scheme,
    /// Scanning the ambiguous user-or-host span; no `@` seen yet.
    Ambiguous,
    /// Saw a `;`/`?` before any `@`; watching for a late `@` inside what
    /// we tentatively called params/headers.
    WatchLateAt,
    Host,
    Port,
    Params,
    Headers,
    Done,
}

#[derive(Copy, Clone, Debug, Default)]
struct Scan {
    phase: Phase,
    /// Offset right after the scheme, where user-or-host scanning began.
    start: usize,
    /// First unescaped `:` seen during the `Ambiguous` phase — the
    /// candidate user/password divider.
    colon_candidate: Option<usize>,
    /// Offset of the `;` or `?` that ended the `Ambiguous` phase without
    /// an `@` — the tentative host end.
    tentative_end: Option<usize>,
}

/// A parsed SIP/SIPS/TEL URI. Every field is a zero-copy byte range into
/// the buffer that was parsed; resolve them with [`Field::get`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Uri {
    /// Which scheme was recognized.
    pub scheme_kind: UriScheme,
    /// Raw scheme token, including the trailing `:`.
    pub scheme: Field,
    /// Userinfo's `user` part, empty when no userinfo was present.
    pub user: Field,
    /// Userinfo's `password` part, empty when absent or not given.
    pub pass: Field,
    /// Host: a hostname, dotted-quad, or bracketed IPv6 literal.
    pub host: Field,
    /// Port digits, not including the `:`; empty when absent.
    pub port: Field,
    /// Parsed port number; valid only when `port` is non-empty.
    pub port_number: u16,
    /// Raw `;`-prefixed parameter section, including the leading `;`.
    pub params: Field,
    /// Raw `?`-prefixed header section, including the leading `?`.
    pub headers: Field,
    scan: Scan,
}

impl Uri {
    /// A freshly reset URI, ready to parse from scratch.
    pub const EMPTY: Uri = Uri {
        scheme_kind: UriScheme::Invalid,
        scheme: Field::EMPTY,
        user: Field::EMPTY,
        pass: Field::EMPTY,
        host: Field::EMPTY,
        port: Field::EMPTY,
        port_number: 0,
        params: Field::EMPTY,
        headers: Field::EMPTY,
        scan: Scan {
            phase: Phase::Scheme,
            start: 0,
            colon_candidate: None,
            tentative_end: None,
        },
    };

    /// Resets this URI to [`Uri::EMPTY`], discarding any in-progress scan.
    pub fn reset(&mut self) {
        *self = Uri::EMPTY;
    }
}

#[inline]
fn is_terminator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'>' | b',')
}

#[inline]
fn is_ambiguous_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' | b'&' | b'=' | b'+' | b'$' | b','
        )
        || b == b'%'
}

#[inline]
fn is_host_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.')
}

const MIN_URI_LEN: usize = 5;

/// Parses a URI starting at `i`. `uri` is both the output and (across
/// `MoreBytes` returns) the resumable parse state — call again with the
/// same `uri` and a buffer that only grows at the tail.
pub fn parse_uri(buf: &[u8], i: usize, uri: &mut Uri) -> UResult {
    if uri.scan.phase == Phase::Scheme {
        match scheme_prefix(buf, i) {
            SchemeMatch::Ok(kind, end) => {
                uri.scheme_kind = kind;
                uri.scheme = Field::from_range(i, end);
                uri.scan.start = end;
                uri.scan.phase = if kind == UriScheme::Tel {
                    Phase::Host // tel: has no userinfo/host split; reuse Host scan for the subscriber number
                } else {
                    Phase::Ambiguous
                };
            }
            SchemeMatch::MoreBytes => return Ok((i, Outcome::MoreBytes)),
            SchemeMatch::Bad => return Err((i, UriError::Scheme)),
        }
    }

    if uri.scan.phase == Phase::Ambiguous {
        let mut pos = uri.scan.start;
        loop {
            if pos >= buf.len() {
                uri.scan.phase = Phase::Ambiguous;
                return Ok((pos, Outcome::MoreBytes));
            }
            let b = buf[pos];
            if b == b'@' {
                finish_userinfo(uri, buf, pos);
                uri.scan.start = pos + 1;
                uri.scan.phase = Phase::Host;
                break;
            }
            if b == b':' && uri.scan.colon_candidate.is_none() {
                uri.scan.colon_candidate = Some(pos);
                pos += 1;
                continue;
            }
            if b == b';' || b == b'?' {
                uri.scan.tentative_end = Some(pos);
                uri.scan.phase = Phase::WatchLateAt;
                break;
            }
            if is_terminator(b) {
                // No '@' ever appeared: the whole ambiguous span is host.
                uri.host = Field::from_range(uri.scan.start, pos);
                uri.scan.phase = Phase::Done;
                return Ok((pos, Outcome::Ok));
            }
            if !is_ambiguous_char(b) {
                return Err((pos, UriError::BadChar));
            }
            pos += 1;
        }
    }

    if uri.scan.phase == Phase::WatchLateAt {
        let tentative_end = uri.scan.tentative_end.expect("set when entering WatchLateAt");
        let mut pos = tentative_end;
        loop {
            if pos >= buf.len() {
                return Ok((pos, Outcome::MoreBytes));
            }
            let b = buf[pos];
            if b == b'@' {
                // Late flip: everything from the URI's user-or-host start
                // up to here was actually userinfo all along.
                finish_userinfo(uri, buf, pos);
                uri.scan.start = pos + 1;
                uri.scan.phase = Phase::Host;
                break;
            }
            if is_terminator(b) {
                uri.host = Field::from_range(uri.scan.start, tentative_end);
                return finish_params_headers(buf, tentative_end, uri);
            }
            pos += 1;
        }
    }

    if uri.scan.phase == Phase::Host {
        if uri.scheme_kind == UriScheme::Tel {
            return parse_tel_subscriber(buf, uri);
        }
        return parse_host_and_rest(buf, uri);
    }

    if uri.scan.phase == Phase::Params || uri.scan.phase == Phase::Headers {
        return finish_params_headers(buf, uri.scan.start, uri);
    }

    Ok((buf.len(), Outcome::Ok))
}

fn finish_userinfo(uri: &mut Uri, _buf: &[u8], at: usize) {
    match uri.scan.colon_candidate {
        Some(c) if c < at => {
            uri.user = Field::from_range(uri.scan.start, c);
            uri.pass = Field::from_range(c + 1, at);
        }
        _ => {
            uri.user = Field::from_range(uri.scan.start, at);
            uri.pass = Field::EMPTY;
        }
    }
}

enum SchemeMatch {
    Ok(UriScheme, usize),
    MoreBytes,
    Bad,
}

fn scheme_prefix(buf: &[u8], i: usize) -> SchemeMatch {
    use crate::bytecase::prefix_match;
    let rest = &buf[i..];
    if prefix_match(rest, b"sips:").1 {
        return SchemeMatch::Ok(UriScheme::Sips, i + 5);
    }
    if prefix_match(rest, b"sip:").1 {
        return SchemeMatch::Ok(UriScheme::Sip, i + 4);
    }
    if prefix_match(rest, b"tel:").1 {
        return SchemeMatch::Ok(UriScheme::Tel, i + 4);
    }
    // Only report MoreBytes if a strictly longer buffer could still turn
    // into a match; otherwise it's a genuine scheme mismatch.
    if rest.len() < 5 && prefix_could_extend(buf, i) {
        return SchemeMatch::MoreBytes;
    }
    SchemeMatch::Bad
}

fn prefix_could_extend(buf: &[u8], i: usize) -> bool {
    for candidate in [&b"sip:"[..], b"sips:", b"tel:"] {
        let avail = &buf[i..];
        let n = avail.len().min(candidate.len());
        if avail[..n].eq_ignore_ascii_case(&candidate[..n]) {
            return true;
        }
    }
    false
}

fn parse_host_and_rest(buf: &[u8], uri: &mut Uri) -> UResult {
    let host_start = uri.scan.start;
    let mut pos = host_start;

    if pos < buf.len() && buf[pos] == b'[' {
        match ip6_prefix(buf, pos) {
            (end, _, Ip6Status::Ok) => {
                uri.host = Field::from_range(host_start, end);
                pos = end;
            }
            (end, _, Ip6Status::MoreBytes) => return Ok((end, Outcome::MoreBytes)),
            (end, _, Ip6Status::Bad) => return Err((end, UriError::Host)),
        }
    } else {
        while pos < buf.len() && is_host_char(buf[pos]) {
            pos += 1;
        }
        if pos >= buf.len() {
            return Ok((pos, Outcome::MoreBytes));
        }
        if pos == host_start {
            return Err((pos, UriError::Host));
        }
        uri.host = Field::from_range(host_start, pos);
    }

    if pos < buf.len() && buf[pos] == b':' {
        let port_start = pos + 1;
        let mut p = port_start;
        while p < buf.len() && buf[p].is_ascii_digit() {
            p += 1;
        }
        if p >= buf.len() {
            return Ok((p, Outcome::MoreBytes));
        }
        if p == port_start {
            return Err((p, UriError::Port));
        }
        let digits = Field::from_range(port_start, p).get(buf);
        let mut val: u32 = 0;
        for &d in digits {
            val = val * 10 + (d - b'0') as u32;
            if val > 65535 {
                return Err((p, UriError::Port));
            }
        }
        uri.port = Field::from_range(port_start, p);
        uri.port_number = val as u16;
        pos = p;
    }

    finish_params_headers(buf, pos, uri)
}

fn parse_tel_subscriber(buf: &[u8], uri: &mut Uri) -> UResult {
    let start = uri.scan.start;
    let mut pos = start;
    while pos < buf.len() {
        let b = buf[pos];
        if b == b';' || is_terminator(b) {
            break;
        }
        if !(b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'(' | b')')) {
            return Err((pos, UriError::BadChar));
        }
        pos += 1;
    }
    if pos >= buf.len() {
        return Ok((pos, Outcome::MoreBytes));
    }
    if pos == start {
        return Err((pos, UriError::Host));
    }
    uri.user = Field::from_range(start, pos);
    finish_params_headers(buf, pos, uri)
}

fn finish_params_headers(buf: &[u8], from: usize, uri: &mut Uri) -> UResult {
    let mut pos = from;
    if pos < buf.len() && buf[pos] == b';' {
        uri.scan.phase = Phase::Params;
        let (end, outcome) = params::scan_params_section(buf, pos);
        if outcome == Outcome::MoreBytes {
            return Ok((end, Outcome::MoreBytes));
        }
        uri.params = Field::from_range(pos, end);
        pos = end;
    }
    if pos < buf.len() && buf[pos] == b'?' {
        uri.scan.phase = Phase::Headers;
        let (end, outcome) = params::scan_headers_section(buf, pos + 1);
        if outcome == Outcome::MoreBytes {
            return Ok((end, Outcome::MoreBytes));
        }
        uri.headers = Field::from_range(pos, end);
        pos = end;
    }

    let total_len = pos - total_start(uri);
    if total_len < MIN_URI_LEN {
        return Err((pos, UriError::TooShort));
    }

    uri.scan.phase = Phase::Done;
    Ok((pos, Outcome::Ok))
}

fn total_start(uri: &Uri) -> usize {
    uri.scheme.offs()
}

/// Bit flags selecting which [`Uri`] components [`uri_raw_cmp`] skips.
pub type UriCmpFlags = u8;

/// Skip comparing `user`/`pass`.
pub const SKIP_USER: UriCmpFlags = 1 << 0;
/// Skip comparing `port`/`port_number`.
pub const SKIP_PORT: UriCmpFlags = 1 << 1;
/// Skip comparing the parameter section.
pub const SKIP_PARAMS: UriCmpFlags = 1 << 2;
/// Skip comparing the header section.
pub const SKIP_HEADERS: UriCmpFlags = 1 << 3;

/// Compares `u1` (resolved against `buf1`) with `u2` (resolved against
/// `buf2`) component by component, skipping whichever components
/// `flags` names. Scheme and host are always compared (scheme exactly,
/// host case-insensitively per RFC 3261 host equivalence); user,
/// password, port, parameters and headers are each skippable.
///
/// Returns `(matches, mismatch, failing_uri_index)`: `mismatch` is
/// `None` when `matches` is `true`, otherwise the [`UriError`] variant
/// naming which component differed first (`Scheme`, `Host`, `Port`,
/// `Headers`, or `Bad` for a user/password/parameter mismatch, since
/// those have no dedicated variant of their own). `failing_uri_index`
/// is `0` on a match, `2` on a mismatch — `u2` is treated as the side
/// being checked against the reference `u1`.
pub fn uri_raw_cmp(buf1: &[u8], u1: &Uri, buf2: &[u8], u2: &Uri, flags: UriCmpFlags) -> (bool, Option<UriError>, usize) {
    if u1.scheme_kind != u2.scheme_kind {
        return (false, Some(UriError::Scheme), 2);
    }
    if flags & SKIP_USER == 0 && (u1.user.get(buf1) != u2.user.get(buf2) || u1.pass.get(buf1) != u2.pass.get(buf2)) {
        return (false, Some(UriError::Bad), 2);
    }
    if !eq(u1.host.get(buf1), u2.host.get(buf2)) {
        return (false, Some(UriError::Host), 2);
    }
    if flags & SKIP_PORT == 0 {
        let ports_match = match (u1.port.is_empty(), u2.port.is_empty()) {
            (true, true) => true,
            (false, false) => u1.port_number == u2.port_number,
            _ => false,
        };
        if !ports_match {
            return (false, Some(UriError::Port), 2);
        }
    }
    if flags & SKIP_PARAMS == 0 && !uri_params_eq(buf1, u1.params, buf2, u2.params) {
        return (false, Some(UriError::Bad), 2);
    }
    if flags & SKIP_HEADERS == 0 && !uri_headers_eq(buf1, u1.headers, buf2, u2.headers) {
        return (false, Some(UriError::Headers), 2);
    }
    (true, None, 0)
}
