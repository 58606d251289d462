//! URI parameter/header sub-parsers (component F): a single
//! `;`/`&`-separated `name[=value]` tokenizer shared by URI params and
//! URI headers, known-parameter bit recognition, and the RFC 3261
//! §19.1.4 equality rules.

use crate::bytecase::eq;
use crate::field::Field;

/// Which section is being scanned — determines the separator and which
/// of `&`/`?` is allowed as a literal, unescaped byte in a value.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ParamCtx {
    /// `;`-separated URI parameters; `&` is allowed literally, `?` is not
    /// (it starts the headers section).
    UriParam,
    /// `&`-separated URI headers; `?` is allowed literally, `&` is not.
    UriHeader,
}

#[inline]
fn is_unreserved_extra(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
        || matches!(b, b'[' | b']' | b'/' | b':' | b'+' | b'$')
}

#[inline]
fn is_value_char(b: u8, ctx: ParamCtx) -> bool {
    if is_unreserved_extra(b) || b == b'%' {
        return true;
    }
    match ctx {
        ParamCtx::UriParam => b == b'&',
        ParamCtx::UriHeader => b == b'?',
    }
}

#[inline]
fn is_terminator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'>' | b',')
}

/// One `name[=value]` occurrence found by [`next_param`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ParamToken {
    /// Raw parameter name.
    pub name: Field,
    /// Raw parameter value; empty when `has_value` is false.
    pub value: Field,
    /// Whether an `=value` part was present at all (vs. a bare name).
    pub has_value: bool,
    /// Whether the value was a quoted-string (quotes included in `value`).
    pub quoted: bool,
}

/// Outcome of scanning a single parameter with [`next_param`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ParamScan {
    /// A parameter was parsed; `next` points at its separator-consuming
    /// follower (caller re-checks what byte is there).
    Found(ParamToken),
    /// The section ended (a true terminator, the `?`/end boundary, or
    /// end of input) without another parameter starting.
    End,
    /// Input ends mid-parameter; resume at the returned offset.
    MoreBytes,
    /// A disallowed byte (e.g. a bare CR/LF inside a quoted value).
    Bad,
}

/// Parses one `name[=value]` pair starting at `i`, which must already be
/// positioned at the first byte of the name (past any leading separator
/// and LWS). Returns `(next_offset, ParamScan)`.
pub fn next_param(buf: &[u8], i: usize, ctx: ParamCtx) -> (usize, ParamScan) {
    let start = i;
    let mut pos = i;
    while pos < buf.len() && is_value_char(buf[pos], ctx) {
        pos += 1;
    }
    if pos >= buf.len() {
        return (pos, ParamScan::MoreBytes);
    }
    if pos == start {
        return (pos, ParamScan::End);
    }
    let name = Field::from_range(start, pos);

    if pos < buf.len() && buf[pos] == b'=' {
        let val_start = pos + 1;
        if val_start < buf.len() && buf[val_start] == b'"' {
            match scan_quoted(buf, val_start) {
                Some(end) => {
                    let value = Field::from_range(val_start, end);
                    (
                        end,
                        ParamScan::Found(ParamToken {
                            name,
                            value,
                            has_value: true,
                            quoted: true,
                        }),
                    )
                }
                None => (buf.len(), ParamScan::MoreBytes),
            }
        } else {
            let mut vend = val_start;
            while vend < buf.len() && is_value_char(buf[vend], ctx) {
                vend += 1;
            }
            if vend >= buf.len() {
                return (vend, ParamScan::MoreBytes);
            }
            let value = Field::from_range(val_start, vend);
            (
                vend,
                ParamScan::Found(ParamToken {
                    name,
                    value,
                    has_value: true,
                    quoted: false,
                }),
            )
        }
    } else {
        (
            pos,
            ParamScan::Found(ParamToken {
                name,
                value: Field::EMPTY,
                has_value: false,
                quoted: false,
            }),
        )
    }
}

/// Scans a quoted string starting at the opening `"`. Returns the offset
/// just past the closing `"`, or `None` if the buffer ends first. CR and
/// LF are never permitted inside the quotes or an escape, per RFC 7230
/// §3.2.6; encountering either is treated the same as running out of
/// input here (the caller's higher-level grammar reports `bad-char`).
fn scan_quoted(buf: &[u8], open: usize) -> Option<usize> {
    let mut pos = open + 1;
    while pos < buf.len() {
        match buf[pos] {
            b'"' => return Some(pos + 1),
            b'\\' => {
                let esc = pos + 1;
                if esc >= buf.len() {
                    return None;
                }
                if matches!(buf[esc], b'\r' | b'\n') {
                    return None;
                }
                pos = esc + 1;
            }
            b'\r' | b'\n' => return None,
            _ => pos += 1,
        }
    }
    None
}

/// Scans a whole `;`-led parameter section (URI params) starting right
/// at the leading `;`. Stops just before a top-level `?` or a true
/// terminator, or at end of input. Returns `(end_offset, status)`.
pub fn scan_params_section(buf: &[u8], i: usize) -> (usize, crate::error::Outcome) {
    use crate::error::Outcome;
    let mut pos = i;
    loop {
        if pos >= buf.len() {
            return (pos, Outcome::MoreBytes);
        }
        if buf[pos] == b'?' || is_terminator(buf[pos]) {
            return (pos, Outcome::Ok);
        }
        if buf[pos] != b';' {
            return (pos, Outcome::Ok);
        }
        pos += 1;
        let (next, scan) = next_param(buf, pos, ParamCtx::UriParam);
        match scan {
            ParamScan::Found(_) => pos = next,
            ParamScan::End => return (pos, Outcome::Ok),
            ParamScan::MoreBytes => return (next, Outcome::MoreBytes),
            ParamScan::Bad => return (next, Outcome::Ok),
        }
    }
}

/// Scans a whole `&`-led headers section starting right after the
/// leading `?`. Stops at a true terminator or end of input.
pub fn scan_headers_section(buf: &[u8], i: usize) -> (usize, crate::error::Outcome) {
    use crate::error::Outcome;
    let (mut pos, scan) = next_param(buf, i, ParamCtx::UriHeader);
    match scan {
        ParamScan::MoreBytes => return (pos, Outcome::MoreBytes),
        ParamScan::End => return (i, Outcome::Ok),
        ParamScan::Found(_) | ParamScan::Bad => {}
    }
    loop {
        if pos >= buf.len() {
            return (pos, Outcome::MoreBytes);
        }
        if is_terminator(buf[pos]) {
            return (pos, Outcome::Ok);
        }
        if buf[pos] != b'&' {
            return (pos, Outcome::Ok);
        }
        pos += 1;
        let (next, scan) = next_param(buf, pos, ParamCtx::UriHeader);
        match scan {
            ParamScan::Found(_) => pos = next,
            ParamScan::End => return (pos, Outcome::Ok),
            ParamScan::MoreBytes => return (next, Outcome::MoreBytes),
            ParamScan::Bad => return (next, Outcome::Ok),
        }
    }
}

/// Bit flags for the known URI parameters (component F). `other` is set
/// whenever a recognized-or-not parameter is present that isn't one of
/// these six, and is tracked separately for completeness.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct KnownParams {
    /// `transport` parameter present.
    pub transport: bool,
    /// `user` parameter present.
    pub user: bool,
    /// `method` parameter present.
    pub method: bool,
    /// `ttl` parameter present.
    pub ttl: bool,
    /// `maddr` parameter present.
    pub maddr: bool,
    /// `lr` parameter present.
    pub lr: bool,
    /// Any other parameter present.
    pub other: bool,
}

fn mark_known(name: &[u8], known: &mut KnownParams) {
    if eq(name, b"transport") {
        known.transport = true;
    } else if eq(name, b"user") {
        known.user = true;
    } else if eq(name, b"method") {
        known.method = true;
    } else if eq(name, b"ttl") {
        known.ttl = true;
    } else if eq(name, b"maddr") {
        known.maddr = true;
    } else if eq(name, b"lr") {
        known.lr = true;
    } else {
        known.other = true;
    }
}

/// Walks every `;`-separated parameter in `field` (a URI's raw params
/// range, `;`-prefixed) and computes which known parameters are present.
pub fn parse_all_uri_params(buf: &[u8], field: Field) -> KnownParams {
    let mut known = KnownParams::default();
    if field.is_empty() {
        return known;
    }
    let slice_end = field.end();
    let mut pos = field.offs();
    if pos < slice_end && buf[pos] == b';' {
        pos += 1;
    }
    while pos < slice_end {
        let (next, scan) = next_param(buf, pos, ParamCtx::UriParam);
        match scan {
            ParamScan::Found(tok) => {
                mark_known(tok.name.get(buf), &mut known);
                pos = next;
                if pos < slice_end && buf[pos] == b';' {
                    pos += 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    known
}

/// Walks every `&`-separated header in `field` (a URI's raw headers
/// range) into `(name, value)` pairs, calling `visit` for each.
pub fn parse_all_uri_headers<'b>(buf: &'b [u8], field: Field, mut visit: impl FnMut(&'b [u8], &'b [u8])) {
    if field.is_empty() {
        return;
    }
    let slice_end = field.end();
    let mut pos = field.offs();
    loop {
        let (next, scan) = next_param(buf, pos, ParamCtx::UriHeader);
        match scan {
            ParamScan::Found(tok) => {
                visit(tok.name.get(buf), tok.value.get(buf));
                pos = next;
                if pos < slice_end && buf[pos] == b'&' {
                    pos += 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
}

/// RFC 3261 §19.1.4 parameter-list equality: `user`/`ttl`/`method`/`maddr`
/// must be present in both or neither; every other parameter present in
/// both sides must match case-insensitively (value comparison is
/// byte-wise case-insensitive, per this crate's non-goals — no
/// percent-decoding).
pub fn uri_params_eq(buf1: &[u8], p1: Field, buf2: &[u8], p2: Field) -> bool {
    let k1 = parse_all_uri_params(buf1, p1);
    let k2 = parse_all_uri_params(buf2, p2);
    if (k1.user, k1.ttl, k1.method, k1.maddr) != (k2.user, k2.ttl, k2.method, k2.maddr) {
        return false;
    }

    let mut pos1 = if p1.is_empty() { p1.end() } else { p1.offs() + 1 };
    while pos1 < p1.end() {
        let (next1, scan1) = next_param(buf1, pos1, ParamCtx::UriParam);
        let tok1 = match scan1 {
            ParamScan::Found(t) => t,
            _ => break,
        };
        let name1 = tok1.name.get(buf1);
        if let Some(value2) = find_param_value(buf2, p2, name1) {
            let value1 = if tok1.has_value { tok1.value.get(buf1) } else { &[][..] };
            if !eq(value1, value2) {
                return false;
            }
        }
        pos1 = next1;
        if pos1 < p1.end() && buf1[pos1] == b';' {
            pos1 += 1;
        } else {
            break;
        }
    }
    true
}

fn find_param_value<'b>(buf: &'b [u8], field: Field, name: &[u8]) -> Option<&'b [u8]> {
    if field.is_empty() {
        return None;
    }
    let mut pos = field.offs() + 1;
    while pos < field.end() {
        let (next, scan) = next_param(buf, pos, ParamCtx::UriParam);
        match scan {
            ParamScan::Found(tok) => {
                if eq(tok.name.get(buf), name) {
                    return Some(if tok.has_value { tok.value.get(buf) } else { &[][..] });
                }
                pos = next;
                if pos < field.end() && buf[pos] == b';' {
                    pos += 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    None
}

/// URI-header equality: every header present in either URI must be
/// present in the other with a matching (case-insensitive) value.
pub fn uri_headers_eq(buf1: &[u8], h1: Field, buf2: &[u8], h2: Field) -> bool {
    let mut ok = true;
    let mut count1 = 0usize;
    let mut count2 = 0usize;
    parse_all_uri_headers(buf1, h1, |name, _| count1 += 1);
    parse_all_uri_headers(buf2, h2, |name, _| count2 += 1);
    if count1 != count2 {
        return false;
    }
    parse_all_uri_headers(buf1, h1, |name, value| {
        if !ok {
            return;
        }
        match find_header_value(buf2, h2, name) {
            Some(v2) if eq(value, v2) => {}
            _ => ok = false,
        }
    });
    ok
}

fn find_header_value<'b>(buf: &'b [u8], field: Field, name: &[u8]) -> Option<&'b [u8]> {
    let mut found = None;
    parse_all_uri_headers(buf, field, |n, v| {
        if found.is_none() && eq(n, name) {
            found = Some(v);
        }
    });
    found
}
