//! Generic bounded-unsigned-integer header bodies: Content-Length and
//! Expires share this, differing only in their string-length and
//! value ceilings.

use crate::error::SipError;
use crate::field::Field;
use crate::lex::scan_uint;

/// Bounds for a single numeric header body.
#[derive(Copy, Clone, Debug)]
pub struct UintBounds {
    /// Longest decimal string accepted, digit count.
    pub max_string_len: usize,
    /// Largest accepted value (inclusive).
    pub max_value: u32,
}

/// Content-Length is capped well below `u32::MAX` — no SIP deployment
/// sends bodies anywhere near 16MB, and the tight bound catches garbage
/// early.
pub const CONTENT_LENGTH_BOUNDS: UintBounds = UintBounds {
    max_string_len: 9,
    max_value: 1 << 24,
};

/// Expires is a plain 32-bit count of seconds; RFC 3261 places no
/// tighter domain cap on it.
pub const EXPIRES_BOUNDS: UintBounds = UintBounds {
    max_string_len: 10,
    max_value: u32::MAX,
};

/// Parses `field` (the header value, already LWS-trimmed by the caller)
/// as a bounded unsigned decimal integer.
pub fn parse_bounded_uint(buf: &[u8], field: Field, bounds: UintBounds) -> Result<u32, SipError> {
    if field.is_empty() {
        return Err(SipError::ValNotNumber);
    }
    let start = field.offs();
    let end = field.end();
    for &b in &buf[start..end] {
        if !b.is_ascii_digit() {
            return Err(SipError::ValNotNumber);
        }
    }
    if field.len() > bounds.max_string_len {
        return Err(SipError::NumTooBig);
    }
    let (pos, accum) = scan_uint(buf, start);
    debug_assert_eq!(pos, end);
    if accum.overflow || accum.value > bounds.max_value {
        return Err(SipError::NumTooBig);
    }
    Ok(accum.value)
}
