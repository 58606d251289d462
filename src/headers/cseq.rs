//! CSeq body: `1*DIGIT LWS Method`.

use crate::catalog::{lookup_method, Method};
use crate::error::SipError;
use crate::field::Field;
use crate::lex::{scan_uint, skip_token, skip_ws};

/// A parsed CSeq value.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct CSeq {
    /// The sequence number.
    pub number: u32,
    /// The recognized method, or `Method::Other` for an extension method.
    pub method: Method,
    /// Raw method token, as written.
    pub method_raw: Field,
}

/// Parses `field` (the whole header value) as a CSeq body.
pub fn parse_cseq(buf: &[u8], field: Field) -> Result<CSeq, SipError> {
    let start = field.offs();
    let end = field.end();
    let (after_digits, accum) = scan_uint(buf, start);
    if accum.digits == 0 {
        return Err(SipError::ValNotNumber);
    }
    if accum.overflow {
        return Err(SipError::NumTooBig);
    }
    let method_start = skip_ws(buf, after_digits);
    if method_start == after_digits && after_digits < end {
        return Err(SipError::BadChar);
    }
    let method_end = skip_token(buf, method_start);
    if method_end == method_start || method_end != end {
        return Err(SipError::Bad);
    }
    let method_raw = Field::from_range(method_start, method_end);
    Ok(CSeq {
        number: accum.value,
        method: lookup_method(method_raw.get(buf)),
        method_raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_cseq() {
        let v = b"314159 INVITE";
        let cseq = parse_cseq(v, Field::from_range(0, v.len())).unwrap();
        assert_eq!(cseq.number, 314159);
        assert_eq!(cseq.method, Method::Invite);
        assert_eq!(cseq.method_raw.get(v), b"INVITE");
    }

    #[test]
    fn extension_method() {
        let v = b"1 SUBSCRIBE";
        let cseq = parse_cseq(v, Field::from_range(0, v.len())).unwrap();
        assert_eq!(cseq.method, Method::Subscribe);
    }

    #[test]
    fn missing_method_is_bad() {
        let v = b"1";
        assert_eq!(parse_cseq(v, Field::from_range(0, v.len())), Err(SipError::Bad));
    }
}
