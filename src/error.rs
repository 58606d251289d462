//! The flat error taxonomy shared by every parser in this crate.
//!
//! Recoverable outcomes (`ok`, `eoh`, `empty`, `more-bytes`, `more-values`)
//! live on the `Ok` side of a `Result` as [`Outcome`]; everything else is
//! terminal and lives on the `Err` side as [`SipError`].

use core::fmt;

/// A recoverable parse checkpoint: the caller may simply continue.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// Fully parsed.
    Ok,
    /// End of header (its terminating CRLF was consumed).
    Eoh,
    /// Header section ended (the empty line was consumed).
    Empty,
    /// Truncated input; resume with the same state object.
    MoreBytes,
    /// One value of a multi-value header was parsed; more follow.
    MoreValues,
}

/// A terminal parse failure. No parser panics; every malformed input
/// surfaces here instead.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum SipError {
    /// CRLF expected, not found.
    NoCr,
    /// Disallowed byte in the current grammar position.
    BadChar,
    /// Parameter parse failure.
    Params,
    /// Structural header failure.
    Bad,
    /// Expected a numeric body, got a non-digit.
    ValNotNumber,
    /// Numeric body exceeds the configured max string length.
    ValTooLong,
    /// Value is semantically invalid (e.g. `q` > 1).
    ValBad,
    /// Numeric overflow, or value exceeds its domain cap.
    NumTooBig,
    /// Terminal truncation: no more data is coming.
    Trunc,
    /// Content-Length required but absent.
    NoClen,
    /// Internal invariant violated.
    Bug,
    /// Error-conversion bug (a sub-parser's error didn't map cleanly).
    ConvBug,
}

impl fmt::Display for SipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SipError::NoCr => "expected CRLF",
            SipError::BadChar => "disallowed byte",
            SipError::Params => "parameter parse failure",
            SipError::Bad => "structural header failure",
            SipError::ValNotNumber => "expected a number",
            SipError::ValTooLong => "numeric body too long",
            SipError::ValBad => "semantically invalid value",
            SipError::NumTooBig => "numeric overflow",
            SipError::Trunc => "truncated input, no more data coming",
            SipError::NoClen => "Content-Length required but absent",
            SipError::Bug => "internal invariant violated",
            SipError::ConvBug => "error-conversion bug",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SipError {}

/// URI-specific taxonomy; disjoint from [`SipError`] because URI grammar
/// positions don't line up with header-body grammar positions.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum UriError {
    /// Disallowed byte in the current grammar position.
    BadChar,
    /// Unrecognized or malformed scheme.
    Scheme,
    /// Malformed host.
    Host,
    /// Malformed or out-of-range port.
    Port,
    /// Malformed URI headers section.
    Headers,
    /// Input shorter than the minimum valid URI.
    TooShort,
    /// Structural URI failure.
    Bad,
    /// Internal invariant violated.
    Bug,
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UriError::BadChar => "disallowed byte in URI",
            UriError::Scheme => "unrecognized URI scheme",
            UriError::Host => "malformed host",
            UriError::Port => "malformed or out-of-range port",
            UriError::Headers => "malformed URI headers",
            UriError::TooShort => "input shorter than the minimum valid URI",
            UriError::Bad => "structural URI failure",
            UriError::Bug => "internal invariant violated",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UriError {}

/// What every parser in this crate returns: the offset reached plus
/// either a recoverable [`Outcome`] or a terminal [`SipError`].
pub type PResult = Result<(usize, Outcome), (usize, SipError)>;

/// Same shape, for the URI sub-grammar.
pub type UResult = Result<(usize, Outcome), (usize, UriError)>;
