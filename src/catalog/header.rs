//! Header-name catalog (component H): same two-dimensional perfect hash
//! as the method catalog, extended to also recognize compact forms
//! (`f`, `t`, `i`, `l`, `m`) as aliases of their long-form counterpart.
//! "Compact" is recovered purely from name length (1 byte) by the caller.

use crate::bytecase::{eq, to_lower};

/// A recognized header kind, or `Other`/`None` for the unrecognized and
/// not-yet-classified cases respectively.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum HdrKind {
    /// Not yet classified (the default state of a fresh header record).
    #[default]
    None,
    /// `Via`
    Via,
    /// `From`
    From,
    /// `To`
    To,
    /// `Call-ID`
    CallId,
    /// `CSeq`
    CSeq,
    /// `Max-Forwards`
    MaxForwards,
    /// `Contact`
    Contact,
    /// `Content-Length`
    ContentLength,
    /// `Expires`
    Expires,
    /// `P-Asserted-Identity`
    PAssertedIdentity,
    /// `Route`
    Route,
    /// `Record-Route`
    RecordRoute,
    /// `User-Agent`
    UserAgent,
    /// Recognized as a header but not one this crate parses the body of.
    Other,
}

const FC_BITS: u32 = 6;
const LEN_BITS: u32 = 4;

#[inline]
const fn hash_key(first_lower: u8, len: usize) -> usize {
    let fc = (first_lower as usize) & ((1 << FC_BITS) - 1);
    let ln = len & ((1 << LEN_BITS) - 1);
    fc | (ln << FC_BITS)
}

fn key_for(name: &[u8]) -> Option<usize> {
    let first = *name.first()?;
    Some(hash_key(to_lower(first), name.len()))
}

const ENTRIES: &[(&[u8], HdrKind)] = &[
    (b"Via", HdrKind::Via),
    (b"From", HdrKind::From),
    (b"f", HdrKind::From),
    (b"To", HdrKind::To),
    (b"t", HdrKind::To),
    (b"Call-ID", HdrKind::CallId),
    (b"i", HdrKind::CallId),
    (b"CSeq", HdrKind::CSeq),
    (b"Max-Forwards", HdrKind::MaxForwards),
    (b"Contact", HdrKind::Contact),
    (b"m", HdrKind::Contact),
    (b"Content-Length", HdrKind::ContentLength),
    (b"l", HdrKind::ContentLength),
    (b"Expires", HdrKind::Expires),
    (b"P-Asserted-Identity", HdrKind::PAssertedIdentity),
    (b"Route", HdrKind::Route),
    (b"Record-Route", HdrKind::RecordRoute),
    (b"User-Agent", HdrKind::UserAgent),
];

/// Looks up a raw header name. Returns `HdrKind::Other` for any
/// syntactically valid but unrecognized header name (the caller keeps
/// its raw name/value range regardless).
pub fn lookup_header(name: &[u8]) -> HdrKind {
    let key = match key_for(name) {
        Some(k) => k,
        None => return HdrKind::Other,
    };
    for &(candidate, kind) in ENTRIES {
        if key_for(candidate) == Some(key) && eq(candidate, name) {
            return kind;
        }
    }
    HdrKind::Other
}

/// True when `name`'s length marks it as a compact header form (one
/// byte). Recognition of *which* header it aliases still goes through
/// [`lookup_header`]; this only answers "is this the compact spelling".
#[inline]
pub fn is_compact_form(name: &[u8]) -> bool {
    name.len() == 1
}
