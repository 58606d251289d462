//! SIP method catalog (component G): a perfect-hash lookup from the
//! method token to a small enum, falling back to `Method::Other` for
//! extension methods.

use crate::bytecase::{eq, to_lower};

/// A recognized SIP method, or `Other` for any extension method.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Method {
    /// `INVITE`
    Invite,
    /// `ACK`
    Ack,
    /// `OPTIONS`
    Options,
    /// `BYE`
    Bye,
    /// `CANCEL`
    Cancel,
    /// `REGISTER`
    Register,
    /// `PRACK`
    Prack,
    /// `SUBSCRIBE`
    Subscribe,
    /// `NOTIFY`
    Notify,
    /// `PUBLISH`
    Publish,
    /// `INFO`
    Info,
    /// `REFER`
    Refer,
    /// `MESSAGE`
    Message,
    /// `UPDATE`
    Update,
    /// Any method token not in the table above.
    #[default]
    Other,
}

const FC_BITS: u32 = 5;
const LEN_BITS: u32 = 3;

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

const ENTRIES: &[(&[u8], Method)] = &[
    (b"INVITE", Method::Invite),
    (b"ACK", Method::Ack),
    (b"OPTIONS", Method::Options),
    (b"BYE", Method::Bye),
    (b"CANCEL", Method::Cancel),
    (b"REGISTER", Method::Register),
    (b"PRACK", Method::Prack),
    (b"SUBSCRIBE", Method::Subscribe),
    (b"NOTIFY", Method::Notify),
    (b"PUBLISH", Method::Publish),
    (b"INFO", Method::Info),
    (b"REFER", Method::Refer),
    (b"MESSAGE", Method::Message),
    (b"UPDATE", Method::Update),
];

/// Looks up `name` (the raw method token from the request line) in the
/// method catalog. Unknown or malformed tokens yield [`Method::Other`].
pub fn lookup_method(name: &[u8]) -> Method {
    let key = match key_for(name) {
        Some(k) => k,
        None => return Method::Other,
    };
    for &(candidate, method) in ENTRIES {
        if key_for(candidate) == Some(key) && eq(candidate, name) {
            return method;
        }
    }
    Method::Other
}
