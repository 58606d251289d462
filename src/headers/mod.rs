//! Structured header bodies (component J): once [`crate::headerline`]
//! has delimited a header's name and value, these sub-parsers turn the
//! value into a typed representation.

pub mod callid;
pub mod contact;
pub mod cseq;
pub mod nameaddr;
pub mod uint;

pub use callid::parse_call_id;
pub use contact::ContactList;
pub use cseq::{parse_cseq, CSeq};
pub use nameaddr::{parse_name_addr, NameAddr};
pub use uint::{parse_bounded_uint, UintBounds, CONTENT_LENGTH_BOUNDS, EXPIRES_BOUNDS};

use crate::catalog::HdrKind;
use crate::limits::MAX_HEADERS;

/// A capped, in-order record of every header line seen on a message —
/// its [`HdrKind`] and whether it used the compact spelling. Feeds
/// [`crate::signature`]'s seen-header-set; storing the body itself
/// isn't needed here since each recognized header already has its own
/// typed field on [`crate::message::Message`].
#[derive(Copy, Clone, Debug)]
pub struct HeaderList {
    entries: [(HdrKind, bool); MAX_HEADERS],
    count: usize,
    /// Total header lines seen, including ones past `MAX_HEADERS`.
    pub seen: usize,
}

impl Default for HeaderList {
    fn default() -> Self {
        HeaderList {
            entries: [(HdrKind::None, false); MAX_HEADERS],
            count: 0,
            seen: 0,
        }
    }
}

impl HeaderList {
    /// Resets this list to empty.
    pub fn reset(&mut self) {
        *self = HeaderList::default();
    }

    /// Records one header line's kind and compact-form flag.
    pub fn push(&mut self, kind: HdrKind, compact: bool) {
        self.seen += 1;
        if self.count < MAX_HEADERS {
            self.entries[self.count] = (kind, compact);
            self.count += 1;
        }
    }

    /// Recorded entries, in arrival order, capped at `MAX_HEADERS`.
    pub fn entries(&self) -> &[(HdrKind, bool)] {
        &self.entries[..self.count]
    }
}
