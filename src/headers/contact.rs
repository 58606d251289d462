//! Contact-list accounting (part of component J): a fixed-capacity
//! array of parsed [`NameAddr`] values plus the running min/max
//! `expires` seen across the whole list, per [`crate::limits::MAX_CONTACTS`].
//!
//! Values beyond the inline capacity are still counted (so callers can
//! detect overflow) but fall into a single "last slot" that keeps
//! getting overwritten — this crate never allocates to grow the list.

use crate::error::{Outcome, PResult};
use crate::headers::nameaddr::{parse_name_addr, NameAddr};
use crate::limits::MAX_CONTACTS;

/// A bounded list of Contact (or P-Asserted-Identity) values.
#[derive(Copy, Clone, Debug)]
pub struct ContactList {
    slots: [NameAddr; MAX_CONTACTS],
    count: usize,
    /// Total values seen, including the ones that overflowed `slots`.
    pub seen: usize,
    /// Number of distinct header lines folded into this list — one per
    /// call to [`ContactList::parse_all`], as opposed to `seen` which
    /// counts every comma-separated value across all of them.
    pub header_lines: usize,
    /// Whether a `*` wildcard value was seen (valid only on Contact).
    pub star: bool,
    /// Smallest `expires` parameter seen across all values, if any.
    pub min_expires: Option<u32>,
    /// Largest `expires` parameter seen across all values, if any.
    pub max_expires: Option<u32>,
}

impl Default for ContactList {
    fn default() -> Self {
        ContactList {
            slots: [NameAddr::default(); MAX_CONTACTS],
            count: 0,
            seen: 0,
            header_lines: 0,
            star: false,
            min_expires: None,
            max_expires: None,
        }
    }
}

impl ContactList {
    /// Resets this list to empty.
    pub fn reset(&mut self) {
        *self = ContactList::default();
    }

    /// Stored values, in arrival order, capped at `MAX_CONTACTS`.
    pub fn values(&self) -> &[NameAddr] {
        &self.slots[..self.count]
    }

    fn record(&mut self, na: NameAddr) {
        self.seen += 1;
        if na.star {
            self.star = true;
            return;
        }
        if na.has_expires {
            self.min_expires = Some(self.min_expires.map_or(na.expires, |m| m.min(na.expires)));
            self.max_expires = Some(self.max_expires.map_or(na.expires, |m| m.max(na.expires)));
        }
        if self.count < MAX_CONTACTS {
            self.slots[self.count] = na;
            self.count += 1;
        } else {
            // Overflow: keep the running tallies accurate but drop the
            // value itself — the last inline slot is left as-is rather
            // than silently repurposed, so `values()` stays a prefix of
            // what was actually seen.
        }
    }

    /// Parses every comma-separated value in a Contact (or similar)
    /// header body starting at `i`, accumulating into `self`.
    pub fn parse_all(&mut self, buf: &[u8], mut i: usize) -> PResult {
        self.header_lines += 1;
        loop {
            let mut na = NameAddr::default();
            match parse_name_addr(buf, i, &mut na)? {
                (next, Outcome::MoreValues) => {
                    self.record(na);
                    i = next;
                }
                (next, outcome) => {
                    self.record(na);
                    return Ok((next, outcome));
                }
            }
        }
    }
}
