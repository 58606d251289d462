//! Fixed capacities for every caller-owned, heap-free collection in this
//! crate. Centralized here instead of scattered at each `[T; N]` call site.

/// Header-list capacity. Headers beyond this are still counted but not
/// stored (see [`crate::headers::HeaderList`]).
pub const MAX_HEADERS: usize = 64;

/// In-line Contact/P-Asserted-Identity values before the "last slot"
/// fallback takes over.
pub const MAX_CONTACTS: usize = 8;

/// Hard ceiling on a single message buffer, imposed by the 16-bit
/// field-range representation (see [`crate::field::Field`]).
pub const MAX_MESSAGE_LEN: usize = 65535;
