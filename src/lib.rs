#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(test, deny(warnings))]
#![deny(missing_docs)]
#![deny(dead_code)]
//! # sipwire
//!
//! An incremental, zero-copy parser for the SIP (RFC 3261) text message
//! format. Parsed fields are `(offset, length)` ranges into the caller's
//! own buffer — nothing is copied, nothing is heap-allocated.
//!
//! Every parser in this crate is *resumable*: on truncated input it
//! returns [`error::Outcome::MoreBytes`] at a safe resume point instead of
//! failing, so a caller streaming bytes off a socket can append more data
//! and call the same parser again with the same state object. See
//! [`message::Message`] for the top-level entry point.

pub mod bytecase;
pub mod catalog;
pub mod error;
pub mod field;
pub mod firstline;
pub mod headerline;
pub mod headers;
pub mod ip;
pub mod lex;
pub mod limits;
pub mod message;
pub mod signature;
pub mod uri;

pub use error::{Outcome, PResult, SipError, UResult, UriError};
pub use field::Field;
pub use message::{Flags, Message, Phase, StepFlags, CLEN_REQUIRED, NO_MORE_DATA, SKIP_BODY};
pub use signature::{compute as compute_signature, ClassSig, MsgSig};
