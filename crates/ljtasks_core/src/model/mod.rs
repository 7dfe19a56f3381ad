//! Journal entry model and property vocabulary.
//!
//! # Responsibility
//! - Define the owned `Entry` record and its enumerated fields.
//! - Define the closed set of property keys callers may set.
//!
//! # Invariants
//! - Every remote entry is identified by a stable `EntryId`.
//! - Unknown property keys never resolve to a field.

pub mod entry;
pub mod property;
