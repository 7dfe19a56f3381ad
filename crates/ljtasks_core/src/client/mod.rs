//! Remote journal client boundary.
//!
//! # Responsibility
//! - Define the collaborator contract the facade calls into.
//! - Adapt the remote record shape to the owned `Entry` model.
//! - Provide an in-process client for tests and dry runs.
//!
//! # Invariants
//! - Everything network-facing stays behind `JournalClient`.

pub mod journal_client;
pub mod memory;
pub mod remote;
