//! Journal use-case services.
//!
//! # Responsibility
//! - Map caller property bags onto entries.
//! - Orchestrate client calls into task-level operations.
//!
//! # Invariants
//! - Mapping is pure; only the facade talks to a `JournalClient`.

pub mod clock;
pub mod property_mapper;
pub mod task_facade;
