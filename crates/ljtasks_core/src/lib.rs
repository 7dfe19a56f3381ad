//! Task-oriented access to a remote journal's entries.
//!
//! Callers describe posts with a small property vocabulary (`subject`,
//! `body`, `tags`, `time`, `security`, ...). The property mapper turns those
//! bags into `Entry` fields and the task facade drives a `JournalClient`.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;

pub use client::journal_client::{
    ClientError, ClientResult, Credentials, EditOptions, FetchCriteria, FetchRequest,
    JournalClient, Session,
};
pub use client::memory::{ClientCall, InMemoryJournalClient};
pub use client::remote::RemoteEntry;
pub use config::{read_config, ConfigError, JournalConfig};
pub use error::{TasksError, TasksResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{CommentPolicy, Entry, EntryId, EntryValidationError, Screening, Security};
pub use model::property::{Properties, PropertyKey, PropertyValue};
pub use service::clock::{Clock, SystemClock};
pub use service::property_mapper::{apply_properties, coerce_gmt};
pub use service::task_facade::{TaskFacade, UpdateDecision};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
