//! Error types for task facade operations.
//!
//! Local validation errors are raised before any remote call. Client errors
//! pass through unchanged.

use crate::client::journal_client::ClientError;
use crate::model::entry::EntryValidationError;
use thiserror::Error;

/// Result alias for facade and mapper operations.
pub type TasksResult<T> = Result<T, TasksError>;

#[derive(Debug, Error)]
pub enum TasksError {
    /// Property key that matches no entry field.
    #[error("entries don't have the `{0}` property")]
    NoSuchProperty(String),

    #[error("a body is required to create an entry")]
    BodyRequired,

    /// Known key carrying a value of the wrong shape.
    #[error("property `{key}` expects {expected}")]
    InvalidPropertyValue { key: String, expected: String },

    #[error(transparent)]
    Validation(#[from] EntryValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl TasksError {
    /// True for errors raised locally, before any network interaction.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Client(_))
    }
}
