//! Remote journal client contract.
//!
//! # Responsibility
//! - Define the authenticated read/create/edit operations the facade needs.
//! - Keep transport and wire details behind one trait boundary.
//!
//! # Invariants
//! - Each trait method is one remote operation.
//! - `post_entry` assigns the remote id onto the entry it was given.
//! - Errors describe the remote outcome; the facade never rewrites them.

use crate::model::entry::{Entry, EntryId, EntryValidationError};
use secrecy::SecretString;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Remote or transport failure reported by a `JournalClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("entry not found: {0}")]
    NotFound(EntryId),
    #[error("remote service rejected the request: {0}")]
    Protocol(String),
    #[error("malformed remote field `{field}`: `{value}`")]
    MalformedField { field: String, value: String },
    #[error("remote record is missing `{0}`")]
    MissingField(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Entry(#[from] EntryValidationError),
}

/// Account credentials handed to `JournalClient::authenticate`.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Authenticated session. Established once per facade and never refreshed.
#[derive(Debug)]
pub struct Session {
    username: String,
    journal_url: String,
    auth_token: Option<SecretString>,
}

impl Session {
    pub fn new(username: impl Into<String>, journal_url: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            journal_url: journal_url.into(),
            auth_token: None,
        }
    }

    /// Attaches an opaque token issued by the remote service.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Base URL of the user's journal, e.g. `https://frank.livejournal.com`.
    pub fn journal_url(&self) -> &str {
        &self.journal_url
    }

    pub fn auth_token(&self) -> Option<&SecretString> {
        self.auth_token.as_ref()
    }
}

/// Which entries to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCriteria {
    /// Most recent entries; `None` means all of them.
    Recent(Option<u32>),
    ItemId(EntryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub criteria: FetchCriteria,
    /// When false, unparsable remote fields are skipped instead of failing
    /// the whole fetch.
    pub strict: bool,
}

impl FetchRequest {
    /// Non-strict fetch of the most recent `limit` entries. Zero means all.
    pub fn recent(limit: Option<u32>) -> Self {
        Self {
            criteria: FetchCriteria::Recent(limit.filter(|limit| *limit > 0)),
            strict: false,
        }
    }

    /// Non-strict fetch of one entry.
    pub fn item(id: EntryId) -> Self {
        Self {
            criteria: FetchCriteria::ItemId(id),
            strict: false,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOptions {
    /// Delete the entry instead of updating its content.
    pub delete: bool,
}

impl EditOptions {
    pub fn delete() -> Self {
        Self { delete: true }
    }
}

/// Authenticated access to a remote journal.
///
/// Implementations own transport, authentication and wire encoding.
pub trait JournalClient {
    fn authenticate(&self, credentials: &Credentials) -> ClientResult<Session>;

    /// Returns entries in the remote service's order.
    fn fetch_entries(&self, session: &Session, request: &FetchRequest) -> ClientResult<Vec<Entry>>;

    /// Creates a remote entry and assigns its id onto `entry`.
    fn post_entry(&self, session: &Session, entry: &mut Entry) -> ClientResult<EntryId>;

    fn edit_entry(&self, session: &Session, entry: &Entry, options: EditOptions)
        -> ClientResult<()>;
}

impl<C: JournalClient + ?Sized> JournalClient for &C {
    fn authenticate(&self, credentials: &Credentials) -> ClientResult<Session> {
        (**self).authenticate(credentials)
    }

    fn fetch_entries(&self, session: &Session, request: &FetchRequest) -> ClientResult<Vec<Entry>> {
        (**self).fetch_entries(session, request)
    }

    fn post_entry(&self, session: &Session, entry: &mut Entry) -> ClientResult<EntryId> {
        (**self).post_entry(session, entry)
    }

    fn edit_entry(
        &self,
        session: &Session,
        entry: &Entry,
        options: EditOptions,
    ) -> ClientResult<()> {
        (**self).edit_entry(session, entry, options)
    }
}
