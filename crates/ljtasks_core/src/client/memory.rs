//! In-process journal client.
//!
//! # Responsibility
//! - Store remote records in memory behind the `JournalClient` contract.
//! - Record every call so callers can assert what reached the "network".
//!
//! # Invariants
//! - Records pass through `RemoteEntry` on every write and read, so entries
//!   observe the same field mapping a wire client would apply.
//! - An edit with an empty body deletes the entry, as the remote protocol does.

use crate::client::journal_client::{
    ClientError, ClientResult, Credentials, EditOptions, FetchCriteria, FetchRequest,
    JournalClient, Session,
};
use crate::client::remote::RemoteEntry;
use crate::model::entry::{Entry, EntryId};
use secrecy::{ExposeSecret, SecretString};
use std::cell::RefCell;

/// One call observed by `InMemoryJournalClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Authenticate { username: String },
    Fetch(FetchRequest),
    Post,
    Edit { id: Option<EntryId>, delete: bool },
}

impl ClientCall {
    /// True for calls that change remote state.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Post | Self::Edit { .. })
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<RemoteEntry>,
    next_id: EntryId,
    calls: Vec<ClientCall>,
}

/// `JournalClient` backed by an in-memory record list.
///
/// Single-threaded; interior mutability lets it satisfy the `&self` trait
/// methods.
#[derive(Debug)]
pub struct InMemoryJournalClient {
    username: String,
    password: SecretString,
    journal_url: String,
    state: RefCell<MemoryState>,
}

impl InMemoryJournalClient {
    /// Creates a client accepting exactly these credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let journal_url = format!("https://{}.livejournal.com", username.replace('_', "-"));
        Self {
            username,
            password: SecretString::from(password.into()),
            journal_url,
            state: RefCell::new(MemoryState {
                next_id: 1,
                ..MemoryState::default()
            }),
        }
    }

    /// Seeds a remote record directly, bypassing entry encoding.
    ///
    /// Records without an `itemid` get the next free id. Returns the id.
    pub fn insert_remote(&self, mut record: RemoteEntry) -> EntryId {
        let mut state = self.state.borrow_mut();
        let id = match record.itemid {
            Some(id) => id,
            None => state.next_id,
        };
        state.next_id = state.next_id.max(id.saturating_add(1));
        record.itemid = Some(id);
        record.anum.get_or_insert(anum_for(id));
        state.records.push(record);
        id
    }

    /// Stored record for `id`, as the remote service would hold it.
    pub fn remote(&self, id: EntryId) -> Option<RemoteEntry> {
        self.state
            .borrow()
            .records
            .iter()
            .find(|record| record.itemid == Some(id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().records.is_empty()
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.state.borrow().calls.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.is_write())
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn record_call(&self, call: ClientCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn check_session(&self, session: &Session) -> ClientResult<()> {
        if session.username() != self.username {
            return Err(ClientError::Authentication(format!(
                "session belongs to `{}`",
                session.username()
            )));
        }
        Ok(())
    }
}

impl JournalClient for InMemoryJournalClient {
    fn authenticate(&self, credentials: &Credentials) -> ClientResult<Session> {
        self.record_call(ClientCall::Authenticate {
            username: credentials.username.clone(),
        });
        if credentials.username != self.username
            || credentials.password.expose_secret() != self.password.expose_secret()
        {
            return Err(ClientError::Authentication(
                "invalid username or password".to_string(),
            ));
        }
        Ok(Session::new(self.username.clone(), self.journal_url.clone())
            .with_auth_token(format!("memory-{}", self.username)))
    }

    fn fetch_entries(&self, session: &Session, request: &FetchRequest) -> ClientResult<Vec<Entry>> {
        self.record_call(ClientCall::Fetch(*request));
        self.check_session(session)?;

        let state = self.state.borrow();
        let records: Vec<RemoteEntry> = match request.criteria {
            FetchCriteria::ItemId(id) => {
                let record = state
                    .records
                    .iter()
                    .find(|record| record.itemid == Some(id))
                    .ok_or(ClientError::NotFound(id))?;
                vec![record.clone()]
            }
            FetchCriteria::Recent(limit) => {
                let mut records = state.records.clone();
                records.sort_by(|a, b| {
                    b.eventtime
                        .cmp(&a.eventtime)
                        .then_with(|| b.itemid.cmp(&a.itemid))
                });
                if let Some(limit) = limit {
                    records.truncate(limit as usize);
                }
                records
            }
        };
        drop(state);

        records
            .into_iter()
            .map(|record| record.into_entry(request.strict))
            .collect()
    }

    fn post_entry(&self, session: &Session, entry: &mut Entry) -> ClientResult<EntryId> {
        self.record_call(ClientCall::Post);
        self.check_session(session)?;
        if entry.id().is_some() {
            return Err(ClientError::Protocol("entry was already posted".to_string()));
        }

        let mut record = RemoteEntry::from_entry(entry)?;
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        let anum = anum_for(id);
        entry.assign_id(id)?;
        entry.anum = Some(anum);

        record.itemid = Some(id);
        record.anum = Some(anum);
        state.records.push(record);
        state.next_id += 1;
        Ok(id)
    }

    fn edit_entry(
        &self,
        session: &Session,
        entry: &Entry,
        options: EditOptions,
    ) -> ClientResult<()> {
        self.record_call(ClientCall::Edit {
            id: entry.id(),
            delete: options.delete,
        });
        self.check_session(session)?;

        let id = entry.id().ok_or(ClientError::MissingField("itemid"))?;
        let mut state = self.state.borrow_mut();
        let index = state
            .records
            .iter()
            .position(|record| record.itemid == Some(id))
            .ok_or(ClientError::NotFound(id))?;

        if options.delete || entry.body().is_empty() {
            state.records.remove(index);
            return Ok(());
        }

        let mut record = RemoteEntry::from_entry(entry)?;
        record.anum = state.records[index].anum;
        state.records[index] = record;
        Ok(())
    }
}

fn anum_for(id: EntryId) -> u32 {
    (id.wrapping_mul(37).wrapping_add(11) % 256) as u32
}
