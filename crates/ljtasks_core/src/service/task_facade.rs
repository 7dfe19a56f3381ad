//! Task-level journal operations.
//!
//! # Responsibility
//! - Offer list/get/url/create/update/delete over a `JournalClient`.
//! - Run the property mapper before every write.
//! - Keep one reference-now baseline across a bulk update.
//!
//! # Invariants
//! - Local validation (`NoSuchProperty`, `BodyRequired`, entry invariants)
//!   finishes before any remote write is issued.
//! - Each read or write is exactly one client call; nothing is cached.
//! - A guard abort happens after mapping and before the write.
//! - Client errors are returned unchanged.

use crate::client::journal_client::{
    ClientError, Credentials, EditOptions, FetchRequest, JournalClient, Session,
};
use crate::config::JournalConfig;
use crate::error::{TasksError, TasksResult};
use crate::model::entry::{Entry, EntryId};
use crate::model::property::{Properties, PropertyKey, BODY_ALIAS};
use crate::service::clock::{Clock, SystemClock};
use crate::service::property_mapper::apply_properties;
use chrono::{DateTime, Utc};
use log::{error, info};
use std::collections::BTreeMap;
use std::time::Instant;

/// Outcome of an update guard.
///
/// Only an explicit `false` aborts; `()` and `None` proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    Proceed,
    Abort,
}

impl From<bool> for UpdateDecision {
    fn from(value: bool) -> Self {
        if value {
            Self::Proceed
        } else {
            Self::Abort
        }
    }
}

impl From<()> for UpdateDecision {
    fn from(_: ()) -> Self {
        Self::Proceed
    }
}

impl From<Option<bool>> for UpdateDecision {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(false) => Self::Abort,
            _ => Self::Proceed,
        }
    }
}

/// Journal operations keyed by entry id and property bags.
///
/// ```
/// use ljtasks_core::{Credentials, InMemoryJournalClient, Properties, TaskFacade};
///
/// let client = InMemoryJournalClient::new("frank", "secret");
/// let tasks = TaskFacade::connect(client, &Credentials::new("frank", "secret")).unwrap();
/// let id = tasks
///     .create(Properties::new().with("body", "Hello").with("subject", "First"))
///     .unwrap();
/// assert_eq!(tasks.entry(id).unwrap().body(), "Hello");
/// ```
pub struct TaskFacade<C: JournalClient, K: Clock = SystemClock> {
    client: C,
    clock: K,
    session: Session,
}

impl<C: JournalClient> TaskFacade<C, SystemClock> {
    /// Authenticates once and returns a facade on wall-clock time.
    pub fn connect(client: C, credentials: &Credentials) -> TasksResult<Self> {
        Self::connect_with_clock(client, credentials, SystemClock)
    }

    /// Authenticates with the account from `config`.
    pub fn from_config(client: C, config: &JournalConfig) -> TasksResult<Self> {
        Self::connect(client, &config.credentials())
    }
}

impl<C: JournalClient, K: Clock> TaskFacade<C, K> {
    /// Authenticates once with an explicit time source.
    pub fn connect_with_clock(client: C, credentials: &Credentials, clock: K) -> TasksResult<Self> {
        let started_at = Instant::now();
        info!("event=facade_connect module=service status=start");
        let session = finish(
            "facade_connect",
            "",
            started_at,
            client.authenticate(credentials).map_err(TasksError::from),
        )?;
        Ok(Self {
            client,
            clock,
            session,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetches the most recent `limit` entries, keyed by id.
    ///
    /// `None` or `Some(0)` fetches every entry.
    pub fn entries(&self, limit: Option<u32>) -> TasksResult<BTreeMap<EntryId, Entry>> {
        let started_at = Instant::now();
        let result = self.fetch(&FetchRequest::recent(limit)).map(|entries| {
            entries
                .into_iter()
                .filter_map(|entry| entry.id().map(|id| (id, entry)))
                .collect::<BTreeMap<_, _>>()
        });
        let detail = match &result {
            Ok(entries) => format!("count={}", entries.len()),
            Err(_) => String::new(),
        };
        finish("entries_fetch", &detail, started_at, result)
    }

    /// Fetches one entry.
    ///
    /// # Errors
    /// - `ClientError::NotFound` when the id does not exist.
    pub fn entry(&self, id: EntryId) -> TasksResult<Entry> {
        let started_at = Instant::now();
        let result = self.fetch_one(id);
        finish("entry_fetch", &format!("entry_id={id}"), started_at, result)
    }

    /// Public URL of an entry, e.g. `https://frank.livejournal.com/3089.html`.
    pub fn url(&self, id: EntryId) -> TasksResult<String> {
        let entry = self.entry(id)?;
        entry
            .url(self.session.journal_url())
            .ok_or(TasksError::Client(ClientError::MissingField("itemid")))
    }

    /// Creates an entry and returns its remote id.
    ///
    /// `time` defaults to now and serves as reference-now, so a fresh post is
    /// only backdated when the caller supplies a different time.
    ///
    /// # Errors
    /// - `BodyRequired` when neither `body` nor `event` is present.
    /// - Mapper and validation errors, before any remote call.
    pub fn create(&self, properties: Properties) -> TasksResult<EntryId> {
        let started_at = Instant::now();
        info!("event=entry_create module=service status=start");
        let result = self.create_entry(properties);
        let detail = match &result {
            Ok(id) => format!("entry_id={id}"),
            Err(_) => String::new(),
        };
        finish("entry_create", &detail, started_at, result)
    }

    /// Applies `properties` to an entry and writes it back.
    ///
    /// Keys left out stay unchanged. An empty body may be read by the remote
    /// service as a delete request; it is passed through as given.
    pub fn update(&self, id: EntryId, properties: Properties) -> TasksResult<Entry> {
        let started_at = Instant::now();
        let detail = format!("entry_id={id}");
        let result = self
            .prepare(id, properties, self.reference_now())
            .and_then(|entry| self.write(entry));
        finish("entry_update", &detail, started_at, result)
    }

    /// Like `update`, with a guard run on the mapped entry before the write.
    ///
    /// Returning `false` from the guard skips the write and yields
    /// `Ok(None)`. The guard may also edit the entry.
    ///
    /// ```
    /// # use ljtasks_core::{Credentials, InMemoryJournalClient, Properties, Security, TaskFacade};
    /// # let tasks = TaskFacade::connect(
    /// #     InMemoryJournalClient::new("frank", "pw"),
    /// #     &Credentials::new("frank", "pw"),
    /// # ).unwrap();
    /// # let id = tasks.create(Properties::new().with("body", "draft")).unwrap();
    /// let updated = tasks
    ///     .update_with(id, Properties::new().with("security", Security::Private), |entry| {
    ///         entry.set_body(entry.body().replace("draft", "final"));
    ///     })
    ///     .unwrap();
    /// assert_eq!(updated.unwrap().body(), "final");
    /// ```
    pub fn update_with<F, D>(
        &self,
        id: EntryId,
        properties: Properties,
        guard: F,
    ) -> TasksResult<Option<Entry>>
    where
        F: FnOnce(&mut Entry) -> D,
        D: Into<UpdateDecision>,
    {
        self.update_at(id, properties, self.reference_now(), guard)
    }

    /// Guarded update against an explicit reference-now baseline.
    pub fn update_at<F, D>(
        &self,
        id: EntryId,
        properties: Properties,
        reference_now: DateTime<Utc>,
        guard: F,
    ) -> TasksResult<Option<Entry>>
    where
        F: FnOnce(&mut Entry) -> D,
        D: Into<UpdateDecision>,
    {
        let started_at = Instant::now();
        let detail = format!("entry_id={id}");
        let result = self.prepare(id, properties, reference_now).and_then(|mut entry| {
            let decision: UpdateDecision = guard(&mut entry).into();
            match decision {
                UpdateDecision::Abort => Ok(None),
                UpdateDecision::Proceed => self.write(entry).map(Some),
            }
        });
        if let Ok(None) = result {
            info!(
                "event=entry_update module=service status=skipped {detail} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return result;
        }
        finish("entry_update", &detail, started_at, result)
    }

    /// Applies `properties` to every entry.
    pub fn update_all(&self, properties: Properties) -> TasksResult<Vec<Entry>> {
        self.update_all_with(properties, |_: &mut Entry| UpdateDecision::Proceed)
    }

    /// Guarded update of every entry, in the order the service returns them.
    ///
    /// Reference-now is taken once, before the fetch, and shared by every
    /// entry. Skipped entries are left out of the result. The first hard
    /// failure stops the batch and is returned.
    pub fn update_all_with<F, D>(&self, properties: Properties, mut guard: F) -> TasksResult<Vec<Entry>>
    where
        F: FnMut(&mut Entry) -> D,
        D: Into<UpdateDecision>,
    {
        let reference_now = self.reference_now();
        let started_at = Instant::now();
        info!("event=entries_update_all module=service status=start");

        let result = self.update_each(&properties, reference_now, &mut guard);
        let detail = match &result {
            Ok(updated) => format!("updated={}", updated.len()),
            Err(_) => String::new(),
        };
        finish("entries_update_all", &detail, started_at, result)
    }

    /// Deletes an entry. Irreversible.
    pub fn delete(&self, id: EntryId) -> TasksResult<()> {
        let started_at = Instant::now();
        let result = self.fetch_one(id).and_then(|entry| {
            self.client
                .edit_entry(&self.session, &entry, EditOptions::delete())
                .map_err(TasksError::from)
        });
        finish("entry_delete", &format!("entry_id={id}"), started_at, result)
    }

    fn create_entry(&self, mut properties: Properties) -> TasksResult<EntryId> {
        if !properties.contains_key(BODY_ALIAS)
            && !properties.contains_key(PropertyKey::Event.as_str())
        {
            return Err(TasksError::BodyRequired);
        }
        let now = self.clock.now();
        if !properties.contains_key(PropertyKey::Time.as_str()) {
            properties.insert(PropertyKey::Time.as_str(), now);
        }

        let mut entry = Entry::new();
        apply_properties(&mut entry, properties, now.with_timezone(&Utc))?;
        entry.validate()?;
        Ok(self.client.post_entry(&self.session, &mut entry)?)
    }

    fn update_each<F, D>(
        &self,
        properties: &Properties,
        reference_now: DateTime<Utc>,
        guard: &mut F,
    ) -> TasksResult<Vec<Entry>>
    where
        F: FnMut(&mut Entry) -> D,
        D: Into<UpdateDecision>,
    {
        let ids: Vec<EntryId> = self
            .fetch(&FetchRequest::recent(None))?
            .iter()
            .filter_map(Entry::id)
            .collect();
        let mut updated = Vec::new();
        for id in ids {
            if let Some(entry) = self.update_at(id, properties.clone(), reference_now, &mut *guard)? {
                updated.push(entry);
            }
        }
        Ok(updated)
    }

    fn reference_now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn fetch(&self, request: &FetchRequest) -> TasksResult<Vec<Entry>> {
        Ok(self.client.fetch_entries(&self.session, request)?)
    }

    fn fetch_one(&self, id: EntryId) -> TasksResult<Entry> {
        self.fetch(&FetchRequest::item(id))?
            .into_iter()
            .find(|entry| entry.id() == Some(id))
            .ok_or(TasksError::Client(ClientError::NotFound(id)))
    }

    fn prepare(
        &self,
        id: EntryId,
        properties: Properties,
        reference_now: DateTime<Utc>,
    ) -> TasksResult<Entry> {
        let mut entry = self.fetch_one(id)?;
        apply_properties(&mut entry, properties, reference_now)?;
        Ok(entry)
    }

    fn write(&self, entry: Entry) -> TasksResult<Entry> {
        entry.validate()?;
        self.client
            .edit_entry(&self.session, &entry, EditOptions::default())?;
        Ok(entry)
    }
}

fn finish<T>(
    event: &str,
    detail: &str,
    started_at: Instant,
    result: TasksResult<T>,
) -> TasksResult<T> {
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event={event} module=service status=ok {detail} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event={event} module=service status=error {detail} duration_ms={duration_ms} local={} error={err}",
            err.is_local()
        ),
    }
    result
}
