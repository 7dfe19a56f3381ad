//! Entry domain model.
//!
//! # Responsibility
//! - Define the owned journal entry record shared by mapper, facade and
//!   client adapters.
//! - Expose caller-facing aliases (`body`, `tags`) over canonical fields.
//!
//! # Invariants
//! - `id` is assigned once by the remote service and never changes.
//! - `body` and `event` (and `tags` and `taglist`) read and write the same
//!   storage.
//! - `time` is always GMT-labelled.
//! - `Security::Custom` requires `allowmask` before any remote write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote item id. Assigned by the service on creation.
pub type EntryId = u64;

/// Entry visibility level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    #[default]
    Public,
    Friends,
    Private,
    /// Group-restricted; needs `Entry::allowmask`.
    Custom,
}

impl Security {
    pub const NAMES: &'static [&'static str] = &["public", "friends", "private", "custom"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::Private => "private",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "friends" => Some(Self::Friends),
            "private" => Some(Self::Private),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Comment policy for an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentPolicy {
    #[default]
    Normal,
    /// Comments disabled.
    None,
    /// Comments allowed, but no email notification.
    #[serde(rename = "noemail")]
    NoEmail,
}

impl CommentPolicy {
    pub const NAMES: &'static [&'static str] = &["normal", "none", "noemail"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::None => "none",
            Self::NoEmail => "noemail",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "none" => Some(Self::None),
            "noemail" => Some(Self::NoEmail),
            _ => None,
        }
    }
}

/// Comment screening policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screening {
    /// Use the journal-wide setting.
    #[default]
    Default,
    All,
    Anonymous,
    #[serde(rename = "nonfriends")]
    NonFriends,
    None,
}

impl Screening {
    pub const NAMES: &'static [&'static str] =
        &["default", "all", "anonymous", "nonfriends", "none"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::All => "all",
            Self::Anonymous => "anonymous",
            Self::NonFriends => "nonfriends",
            Self::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "all" => Some(Self::All),
            "anonymous" => Some(Self::Anonymous),
            "nonfriends" => Some(Self::NonFriends),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Entry invariant violations detected before a remote write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryValidationError {
    #[error("security `custom` requires an allowmask")]
    MissingAllowMask,
    #[error("entry id is already {current}; refusing to reassign it to {attempted}")]
    IdReassigned {
        current: EntryId,
        attempted: EntryId,
    },
}

/// One journal post.
///
/// Fields are public except `id`, which only the remote service assigns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    id: Option<EntryId>,
    /// Anti-enumeration number paired with `id` in public URLs.
    pub anum: Option<u32>,
    pub subject: Option<String>,
    /// Canonical body field. Also reachable through `body()`.
    pub event: String,
    /// Canonical tag field. Also reachable through `tags()`.
    pub taglist: Vec<String>,
    /// GMT-labelled post time.
    pub time: Option<DateTime<Utc>>,
    pub backdated: bool,
    pub mood: Option<String>,
    pub music: Option<String>,
    pub location: Option<String>,
    pub pickeyword: Option<String>,
    pub security: Security,
    pub allowmask: Option<u32>,
    pub comments: CommentPolicy,
    pub screening: Screening,
    pub preformatted: bool,
}

impl Entry {
    /// Creates an empty, not-yet-posted entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entry that already exists remotely.
    ///
    /// Used by client adapters when decoding fetched records.
    pub fn with_id(id: EntryId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    /// Records the id the remote service assigned on creation.
    ///
    /// Assigning the same id again is a no-op; a different id is rejected.
    pub fn assign_id(&mut self, id: EntryId) -> Result<(), EntryValidationError> {
        match self.id {
            Some(current) if current != id => Err(EntryValidationError::IdReassigned {
                current,
                attempted: id,
            }),
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    pub fn body(&self) -> &str {
        &self.event
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.event = body.into();
    }

    pub fn tags(&self) -> &[String] {
        &self.taglist
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.taglist = tags.into_iter().map(Into::into).collect();
    }

    /// Id used in public URLs: `id * 256 + anum`.
    ///
    /// `None` before posting, or when the id is too large to encode.
    pub fn display_itemid(&self) -> Option<u64> {
        self.id?
            .checked_mul(256)?
            .checked_add(u64::from(self.anum.unwrap_or(0)))
    }

    /// Public URL of this entry under `journal_url`.
    pub fn url(&self, journal_url: &str) -> Option<String> {
        self.display_itemid()
            .map(|ditemid| format!("{}/{ditemid}.html", journal_url.trim_end_matches('/')))
    }

    /// Checks invariants that must hold before a remote write.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.security == Security::Custom && self.allowmask.is_none() {
            return Err(EntryValidationError::MissingAllowMask);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CommentPolicy, Entry, EntryValidationError, Screening, Security};

    #[test]
    fn body_and_tags_aliases_share_storage() {
        let mut entry = Entry::new();
        entry.set_body("<p>hi</p>");
        entry.set_tags(["rust", "lj"]);
        assert_eq!(entry.event, "<p>hi</p>");
        assert_eq!(entry.taglist, vec!["rust".to_string(), "lj".to_string()]);

        entry.event = "changed".to_string();
        entry.taglist.push("more".to_string());
        assert_eq!(entry.body(), "changed");
        assert_eq!(entry.tags().len(), 3);
    }

    #[test]
    fn assign_id_is_write_once() {
        let mut entry = Entry::new();
        assert_eq!(entry.id(), None);
        entry.assign_id(7).unwrap();
        entry.assign_id(7).unwrap();
        assert_eq!(
            entry.assign_id(8).unwrap_err(),
            EntryValidationError::IdReassigned {
                current: 7,
                attempted: 8
            }
        );
        assert_eq!(entry.id(), Some(7));
    }

    #[test]
    fn url_uses_display_itemid() {
        let mut entry = Entry::with_id(3);
        entry.anum = Some(17);
        assert_eq!(entry.display_itemid(), Some(3 * 256 + 17));
        assert_eq!(
            entry.url("https://frank.livejournal.com/").as_deref(),
            Some("https://frank.livejournal.com/785.html")
        );
        assert_eq!(Entry::new().url("https://frank.livejournal.com"), None);
    }

    #[test]
    fn display_itemid_is_none_when_it_would_overflow() {
        let mut largest = Entry::with_id(u64::MAX / 256);
        largest.anum = Some(255);
        assert_eq!(largest.display_itemid(), Some(u64::MAX));

        let mut too_large = Entry::with_id(u64::MAX / 256 + 1);
        too_large.anum = Some(0);
        assert_eq!(too_large.display_itemid(), None);
        assert_eq!(too_large.url("https://frank.livejournal.com"), None);
        assert_eq!(Entry::with_id(u64::MAX).display_itemid(), None);
    }

    #[test]
    fn custom_security_requires_allowmask() {
        let mut entry = Entry::new();
        entry.security = Security::Custom;
        assert_eq!(
            entry.validate().unwrap_err(),
            EntryValidationError::MissingAllowMask
        );
        entry.allowmask = Some(0b110);
        entry.validate().unwrap();
    }

    #[test]
    fn enum_names_parse_back() {
        for name in Security::NAMES {
            assert_eq!(Security::parse(name).unwrap().as_str(), *name);
        }
        for name in CommentPolicy::NAMES {
            assert_eq!(CommentPolicy::parse(name).unwrap().as_str(), *name);
        }
        for name in Screening::NAMES {
            assert_eq!(Screening::parse(name).unwrap().as_str(), *name);
        }
        assert_eq!(Security::parse(" Private "), Some(Security::Private));
        assert_eq!(Screening::parse("friends-only"), None);
    }
}
