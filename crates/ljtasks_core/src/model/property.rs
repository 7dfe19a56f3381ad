//! Caller-facing property vocabulary.
//!
//! # Responsibility
//! - Name every settable entry field through a closed key table.
//! - Carry loosely typed caller values until the mapper checks them.
//!
//! # Invariants
//! - Keys in a `Properties` bag are unique; re-inserting replaces in place.
//! - Iteration follows first-insertion order.

use crate::model::entry::{CommentPolicy, Screening, Security};
use chrono::{DateTime, FixedOffset, TimeZone};

/// Caller alias for `event`.
pub const BODY_ALIAS: &str = "body";
/// Caller alias for `taglist`.
pub const TAGS_ALIAS: &str = "tags";

/// Canonical, settable entry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Subject,
    Event,
    Taglist,
    Time,
    Backdated,
    Mood,
    Music,
    Location,
    Pickeyword,
    Security,
    Allowmask,
    Comments,
    Screening,
    Preformatted,
}

impl PropertyKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Event => "event",
            Self::Taglist => "taglist",
            Self::Time => "time",
            Self::Backdated => "backdated",
            Self::Mood => "mood",
            Self::Music => "music",
            Self::Location => "location",
            Self::Pickeyword => "pickeyword",
            Self::Security => "security",
            Self::Allowmask => "allowmask",
            Self::Comments => "comments",
            Self::Screening => "screening",
            Self::Preformatted => "preformatted",
        }
    }

    /// Resolves a canonical key name. Aliases are not accepted here.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "subject" => Some(Self::Subject),
            "event" => Some(Self::Event),
            "taglist" => Some(Self::Taglist),
            "time" => Some(Self::Time),
            "backdated" => Some(Self::Backdated),
            "mood" => Some(Self::Mood),
            "music" => Some(Self::Music),
            "location" => Some(Self::Location),
            "pickeyword" => Some(Self::Pickeyword),
            "security" => Some(Self::Security),
            "allowmask" => Some(Self::Allowmask),
            "comments" => Some(Self::Comments),
            "screening" => Some(Self::Screening),
            "preformatted" => Some(Self::Preformatted),
            _ => None,
        }
    }
}

/// Loosely typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
    Time(DateTime<FixedOffset>),
    Bool(bool),
    Integer(i64),
}

impl PropertyValue {
    /// Short shape name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Time(_) => "time",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PropertyValue {
    fn from(value: [&str; N]) -> Self {
        Self::List(value.iter().map(|tag| tag.to_string()).collect())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for PropertyValue {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Time(value.fixed_offset())
    }
}

impl From<Security> for PropertyValue {
    fn from(value: Security) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<CommentPolicy> for PropertyValue {
    fn from(value: CommentPolicy) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<Screening> for PropertyValue {
    fn from(value: Screening) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

/// Insertion-ordered property bag keyed by caller-supplied names.
///
/// ```
/// use ljtasks_core::Properties;
///
/// let props = Properties::new()
///     .with("subject", "Moving day")
///     .with("tags", ["boxes", "stairs"])
///     .with("security", "friends");
/// assert_eq!(props.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    items: Vec<(String, PropertyValue)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a value, keeping the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.items.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.items.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.items
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        let index = self.items.iter().position(|(name, _)| name == key)?;
        Some(self.items.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.items.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for Properties {
    type Item = (String, PropertyValue);
    type IntoIter = std::vec::IntoIter<(String, PropertyValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}
