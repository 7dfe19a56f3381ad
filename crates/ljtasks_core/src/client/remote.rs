//! Adapter between `Entry` and the remote service's flat record shape.
//!
//! # Responsibility
//! - Map entry fields to remote names (`eventtime`, `usemask`, `opt_*` props).
//! - Decode fetched records, optionally tolerating unparsable fields.
//!
//! # Invariants
//! - `current_mood` is kept verbatim as text, never coerced to a number.
//! - `eventtime` carries wall-clock time with no zone.
//! - Non-strict decoding never fails on a single bad prop; it skips it.

use crate::client::journal_client::{ClientError, ClientResult};
use crate::model::entry::{
    CommentPolicy, Entry, EntryId, EntryValidationError, Screening, Security,
};
use chrono::NaiveDateTime;
use log::warn;
use std::collections::BTreeMap;

const EVENTTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const EVENTTIME_SHORT_FORMAT: &str = "%Y-%m-%d %H:%M";
const FRIENDS_MASK: u32 = 1;

/// One entry as the remote service stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteEntry {
    pub itemid: Option<EntryId>,
    pub anum: Option<u32>,
    pub eventtime: String,
    pub subject: Option<String>,
    pub event: String,
    /// `public`, `private` or `usemask`. Absent means public.
    pub security: Option<String>,
    pub allowmask: Option<String>,
    pub props: BTreeMap<String, String>,
}

impl RemoteEntry {
    /// Encodes an entry for a create or edit call.
    pub fn from_entry(entry: &Entry) -> ClientResult<Self> {
        let time = entry.time.ok_or(ClientError::MissingField("eventtime"))?;

        let (security, allowmask) = match entry.security {
            Security::Public => (None, None),
            Security::Private => (Some("private"), None),
            Security::Friends => (Some("usemask"), Some(FRIENDS_MASK)),
            Security::Custom => {
                let mask = entry
                    .allowmask
                    .ok_or(EntryValidationError::MissingAllowMask)?;
                (Some("usemask"), Some(mask))
            }
        };

        let mut props = BTreeMap::new();
        let mut put = |name: &str, value: Option<&String>| {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                props.insert(name.to_string(), value.clone());
            }
        };
        put("current_mood", entry.mood.as_ref());
        put("current_music", entry.music.as_ref());
        put("current_location", entry.location.as_ref());
        put("picture_keyword", entry.pickeyword.as_ref());

        if !entry.taglist.is_empty() {
            props.insert("taglist".to_string(), entry.taglist.join(", "));
        }
        if entry.preformatted {
            props.insert("opt_preformatted".to_string(), "1".to_string());
        }
        if entry.backdated {
            props.insert("opt_backdated".to_string(), "1".to_string());
        }
        match entry.comments {
            CommentPolicy::Normal => {}
            CommentPolicy::None => {
                props.insert("opt_nocomments".to_string(), "1".to_string());
            }
            CommentPolicy::NoEmail => {
                props.insert("opt_noemail".to_string(), "1".to_string());
            }
        }
        if let Some(code) = screening_code(entry.screening) {
            props.insert("opt_screening".to_string(), code.to_string());
        }

        Ok(Self {
            itemid: entry.id(),
            anum: entry.anum,
            eventtime: time.naive_utc().format(EVENTTIME_FORMAT).to_string(),
            subject: entry.subject.clone(),
            event: entry.event.clone(),
            security: security.map(str::to_string),
            allowmask: allowmask.map(|mask| mask.to_string()),
            props,
        })
    }

    /// Decodes a fetched record.
    ///
    /// With `strict = false`, fields that fail to parse are logged and left
    /// at their defaults.
    pub fn into_entry(self, strict: bool) -> ClientResult<Entry> {
        let mut entry = match self.itemid {
            Some(id) => Entry::with_id(id),
            None => Entry::new(),
        };
        entry.anum = self.anum;
        entry.subject = self.subject.filter(|subject| !subject.is_empty());
        entry.event = self.event;

        tolerate(
            parse_eventtime(&self.eventtime).map(|time| entry.time = Some(time)),
            strict,
            entry.id(),
        )?;
        tolerate(
            load_security(
                &mut entry,
                self.security.as_deref(),
                self.allowmask.as_deref(),
            ),
            strict,
            entry.id(),
        )?;
        for (name, value) in &self.props {
            tolerate(load_prop(&mut entry, name, value), strict, entry.id())?;
        }

        Ok(entry)
    }
}

fn tolerate(result: ClientResult<()>, strict: bool, id: Option<EntryId>) -> ClientResult<()> {
    match result {
        Err(err) if !strict => {
            warn!(
                "event=remote_decode module=client status=skipped entry_id={} error={}",
                id.map_or_else(|| "none".to_string(), |id| id.to_string()),
                err
            );
            Ok(())
        }
        other => other,
    }
}

fn malformed(field: &str, value: &str) -> ClientError {
    ClientError::MalformedField {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_eventtime(value: &str) -> ClientResult<chrono::DateTime<chrono::Utc>> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, EVENTTIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, EVENTTIME_SHORT_FORMAT))
        .map(|naive| naive.and_utc())
        .map_err(|_| malformed("eventtime", value))
}

fn load_security(
    entry: &mut Entry,
    security: Option<&str>,
    allowmask: Option<&str>,
) -> ClientResult<()> {
    match security.unwrap_or("public") {
        "public" => entry.security = Security::Public,
        "private" => entry.security = Security::Private,
        "usemask" => {
            let raw = allowmask.unwrap_or("0");
            let mask: u32 = raw
                .trim()
                .parse()
                .map_err(|_| malformed("allowmask", raw))?;
            if mask == FRIENDS_MASK {
                entry.security = Security::Friends;
            } else {
                entry.security = Security::Custom;
                entry.allowmask = Some(mask);
            }
        }
        other => return Err(malformed("security", other)),
    }
    Ok(())
}

fn load_prop(entry: &mut Entry, name: &str, value: &str) -> ClientResult<()> {
    match name {
        "current_mood" => entry.mood = Some(value.to_string()),
        "current_moodid" => {}
        "current_music" => entry.music = Some(value.to_string()),
        "current_location" => entry.location = Some(value.to_string()),
        "picture_keyword" => entry.pickeyword = Some(value.to_string()),
        "taglist" => {
            entry.taglist = value
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
        }
        "opt_preformatted" => entry.preformatted = parse_flag(name, value)?,
        "opt_backdated" => entry.backdated = parse_flag(name, value)?,
        "opt_nocomments" => {
            if parse_flag(name, value)? {
                entry.comments = CommentPolicy::None;
            }
        }
        "opt_noemail" => {
            if parse_flag(name, value)? && entry.comments == CommentPolicy::Normal {
                entry.comments = CommentPolicy::NoEmail;
            }
        }
        "opt_screening" => {
            entry.screening = parse_screening_code(value).ok_or_else(|| malformed(name, value))?;
        }
        _ => return Err(malformed(name, value)),
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> ClientResult<bool> {
    match value.trim() {
        "1" => Ok(true),
        "0" | "" => Ok(false),
        _ => Err(malformed(name, value)),
    }
}

fn screening_code(screening: Screening) -> Option<&'static str> {
    match screening {
        Screening::Default => None,
        Screening::All => Some("A"),
        Screening::Anonymous => Some("R"),
        Screening::NonFriends => Some("F"),
        Screening::None => Some("N"),
    }
}

fn parse_screening_code(value: &str) -> Option<Screening> {
    match value.trim() {
        "" => Some(Screening::Default),
        "A" => Some(Screening::All),
        "R" => Some(Screening::Anonymous),
        "F" => Some(Screening::NonFriends),
        "N" => Some(Screening::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteEntry;
    use crate::client::journal_client::ClientError;
    use crate::model::entry::{CommentPolicy, Entry, Screening, Security};
    use chrono::{TimeZone, Utc};

    fn fetched(props: &[(&str, &str)]) -> RemoteEntry {
        RemoteEntry {
            itemid: Some(12),
            anum: Some(200),
            eventtime: "2009-01-01 12:30:00".to_string(),
            subject: Some("hello".to_string()),
            event: "<b>body</b>".to_string(),
            security: None,
            allowmask: None,
            props: props
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    #[test]
    fn mood_is_kept_as_text() {
        let entry = fetched(&[("current_mood", "42 and sleepy")])
            .into_entry(true)
            .unwrap();
        assert_eq!(entry.mood.as_deref(), Some("42 and sleepy"));
    }

    #[test]
    fn decodes_props_and_time() {
        let entry = fetched(&[
            ("taglist", "rust, lj ,, notes"),
            ("opt_preformatted", "1"),
            ("opt_nocomments", "1"),
            ("opt_noemail", "1"),
            ("opt_screening", "F"),
            ("picture_keyword", "default"),
        ])
        .into_entry(true)
        .unwrap();

        assert_eq!(entry.id(), Some(12));
        assert_eq!(entry.tags(), ["rust", "lj", "notes"]);
        assert!(entry.preformatted);
        assert_eq!(entry.comments, CommentPolicy::None);
        assert_eq!(entry.screening, Screening::NonFriends);
        assert_eq!(entry.pickeyword.as_deref(), Some("default"));
        assert_eq!(
            entry.time,
            Some(Utc.with_ymd_and_hms(2009, 1, 1, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn strict_decoding_rejects_unknown_props() {
        let err = fetched(&[("unknown_prop", "x")])
            .into_entry(true)
            .unwrap_err();
        assert!(matches!(err, ClientError::MalformedField { ref field, .. } if field == "unknown_prop"));
    }

    #[test]
    fn lenient_decoding_skips_bad_fields() {
        let mut record = fetched(&[
            ("unknown_prop", "x"),
            ("opt_backdated", "maybe"),
            ("current_music", "Low"),
        ]);
        record.eventtime = "last tuesday".to_string();

        let entry = record.into_entry(false).unwrap();
        assert_eq!(entry.music.as_deref(), Some("Low"));
        assert!(!entry.backdated);
        assert_eq!(entry.time, None);
        assert_eq!(entry.body(), "<b>body</b>");
    }

    #[test]
    fn usemask_distinguishes_friends_from_custom() {
        let mut record = fetched(&[]);
        record.security = Some("usemask".to_string());
        record.allowmask = Some("1".to_string());
        assert_eq!(
            record.clone().into_entry(true).unwrap().security,
            Security::Friends
        );

        record.allowmask = Some("6".to_string());
        let entry = record.into_entry(true).unwrap();
        assert_eq!(entry.security, Security::Custom);
        assert_eq!(entry.allowmask, Some(6));
    }

    #[test]
    fn encoding_uses_remote_names() {
        let mut entry = Entry::with_id(4);
        entry.set_body("text");
        entry.set_tags(["a", "b"]);
        entry.time = Some(Utc.with_ymd_and_hms(2010, 5, 6, 7, 8, 9).unwrap());
        entry.mood = Some("happy".to_string());
        entry.security = Security::Friends;
        entry.comments = CommentPolicy::NoEmail;
        entry.screening = Screening::All;
        entry.backdated = true;

        let record = RemoteEntry::from_entry(&entry).unwrap();
        assert_eq!(record.eventtime, "2010-05-06 07:08:09");
        assert_eq!(record.security.as_deref(), Some("usemask"));
        assert_eq!(record.allowmask.as_deref(), Some("1"));
        assert_eq!(record.props["taglist"], "a, b");
        assert_eq!(record.props["current_mood"], "happy");
        assert_eq!(record.props["opt_noemail"], "1");
        assert_eq!(record.props["opt_screening"], "A");
        assert_eq!(record.props["opt_backdated"], "1");
        assert!(!record.props.contains_key("opt_preformatted"));

        assert_eq!(record.into_entry(true).unwrap(), entry);
    }

    #[test]
    fn encoding_requires_time() {
        let err = RemoteEntry::from_entry(&Entry::new()).unwrap_err();
        assert!(matches!(err, ClientError::MissingField("eventtime")));
    }
}
