//! Property bag to entry field mapping.
//!
//! # Responsibility
//! - Resolve caller aliases (`body`, `tags`) onto canonical fields.
//! - Decide the backdated flag against a caller-supplied reference-now.
//! - Coerce times to GMT and type-check every value.
//!
//! # Invariants
//! - A failed apply leaves the entry untouched.
//! - Canonical keys win over their aliases when both are supplied.
//! - Backdating compares the original instant, before GMT coercion.
//! - No I/O happens here.

use crate::error::{TasksError, TasksResult};
use crate::model::entry::{CommentPolicy, Entry, Screening, Security};
use crate::model::property::{Properties, PropertyKey, PropertyValue, BODY_ALIAS, TAGS_ALIAS};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use log::debug;

/// Applies `properties` to `entry`.
///
/// Steps run in a fixed order: backdating, alias resolution, the
/// `preformatted` default, then field assignment in bag order.
///
/// # Errors
/// - `NoSuchProperty` for any key that names no entry field.
/// - `InvalidPropertyValue` for a known key with a value of the wrong shape.
pub fn apply_properties(
    entry: &mut Entry,
    mut properties: Properties,
    reference_now: DateTime<Utc>,
) -> TasksResult<()> {
    let backdated = match properties.get(PropertyKey::Time.as_str()) {
        Some(PropertyValue::Time(time)) => *time != reference_now,
        Some(_) => true,
        None => false,
    };
    if backdated {
        properties.insert(PropertyKey::Backdated.as_str(), true);
    }

    resolve_alias(&mut properties, BODY_ALIAS, PropertyKey::Event);
    resolve_alias(&mut properties, TAGS_ALIAS, PropertyKey::Taglist);

    if properties.contains_key(PropertyKey::Event.as_str())
        && !properties.contains_key(PropertyKey::Preformatted.as_str())
    {
        properties.insert(PropertyKey::Preformatted.as_str(), true);
    }

    let key_count = properties.len();
    let mut staged = entry.clone();
    for (name, value) in properties {
        let Some(key) = PropertyKey::parse(&name) else {
            return Err(TasksError::NoSuchProperty(name));
        };
        assign(&mut staged, key, value)?;
    }
    *entry = staged;

    debug!("event=properties_apply module=mapper status=ok keys={key_count}");
    Ok(())
}

/// Relabels a time's wall-clock fields as GMT.
///
/// The remote service stores wall-clock time literally, so the local
/// reading is kept and only the zone label changes.
pub fn coerce_gmt<Tz: TimeZone>(time: &DateTime<Tz>) -> DateTime<Utc> {
    time.naive_local().and_utc()
}

fn resolve_alias(properties: &mut Properties, alias: &str, canonical: PropertyKey) {
    if let Some(value) = properties.remove(alias) {
        if !properties.contains_key(canonical.as_str()) {
            properties.insert(canonical.as_str(), value);
        }
    }
}

fn assign(entry: &mut Entry, key: PropertyKey, value: PropertyValue) -> TasksResult<()> {
    match key {
        PropertyKey::Subject => entry.subject = Some(text(key, value)?),
        PropertyKey::Event => entry.event = text(key, value)?,
        PropertyKey::Taglist => entry.taglist = tag_list(key, value)?,
        PropertyKey::Time => entry.time = Some(coerce_gmt(&time(key, value)?)),
        PropertyKey::Backdated => entry.backdated = flag(key, value)?,
        PropertyKey::Mood => entry.mood = Some(text(key, value)?),
        PropertyKey::Music => entry.music = Some(text(key, value)?),
        PropertyKey::Location => entry.location = Some(text(key, value)?),
        PropertyKey::Pickeyword => entry.pickeyword = Some(text(key, value)?),
        PropertyKey::Security => {
            entry.security = choice(key, value, Security::parse, Security::NAMES)?;
        }
        PropertyKey::Allowmask => entry.allowmask = Some(mask(key, value)?),
        PropertyKey::Comments => {
            entry.comments = choice(key, value, CommentPolicy::parse, CommentPolicy::NAMES)?;
        }
        PropertyKey::Screening => {
            entry.screening = choice(key, value, Screening::parse, Screening::NAMES)?;
        }
        PropertyKey::Preformatted => entry.preformatted = flag(key, value)?,
    }
    Ok(())
}

fn invalid(key: PropertyKey, expected: impl Into<String>, got: &PropertyValue) -> TasksError {
    TasksError::InvalidPropertyValue {
        key: key.as_str().to_string(),
        expected: format!("{}, got {}", expected.into(), got.kind()),
    }
}

fn text(key: PropertyKey, value: PropertyValue) -> TasksResult<String> {
    match value {
        PropertyValue::Text(text) => Ok(text),
        other => Err(invalid(key, "text", &other)),
    }
}

fn tag_list(key: PropertyKey, value: PropertyValue) -> TasksResult<Vec<String>> {
    match value {
        PropertyValue::List(tags) => Ok(tags),
        PropertyValue::Text(text) => Ok(text
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()),
        other => Err(invalid(key, "a list of tags", &other)),
    }
}

fn time(key: PropertyKey, value: PropertyValue) -> TasksResult<DateTime<FixedOffset>> {
    match value {
        PropertyValue::Time(time) => Ok(time),
        other => Err(invalid(key, "a timestamp", &other)),
    }
}

fn flag(key: PropertyKey, value: PropertyValue) -> TasksResult<bool> {
    match value {
        PropertyValue::Bool(flag) => Ok(flag),
        other => Err(invalid(key, "a boolean", &other)),
    }
}

fn mask(key: PropertyKey, value: PropertyValue) -> TasksResult<u32> {
    match value {
        PropertyValue::Integer(mask) => {
            u32::try_from(mask).map_err(|_| invalid(key, "an integer in 0..=4294967295", &value))
        }
        other => Err(invalid(key, "an integer", &other)),
    }
}

fn choice<T>(
    key: PropertyKey,
    value: PropertyValue,
    parse: fn(&str) -> Option<T>,
    names: &[&str],
) -> TasksResult<T> {
    let expected = || format!("one of {}", names.join("|"));
    match &value {
        PropertyValue::Text(text) => parse(text).ok_or_else(|| {
            TasksError::InvalidPropertyValue {
                key: key.as_str().to_string(),
                expected: format!("{}, got `{text}`", expected()),
            }
        }),
        other => Err(invalid(key, expected(), other)),
    }
}
