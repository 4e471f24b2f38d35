//! Database models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 200;

/// A stored note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub event_date: Option<NaiveDate>,
    #[serde(with = "hhmm")]
    pub event_time: Option<NaiveTime>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert input; position and timestamps are assigned by the database layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
}

/// Partial update
///
/// Outer `None` leaves a field untouched. For `event_date`/`event_time`,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub event_date: Option<Option<NaiveDate>>,
    pub event_time: Option<Option<NaiveTime>>,
    pub position: Option<i64>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply this patch onto a note (timestamps untouched)
    pub fn apply_to(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(tags) = self.tags {
            note.tags = tags;
        }
        if let Some(event_date) = self.event_date {
            note.event_date = event_date;
        }
        if let Some(event_time) = self.event_time {
            note.event_time = event_time;
        }
        if let Some(position) = self.position {
            note.position = position;
        }
    }
}

/// Trim and validate a note title
pub fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidInput(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

/// Serde adapter writing `Option<NaiveTime>` as `HH:MM`
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            NaiveTime::parse_from_str(&s, FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                .map_err(D::Error::custom)
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_note() -> Note {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Note {
            id: 7,
            title: "Dentist".to_string(),
            content: "Bring insurance card".to_string(),
            tags: vec!["health".to_string()],
            event_date: NaiveDate::from_ymd_opt(2026, 3, 5),
            event_time: NaiveTime::from_hms_opt(14, 30, 0),
            position: 2,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_note_json_shape() {
        let value = serde_json::to_value(sample_note()).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["event_date"], "2026-03-05");
        assert_eq!(value["event_time"], "14:30");
        assert_eq!(value["tags"][0], "health");
        assert_eq!(value["position"], 2);
        assert!(value["created_at"].as_str().unwrap().starts_with("2026-03-01T12:00:00"));
    }

    #[test]
    fn test_note_json_nulls() {
        let mut note = sample_note();
        note.event_date = None;
        note.event_time = None;
        let value = serde_json::to_value(&note).unwrap();
        assert!(value["event_date"].is_null());
        assert!(value["event_time"].is_null());

        let back: Note = serde_json::from_value(value).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_patch_apply() {
        let mut note = sample_note();
        let patch = NotePatch {
            title: Some("Dentist (moved)".to_string()),
            event_time: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut note);
        assert_eq!(note.title, "Dentist (moved)");
        assert_eq!(note.event_time, None);
        assert_eq!(note.event_date, NaiveDate::from_ymd_opt(2026, 3, 5));
        assert!(NotePatch::default().is_empty());
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Groceries ").unwrap(), "Groceries");
        assert!(matches!(validate_title("   "), Err(Error::InvalidInput(_))));
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }
}
