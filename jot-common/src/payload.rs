//! Best-effort extraction of structured note fields from LLM output
//!
//! Models are asked for a bare JSON object but often wrap it in markdown
//! fences or surround it with prose. [`extract_json_payload`] recovers the
//! object; [`NoteDraft`] turns it into well-formed note fields.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::models::{hhmm, NewNote, MAX_TITLE_LEN};
use crate::natural_time::{parse_date, parse_time};

/// Maximum number of tags kept on a draft
pub const MAX_TAGS: usize = 10;

/// Length of a title derived from the source text
pub const DERIVED_TITLE_LEN: usize = 60;

pub const UNTITLED: &str = "Untitled note";

/// Extract a JSON object from LLM response text.
///
/// Tries, in order:
/// 1. Direct parse (response is pure JSON, or an array led by an object)
/// 2. Fenced ```` ```json ```` or ```` ``` ```` block
/// 3. Each `{` scanned to its matching `}` (string literals honored)
pub fn extract_json_payload(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();

    if let Some(object) = parse_object(trimmed) {
        return Some(object);
    }

    for block in fenced_blocks(trimmed) {
        if let Some(object) = parse_object(block.trim()) {
            return Some(object);
        }
    }

    for (start, _) in trimmed.match_indices('{') {
        let candidate = &trimmed[start..];
        if let Some(end) = matching_brace(candidate) {
            if let Some(object) = parse_object(&candidate[..=end]) {
                return Some(object);
            }
        }
    }

    None
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Contents of each ``` fenced block, language tag removed
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        // Language tag runs to end of line
        let body_start = match after_fence.find('\n') {
            Some(nl) if !after_fence[..nl].contains('{') => nl + 1,
            _ => 0,
        };
        let body = &after_fence[body_start..];
        match body.find("```") {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + 3..];
            }
            None => break,
        }
    }

    blocks
}

/// Byte offset of the `}` closing the `{` at the start of `text`
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Normalized note fields produced from natural-language input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub event_date: Option<NaiveDate>,
    #[serde(serialize_with = "hhmm::serialize")]
    pub event_time: Option<NaiveTime>,
    /// True when nothing usable was extracted and the draft came from the raw text
    pub fallback: bool,
}

impl NoteDraft {
    /// Build a draft from raw model output, falling back to the source text
    pub fn from_llm_output(raw_output: &str, source_text: &str, today: NaiveDate) -> Self {
        match extract_json_payload(raw_output) {
            Some(payload) => Self::from_payload(&payload, source_text, today),
            None => Self::from_source_text(source_text),
        }
    }

    /// Build a draft from an extracted object
    pub fn from_payload(payload: &Map<String, Value>, source_text: &str, today: NaiveDate) -> Self {
        let title = string_field(payload, &["title"])
            .map(|t| truncate_chars(&t, MAX_TITLE_LEN))
            .unwrap_or_else(|| derive_title(source_text));

        let content = string_field(payload, &["content", "body"])
            .unwrap_or_else(|| source_text.trim().to_string());

        let tags = payload.get("tags").map(normalize_tags).unwrap_or_default();

        let event_date = string_field(payload, &["event_date", "date"])
            .and_then(|raw| parse_date(&raw, today));
        let event_time = string_field(payload, &["event_time", "time"])
            .and_then(|raw| parse_time(&raw));

        Self {
            title,
            content,
            tags,
            event_date,
            event_time,
            fallback: false,
        }
    }

    /// Draft holding the source text verbatim
    pub fn from_source_text(source_text: &str) -> Self {
        Self {
            title: derive_title(source_text),
            content: source_text.trim().to_string(),
            tags: Vec::new(),
            event_date: None,
            event_time: None,
            fallback: true,
        }
    }

    pub fn into_new_note(self) -> NewNote {
        NewNote {
            title: self.title,
            content: self.content,
            tags: self.tags,
            event_date: self.event_date,
            event_time: self.event_time,
        }
    }
}

/// First non-empty string among `keys`, trimmed
fn string_field(payload: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accept an array of strings or a comma-separated string
///
/// Tags are trimmed, `#`-stripped, lowercased and deduplicated in order.
pub fn normalize_tags(value: &Value) -> Vec<String> {
    let raw: Vec<&str> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(s) => s.split(',').collect(),
        _ => Vec::new(),
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().trim_start_matches('#').trim().to_lowercase();
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}

/// First non-empty line of the source, shortened
fn derive_title(source_text: &str) -> String {
    source_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, DERIVED_TITLE_LEN))
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect::<String>().trim_end().to_string()
}
