//! Note CRUD, search and reorder endpoints
//!
//! Bodies are taken as raw JSON values so that every validation failure is
//! reported with the same `{"error": ...}` shape.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use jot_common::db::{self, validate_title, NewNote, Note, NotePatch};
use jot_common::natural_time::{parse_date, parse_time};
use jot_common::payload::normalize_tags;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// Query parameters for note search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring matched against title and content
    pub q: Option<String>,
}

/// GET /api/notes
pub async fn list_notes(State(state): State<AppState>) -> ApiResult<Json<Vec<Note>>> {
    Ok(Json(db::list_notes(&state.db).await?))
}

/// POST /api/notes
///
/// Requires string `title` and `content`. Optional `tags` (list or
/// comma-separated string), `event_date` and `event_time` (free-form,
/// normalized before storage).
pub async fn create_note(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let body = json_object(body)
        .ok_or_else(|| ApiError::BadRequest("Title and content are required".to_string()))?;

    let (Some(title), Some(content)) = (
        body.get("title").and_then(Value::as_str),
        body.get("content").and_then(Value::as_str),
    ) else {
        return Err(ApiError::BadRequest(
            "Title and content are required".to_string(),
        ));
    };

    let today = state.today();
    let new_note = NewNote {
        title: validate_title(title)?,
        content: content.to_string(),
        tags: tags_field(&body)?.unwrap_or_default(),
        event_date: date_field(&body, today)?.flatten(),
        event_time: time_field(&body)?.flatten(),
    };

    let note = db::insert_note(&state.db, new_note).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes/:id
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = note_id(&id)?;
    Ok(Json(db::require_note(&state.db, id).await?))
}

/// PUT /api/notes/:id
///
/// Partial update: only the keys present in the body are changed. A `null`
/// `event_date` or `event_time` clears the value. An unknown id is a 404
/// whatever the body holds.
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Note>> {
    let id = note_id(&id)?;
    db::require_note(&state.db, id).await?;

    let body = json_object(body)
        .filter(|map| !map.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No data provided".to_string()))?;

    let mut patch = NotePatch {
        content: body
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string),
        tags: tags_field(&body)?,
        event_date: date_field(&body, state.today())?,
        event_time: time_field(&body)?,
        position: body.get("position").and_then(Value::as_i64),
        ..Default::default()
    };
    if let Some(title) = body.get("title").and_then(Value::as_str) {
        patch.title = Some(validate_title(title)?);
    }

    db::update_note(&state.db, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| jot_common::Error::NoteNotFound(id).into())
}

/// DELETE /api/notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = note_id(&id)?;
    if db::delete_note(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(jot_common::Error::NoteNotFound(id).into())
    }
}

/// GET /api/notes/search?q=
///
/// A missing or blank query yields an empty list; otherwise the query is
/// matched as given, surrounding spaces included.
pub async fn search_notes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Note>>> {
    match query.q {
        Some(q) if !q.trim().is_empty() => Ok(Json(db::search_notes(&state.db, &q).await?)),
        _ => Ok(Json(Vec::new())),
    }
}

/// PATCH /api/notes/reorder
///
/// Body `{"order": [id, ...]}`; position `i` goes to the `i`-th id.
pub async fn reorder_notes(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let order = json_object(body)
        .and_then(|mut map| map.remove("order"))
        .and_then(|value| match value {
            Value::Array(items) => Some(items),
            _ => None,
        })
        .ok_or_else(|| {
            ApiError::BadRequest(r#"Request body must include an "order" list"#.to_string())
        })?;

    let ids = order
        .iter()
        .map(Value::as_i64)
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(|| ApiError::BadRequest("One or more note IDs are invalid".to_string()))?;

    db::reorder_notes(&state.db, &ids).await?;
    info!(count = ids.len(), "Reordered notes via API");

    Ok(Json(json!({ "status": "success" })))
}

/// Body as a JSON object, if it is one
pub(crate) fn json_object(body: Option<Json<Value>>) -> Option<Map<String, Value>> {
    match body {
        Some(Json(Value::Object(map))) => Some(map),
        _ => None,
    }
}

/// Path ids that are not integers are treated like unknown notes
pub(crate) fn note_id(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Note not found".to_string()))
}

/// `tags` key: absent → None, null → empty list
fn tags_field(body: &Map<String, Value>) -> ApiResult<Option<Vec<String>>> {
    match body.get("tags") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(Vec::new())),
        Some(value @ (Value::Array(_) | Value::String(_))) => Ok(Some(normalize_tags(value))),
        Some(_) => Err(ApiError::BadRequest(
            "Tags must be a list or a comma-separated string".to_string(),
        )),
    }
}

/// `event_date` key: absent → None, null or blank → Some(None)
fn date_field(
    body: &Map<String, Value>,
    today: NaiveDate,
) -> ApiResult<Option<Option<NaiveDate>>> {
    optional_field(body, "event_date", |raw| parse_date(raw, today))
}

/// `event_time` key: absent → None, null or blank → Some(None)
fn time_field(body: &Map<String, Value>) -> ApiResult<Option<Option<NaiveTime>>> {
    optional_field(body, "event_time", parse_time)
}

fn optional_field<T>(
    body: &Map<String, Value>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> ApiResult<Option<Option<T>>> {
    match body.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Some(None)),
        Some(Value::String(raw)) => parse(raw)
            .map(|value| Some(Some(value)))
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {}: '{}'", key, raw))),
        Some(other) => Err(ApiError::BadRequest(format!("Invalid {}: {}", key, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_note_id() {
        assert_eq!(note_id("42").unwrap(), 42);
        assert!(matches!(note_id("abc"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_tags_field() {
        assert_eq!(tags_field(&object(json!({}))).unwrap(), None);
        assert_eq!(
            tags_field(&object(json!({"tags": null}))).unwrap(),
            Some(vec![])
        );
        assert_eq!(
            tags_field(&object(json!({"tags": "Work, #urgent"}))).unwrap(),
            Some(vec!["work".to_string(), "urgent".to_string()])
        );
        assert!(tags_field(&object(json!({"tags": 5}))).is_err());
    }

    #[test]
    fn test_date_field() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();

        assert_eq!(date_field(&object(json!({})), today).unwrap(), None);
        assert_eq!(
            date_field(&object(json!({"event_date": null})), today).unwrap(),
            Some(None)
        );
        assert_eq!(
            date_field(&object(json!({"event_date": " "})), today).unwrap(),
            Some(None)
        );
        assert_eq!(
            date_field(&object(json!({"event_date": "tomorrow"})), today).unwrap(),
            Some(NaiveDate::from_ymd_opt(2026, 3, 5))
        );

        let err = date_field(&object(json!({"event_date": "someday"})), today).unwrap_err();
        assert_eq!(err.to_string(), "Invalid event_date: 'someday'");
    }

    #[test]
    fn test_time_field() {
        assert_eq!(
            time_field(&object(json!({"event_time": "3pm"}))).unwrap(),
            Some(NaiveTime::from_hms_opt(15, 0, 0))
        );
        assert!(time_field(&object(json!({"event_time": 1500}))).is_err());
    }
}
