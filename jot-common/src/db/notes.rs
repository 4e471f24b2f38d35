//! Note persistence
//!
//! All listings share one ordering: `position ASC, updated_at DESC`.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info};

use super::models::{hhmm, NewNote, Note, NotePatch};
use crate::{Error, Result};

const SELECT_COLUMNS: &str =
    "SELECT id, title, content, tags, event_date, event_time, position, created_at, updated_at FROM notes";

const ORDER_CLAUSE: &str = "ORDER BY position ASC, updated_at DESC";

/// Load all notes in display order
pub async fn list_notes(pool: &SqlitePool) -> Result<Vec<Note>> {
    let rows = sqlx::query(&format!("{} {}", SELECT_COLUMNS, ORDER_CLAUSE))
        .fetch_all(pool)
        .await?;

    rows.iter().map(note_from_row).collect()
}

/// Load one note by id
pub async fn get_note(pool: &SqlitePool, id: i64) -> Result<Option<Note>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(note_from_row).transpose()
}

/// Load one note by id, treating a miss as an error
pub async fn require_note(pool: &SqlitePool, id: i64) -> Result<Note> {
    get_note(pool, id).await?.ok_or(Error::NoteNotFound(id))
}

/// Insert a note at the end of the display order
///
/// The next position is computed inside the same transaction as the insert.
pub async fn insert_note(pool: &SqlitePool, note: NewNote) -> Result<Note> {
    let mut tx = pool.begin().await?;

    let max_position: Option<i64> = sqlx::query_scalar("SELECT MAX(position) FROM notes")
        .fetch_one(&mut *tx)
        .await?;
    let position = max_position.map(|p| p + 1).unwrap_or(0);

    let now = timestamp(Utc::now());
    let result = sqlx::query(
        r#"
        INSERT INTO notes (title, content, tags, event_date, event_time, position, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&note.title)
    .bind(&note.content)
    .bind(encode_tags(&note.tags)?)
    .bind(note.event_date.map(format_date))
    .bind(note.event_time.map(format_time))
    .bind(position)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let id = result.last_insert_rowid();
    info!(note_id = id, position, "Created note");

    get_note(pool, id)
        .await?
        .ok_or(Error::NoteNotFound(id))
}

/// Apply a partial update; returns None when the note does not exist
pub async fn update_note(pool: &SqlitePool, id: i64, patch: NotePatch) -> Result<Option<Note>> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let mut note = match row.as_ref().map(note_from_row).transpose()? {
        Some(note) => note,
        None => return Ok(None),
    };

    patch.apply_to(&mut note);
    // Stored timestamps carry microseconds; keep the returned note identical
    note.updated_at = Utc::now().trunc_subsecs(6);

    sqlx::query(
        r#"
        UPDATE notes
        SET title = ?, content = ?, tags = ?, event_date = ?, event_time = ?, position = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&note.title)
    .bind(&note.content)
    .bind(encode_tags(&note.tags)?)
    .bind(note.event_date.map(format_date))
    .bind(note.event_time.map(format_time))
    .bind(note.position)
    .bind(timestamp(note.updated_at))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(note_id = id, "Updated note");
    Ok(Some(note))
}

/// Delete a note; returns whether a row was removed
pub async fn delete_note(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        info!(note_id = id, "Deleted note");
    }
    Ok(deleted)
}

/// Case-insensitive substring search over title and content
pub async fn search_notes(pool: &SqlitePool, query: &str) -> Result<Vec<Note>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(query));
    let rows = sqlx::query(&format!(
        "{} WHERE title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\' {}",
        SELECT_COLUMNS, ORDER_CLAUSE
    ))
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    rows.iter().map(note_from_row).collect()
}

/// Set each listed note's position to its index in `order`
///
/// Every id must exist and appear once. Either all positions change or none do.
pub async fn reorder_notes(pool: &SqlitePool, order: &[i64]) -> Result<()> {
    if order.is_empty() {
        return Err(Error::InvalidInput("Order list cannot be empty".to_string()));
    }

    let distinct: HashSet<i64> = order.iter().copied().collect();
    if distinct.len() != order.len() {
        return Err(invalid_ids());
    }

    let mut tx = pool.begin().await?;

    for (position, id) in order.iter().enumerate() {
        let result = sqlx::query("UPDATE notes SET position = ? WHERE id = ?")
            .bind(position as i64)
            .bind(*id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the positions written so far
            return Err(invalid_ids());
        }
    }

    tx.commit().await?;

    info!(count = order.len(), "Reordered notes");
    Ok(())
}

fn invalid_ids() -> Error {
    Error::InvalidInput("One or more note IDs are invalid".to_string())
}

/// Escape LIKE wildcards so user input matches literally
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(hhmm::FORMAT).to_string()
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode_tags(tags: &[String]) -> Result<String> {
    Ok(serde_json::to_string(tags)?)
}

fn note_from_row(row: &SqliteRow) -> Result<Note> {
    let tags: String = row.try_get("tags")?;
    let event_date: Option<String> = row.try_get("event_date")?;
    let event_time: Option<String> = row.try_get("event_time")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| Error::CorruptRow(format!("tags column: {}", e)))?,
        event_date: event_date
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| Error::CorruptRow(format!("event_date column: {}", e)))?,
        event_time: event_time
            .map(|s| NaiveTime::parse_from_str(&s, hhmm::FORMAT))
            .transpose()
            .map_err(|e| Error::CorruptRow(format!("event_time column: {}", e)))?,
        position: row.try_get("position")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRow(format!("timestamp '{}': {}", raw, e)))
}
