//! Tests for note persistence
//!
//! Each test runs against a fresh single-connection in-memory database.

use chrono::{NaiveDate, NaiveTime};
use jot_common::db::{
    create_schema, delete_note, get_note, insert_note, list_notes, reorder_notes, require_note,
    search_notes, update_note, NewNote, NotePatch,
};
use jot_common::Error;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    create_schema(&pool).await.expect("Failed to create schema");
    pool
}

fn new_note(title: &str, content: &str) -> NewNote {
    NewNote {
        title: title.to_string(),
        content: content.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_insert_assigns_sequential_positions() {
    let pool = setup_pool().await;

    let first = insert_note(&pool, new_note("First", "a")).await.unwrap();
    let second = insert_note(&pool, new_note("Second", "b")).await.unwrap();

    assert_eq!(first.position, 0);
    assert_eq!(second.position, 1);
    assert!(second.id > first.id);
    assert_eq!(first.created_at, first.updated_at);
}

#[tokio::test]
async fn test_insert_after_manual_position() {
    let pool = setup_pool().await;

    let note = insert_note(&pool, new_note("A", "")).await.unwrap();
    update_note(&pool, note.id, NotePatch { position: Some(41), ..Default::default() })
        .await
        .unwrap();

    let next = insert_note(&pool, new_note("B", "")).await.unwrap();
    assert_eq!(next.position, 42);
}

#[tokio::test]
async fn test_insert_round_trips_all_fields() {
    let pool = setup_pool().await;

    let created = insert_note(
        &pool,
        NewNote {
            title: "Dentist".to_string(),
            content: "Bring card".to_string(),
            tags: vec!["health".to_string(), "errands".to_string()],
            event_date: NaiveDate::from_ymd_opt(2026, 3, 6),
            event_time: NaiveTime::from_hms_opt(14, 30, 0),
        },
    )
    .await
    .unwrap();

    let loaded = get_note(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.tags, vec!["health", "errands"]);
    assert_eq!(loaded.event_time, NaiveTime::from_hms_opt(14, 30, 0));
}

#[tokio::test]
async fn test_get_missing_note() {
    let pool = setup_pool().await;
    assert!(get_note(&pool, 999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_require_note() {
    let pool = setup_pool().await;
    let note = insert_note(&pool, new_note("Kept", "")).await.unwrap();

    assert_eq!(require_note(&pool, note.id).await.unwrap(), note);

    let missing = require_note(&pool, 999).await;
    assert!(matches!(missing, Err(Error::NoteNotFound(999))));
}

#[tokio::test]
async fn test_list_orders_by_position_then_recency() {
    let pool = setup_pool().await;

    let a = insert_note(&pool, new_note("A", "")).await.unwrap();
    let b = insert_note(&pool, new_note("B", "")).await.unwrap();
    let c = insert_note(&pool, new_note("C", "")).await.unwrap();

    // Give A and C the same position; C updated last so it comes first
    update_note(&pool, a.id, NotePatch { position: Some(5), ..Default::default() })
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    update_note(&pool, c.id, NotePatch { position: Some(5), ..Default::default() })
        .await
        .unwrap();

    let titles: Vec<String> = list_notes(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["B", "C", "A"]);
    assert_eq!(b.position, 1);
}

#[tokio::test]
async fn test_update_patch_semantics() {
    let pool = setup_pool().await;

    let note = insert_note(
        &pool,
        NewNote {
            title: "Call".to_string(),
            content: "mom".to_string(),
            event_date: NaiveDate::from_ymd_opt(2026, 3, 6),
            event_time: NaiveTime::from_hms_opt(9, 0, 0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let updated = update_note(
        &pool,
        note.id,
        NotePatch {
            content: Some("mom and dad".to_string()),
            event_time: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.title, "Call");
    assert_eq!(updated.content, "mom and dad");
    assert_eq!(updated.event_date, NaiveDate::from_ymd_opt(2026, 3, 6));
    assert_eq!(updated.event_time, None);
    assert!(updated.updated_at >= note.updated_at);
    assert_eq!(updated.created_at, note.created_at);

    let reloaded = get_note(&pool, note.id).await.unwrap().unwrap();
    assert_eq!(reloaded, updated);
}

#[tokio::test]
async fn test_update_missing_note() {
    let pool = setup_pool().await;
    let result = update_note(&pool, 404, NotePatch::default()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_note() {
    let pool = setup_pool().await;
    let note = insert_note(&pool, new_note("Temp", "")).await.unwrap();

    assert!(delete_note(&pool, note.id).await.unwrap());
    assert!(!delete_note(&pool, note.id).await.unwrap());
    assert!(get_note(&pool, note.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_title_or_content_case_insensitive() {
    let pool = setup_pool().await;
    insert_note(&pool, new_note("Grocery list", "eggs, milk")).await.unwrap();
    insert_note(&pool, new_note("Work", "email the GROCER")).await.unwrap();
    insert_note(&pool, new_note("Gym", "legs day")).await.unwrap();

    let titles: Vec<String> = search_notes(&pool, "grocer")
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["Grocery list", "Work"]);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let pool = setup_pool().await;
    insert_note(&pool, new_note("Discount", "50% off")).await.unwrap();
    insert_note(&pool, new_note("Other", "500 items")).await.unwrap();
    insert_note(&pool, new_note("snake_case", "")).await.unwrap();
    insert_note(&pool, new_note("snakeXcase", "")).await.unwrap();

    let percent = search_notes(&pool, "50%").await.unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].title, "Discount");

    let underscore = search_notes(&pool, "e_c").await.unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].title, "snake_case");
}

#[tokio::test]
async fn test_search_empty_query() {
    let pool = setup_pool().await;
    insert_note(&pool, new_note("Anything", "")).await.unwrap();
    assert!(search_notes(&pool, "").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reorder_sets_positions() {
    let pool = setup_pool().await;
    let a = insert_note(&pool, new_note("A", "")).await.unwrap();
    let b = insert_note(&pool, new_note("B", "")).await.unwrap();
    let c = insert_note(&pool, new_note("C", "")).await.unwrap();

    reorder_notes(&pool, &[c.id, a.id, b.id]).await.unwrap();

    let notes = list_notes(&pool).await.unwrap();
    let order: Vec<(String, i64)> = notes.into_iter().map(|n| (n.title, n.position)).collect();
    assert_eq!(
        order,
        vec![("C".to_string(), 0), ("A".to_string(), 1), ("B".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_reorder_rejects_unknown_id_atomically() {
    let pool = setup_pool().await;
    let a = insert_note(&pool, new_note("A", "")).await.unwrap();
    let b = insert_note(&pool, new_note("B", "")).await.unwrap();

    let result = reorder_notes(&pool, &[b.id, a.id, 9999]).await;
    assert!(matches!(result, Err(Error::InvalidInput(ref msg)) if msg == "One or more note IDs are invalid"));

    // Positions untouched
    let a_after = get_note(&pool, a.id).await.unwrap().unwrap();
    let b_after = get_note(&pool, b.id).await.unwrap().unwrap();
    assert_eq!(a_after.position, 0);
    assert_eq!(b_after.position, 1);
}

#[tokio::test]
async fn test_reorder_rejects_duplicates_and_empty() {
    let pool = setup_pool().await;
    let a = insert_note(&pool, new_note("A", "")).await.unwrap();

    let dup = reorder_notes(&pool, &[a.id, a.id]).await;
    assert!(matches!(dup, Err(Error::InvalidInput(_))));

    let empty = reorder_notes(&pool, &[]).await;
    assert!(matches!(empty, Err(Error::InvalidInput(ref msg)) if msg == "Order list cannot be empty"));
}
