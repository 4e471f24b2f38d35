//! LLM-backed endpoints: natural-language extraction and translation

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jot_common::db::{self, Note};
use jot_common::NoteDraft;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::notes::{json_object, note_id};
use crate::llm::{
    extraction_messages, translation_messages, CompletionParams, LlmError, LlmProvider,
};
use crate::{ApiError, ApiResult, AppState};

/// Translated note fields (not persisted)
#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub id: i64,
    pub language: String,
    pub title: String,
    pub content: String,
}

/// POST /api/notes/extract
///
/// Returns the normalized draft without saving it.
pub async fn extract_note(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<NoteDraft>> {
    let text = required_string(body, "text", "Text is required")?;
    let draft = draft_from_text(&state, &text).await?;
    Ok(Json(draft))
}

/// POST /api/notes/generate
///
/// Extracts a draft and stores it as a new note.
pub async fn generate_note(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let text = required_string(body, "text", "Text is required")?;
    let draft = draft_from_text(&state, &text).await?;
    let note = db::insert_note(&state.db, draft.into_new_note()).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// POST /api/notes/:id/translate
pub async fn translate_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<TranslationResponse>> {
    let id = note_id(&id)?;
    let note = db::require_note(&state.db, id).await?;
    let language = required_string(body, "language", "Language is required")?;
    let llm = provider(&state)?;

    let title = translate(llm.as_ref(), &note.title, &language).await?;
    let content = if note.content.trim().is_empty() {
        note.content
    } else {
        translate(llm.as_ref(), &note.content, &language).await?
    };

    info!(note_id = id, language = %language, "Translated note");

    Ok(Json(TranslationResponse {
        id,
        language,
        title,
        content,
    }))
}

/// Ask the model for note fields, falling back to the raw text
async fn draft_from_text(state: &AppState, text: &str) -> ApiResult<NoteDraft> {
    let llm = provider(state)?;
    let today = state.today();

    let reply = llm
        .complete(&extraction_messages(text, today), &CompletionParams::default())
        .await?;

    let draft = NoteDraft::from_llm_output(&reply, text, today);
    if draft.fallback {
        warn!(
            provider = llm.name(),
            "No JSON object in LLM reply, using the input text as the note"
        );
    }
    Ok(draft)
}

async fn translate(llm: &dyn LlmProvider, text: &str, language: &str) -> ApiResult<String> {
    let reply = llm
        .complete(
            &translation_messages(text, language),
            &CompletionParams::default(),
        )
        .await?;
    Ok(reply.trim().to_string())
}

fn provider(state: &AppState) -> ApiResult<Arc<dyn LlmProvider>> {
    state
        .llm
        .clone()
        .ok_or(ApiError::Llm(LlmError::NotConfigured))
}

/// Trimmed, non-empty string field of a JSON object body
fn required_string(body: Option<Json<Value>>, key: &str, message: &str) -> ApiResult<String> {
    json_object(body)
        .as_ref()
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}
