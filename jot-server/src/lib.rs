//! jot-server library - note HTTP API
//!
//! Exposes the router and state so integration tests can drive the API
//! without binding a socket.

use std::sync::Arc;

use axum::Router;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod llm;

pub use crate::error::{ApiError, ApiResult};
use crate::llm::LlmProvider;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Chat completion provider; None when no token is configured
    pub llm: Option<Arc<dyn LlmProvider>>,
    /// Fixed "today" for relative date resolution (tests)
    today: Option<NaiveDate>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            db,
            llm,
            today: None,
        }
    }

    /// Pin the date used to resolve phrases like "tomorrow"
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Local date used to resolve relative phrases
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, patch, post};

    let notes = Router::new()
        .route("/api/notes", get(api::list_notes).post(api::create_note))
        .route("/api/notes/search", get(api::search_notes))
        .route("/api/notes/reorder", patch(api::reorder_notes))
        .route("/api/notes/extract", post(api::extract_note))
        .route("/api/notes/generate", post(api::generate_note))
        .route(
            "/api/notes/:id",
            get(api::get_note)
                .put(api::update_note)
                .delete(api::delete_note),
        )
        .route("/api/notes/:id/translate", post(api::translate_note));

    Router::new()
        .merge(notes)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
