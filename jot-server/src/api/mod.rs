//! HTTP API handlers for jot-server

pub mod assist;
pub mod health;
pub mod notes;

pub use assist::{extract_note, generate_note, translate_note};
pub use health::health_routes;
pub use notes::{create_note, delete_note, get_note, list_notes, reorder_notes, search_notes, update_note};
