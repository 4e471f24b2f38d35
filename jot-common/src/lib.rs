//! # Jot Common Library
//!
//! Shared code for the Jot note service including:
//! - Database initialization and note queries
//! - Configuration loading and root folder resolution
//! - Natural-language date/time normalization
//! - Lenient extraction of JSON payloads from LLM output

pub mod config;
pub mod db;
pub mod error;
pub mod natural_time;
pub mod payload;

pub use error::{Error, Result};
pub use payload::NoteDraft;
