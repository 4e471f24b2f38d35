//! Error type shared by the Jot crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the root folder or database directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tags could not be encoded for storage
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Note {0} not found")]
    NoteNotFound(i64),

    /// Rejected user input; the message is shown to API clients as is
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored row no longer decodes into a `Note`
    #[error("Corrupt note row: {0}")]
    CorruptRow(String),
}
