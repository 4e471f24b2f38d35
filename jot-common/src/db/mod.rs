//! Database initialization, models and note queries

pub mod init;
pub mod models;
pub mod notes;

pub use init::*;
pub use models::*;
pub use notes::*;
