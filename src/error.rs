//! Crate-level error type.

use std::time::Duration;

use crate::compiler::CompileError;
use crate::config::SettingsError;
use crate::storage::StorageError;
use crate::table_state::ValidationErrors;

/// Any failure between receiving a table state and returning rows.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Query failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Query exceeded {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),
}

pub type Result<T> = std::result::Result<T, Error>;
