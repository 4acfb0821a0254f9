//! Storage collaborators that execute compiled statements.
//!
//! The compiler only produces SQL text; a [`Storage`] runs it and hands back
//! rows as JSON values keyed by output column position.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::sql::Dialect;

/// Errors raised while executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage connection is poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported value in column '{column}'")]
    UnsupportedValue { column: String },

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Query abandoned before it started")]
    Abandoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result set of one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as maps from column name to value.
    pub fn to_maps(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

/// A store that can run compiled statements.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Dialect statements must be emitted in.
    fn dialect(&self) -> Dialect;

    /// Run one read-only statement.
    async fn query(&self, sql: &str) -> StorageResult<Rows>;
}
