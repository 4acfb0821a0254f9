//! Embedded SQLite store.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, InterruptHandle};
use serde_json::{Number, Value};

use super::{Rows, Storage, StorageError, StorageResult};
use crate::sql::Dialect;

/// SQLite-backed [`Storage`].
///
/// Queries run on tokio's blocking pool so callers can abandon them with a
/// deadline. An abandoned query is interrupted; the connection stays usable.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

impl SqliteStorage {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "opening sqlite store");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            interrupt: Arc::new(conn.get_interrupt_handle()),
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a batch of statements, such as schema setup or fixture loading.
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

fn run(conn: &Mutex<Connection>, sql: &str, abandoned: &AtomicBool) -> StorageResult<Rows> {
    let conn = conn.lock().map_err(|_| StorageError::Poisoned)?;
    // An interrupt sent before the statement starts is lost.
    if abandoned.load(Ordering::Acquire) {
        return Err(StorageError::Abandoned);
    }
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            values.push(to_json(row.get_ref(i)?, name)?);
        }
        rows.push(values);
    }

    Ok(Rows { columns, rows })
}

#[async_trait]
impl Storage for SqliteStorage {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn query(&self, sql: &str) -> StorageResult<Rows> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let abandoned = Arc::new(AtomicBool::new(false));
        let mut guard = InterruptOnDrop {
            handle: Arc::clone(&self.interrupt),
            abandoned: Arc::clone(&abandoned),
            armed: true,
        };
        let rows = tokio::task::spawn_blocking(move || run(&conn, &sql, &abandoned)).await?;
        guard.armed = false;
        rows
    }
}

/// Interrupts the running statement if the query future is dropped early.
struct InterruptOnDrop {
    handle: Arc<InterruptHandle>,
    abandoned: Arc<AtomicBool>,
    armed: bool,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.store(true, Ordering::Release);
            self.handle.interrupt();
        }
    }
}

fn to_json(value: ValueRef<'_>, column: &str) -> StorageResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => {
            return Err(StorageError::UnsupportedValue {
                column: column.to_string(),
            })
        }
    })
}
