//! Query execution facade.
//!
//! Validates, compiles and runs a table state against a [`Storage`],
//! returning rows keyed by output column name.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::compile::{compile_json, CompileOptions, CompileOutput};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Rows produced for one table state.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    /// Output column names in select order.
    pub columns: Vec<String>,
    /// One map per row, keyed by output column name.
    pub rows: Vec<Map<String, Value>>,
    /// The statement that produced the rows.
    pub sql: String,
}

/// Compiles table states and executes them on one store.
pub struct Engine<S> {
    storage: S,
    options: CompileOptions,
    timeout: Option<Duration>,
}

impl<S: Storage> Engine<S> {
    /// An engine emitting in the store's dialect.
    pub fn new(storage: S, options: CompileOptions) -> Self {
        let options = options.with_dialect(storage.dialect());
        Self {
            storage,
            options,
            timeout: None,
        }
    }

    /// An engine configured from settings.
    pub fn from_settings(storage: S, settings: &Settings) -> Self {
        Self::new(storage, CompileOptions::from_settings(settings))
            .with_timeout(settings.query.timeout())
    }

    /// Deadline for executing each statement.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Compile without executing.
    pub fn compile(&self, raw: &Value) -> Result<CompileOutput> {
        compile_json(raw, &self.options)
    }

    /// Validate, compile and run a table state.
    pub async fn execute(&self, raw: &Value) -> Result<QueryOutput> {
        let compiled = self.compile(raw)?;
        let started = Instant::now();

        let rows = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.storage.query(&compiled.sql))
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => self.storage.query(&compiled.sql).await?,
        };

        tracing::info!(
            rows = rows.len(),
            joins = compiled.plan.joins.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "executed table state"
        );

        Ok(QueryOutput {
            columns: compiled.plan.output_names(),
            rows: rows.to_maps(),
            sql: compiled.sql,
        })
    }
}
