//! End-to-end compilation from table-state JSON to SQL.
//!
//! This module provides the high-level API for compiling table states:
//!
//! ```text
//! JSON → Validate → TableState → Plan → Emit → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use statline::compile::{compile_json, CompileOptions};
//! use statline::sql::Dialect;
//!
//! let state = json!({
//!     "columns": ["player_name", {"column_id": "rush_yards", "params": {"year": 2023}}],
//!     "sort": [{"column_id": "rush_yards", "desc": true}],
//!     "limit": 25
//! });
//!
//! let options = CompileOptions::default().with_dialect(Dialect::Sqlite);
//! let output = compile_json(&state, &options)?;
//! println!("{}", output.sql);
//! ```

use serde_json::Value;

use crate::compiler::{self, CompileResult, OutputColumn, QueryEmitter, QueryPlan};
use crate::config::Settings;
use crate::error::Result;
use crate::registry::ResolutionContext;
use crate::sql::query::Query;
use crate::sql::Dialect;
use crate::table_state::{self, Limits, TableState};

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Defaults for parameters a request leaves unset.
    pub context: ResolutionContext,

    /// Pagination bounds.
    pub limits: Limits,
}

impl CompileOptions {
    /// Options taken from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dialect: settings.query.dialect,
            context: settings.defaults.clone(),
            limits: settings.query.limits(),
        }
    }

    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the resolution context.
    pub fn with_context(mut self, context: ResolutionContext) -> Self {
        self.context = context;
        self
    }

    /// Set the pagination bounds.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a table state to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// The SQL query AST.
    pub query: Query,

    /// The plan the query was rendered from.
    pub plan: QueryPlan,

    /// The dialect used for generation.
    pub dialect: Dialect,
}

impl CompileOutput {
    /// Result columns in select order.
    pub fn output_columns(&self) -> &[OutputColumn] {
        &self.plan.outputs
    }
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile an already validated table state.
pub fn compile_table_state(
    state: &TableState,
    options: &CompileOptions,
) -> CompileResult<CompileOutput> {
    let plan = compiler::compile(state, &options.context, &options.limits)?;
    let emitter = QueryEmitter::new(options.dialect);
    let query = emitter.to_query(&plan);
    let sql = emitter.emit(&plan);

    Ok(CompileOutput {
        sql,
        query,
        plan,
        dialect: options.dialect,
    })
}

/// Validate and compile a raw table-state document.
pub fn compile_json(raw: &Value, options: &CompileOptions) -> Result<CompileOutput> {
    let state = table_state::validate(raw, &options.limits)?;
    Ok(compile_table_state(&state, options)?)
}

/// Parse, validate and compile table-state JSON text.
pub fn compile_str(source: &str, options: &CompileOptions) -> Result<CompileOutput> {
    let raw: Value = serde_json::from_str(source)?;
    compile_json(&raw, options)
}

// ============================================================================
// Tests
// ============================================================================
