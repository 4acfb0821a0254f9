//! # statline
//!
//! Compiles declarative player-table requests into a single SQL statement
//! for a fantasy football league's analytics store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Table State (JSON request)                  │
//! │  (columns + params, filters, sort, splits, pagination)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [table_state::validate]
//! ┌─────────────────────────────────────────────────────────┐
//! │              TableState (typed, canonical params)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler: registry lookup, grouping,
//!                          │  join planning, splits, rates, sort]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      QueryPlan                           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [QueryEmitter]
//! ┌─────────────────────────────────────────────────────────┐
//! │              SQL (PostgreSQL or SQLite)                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine + storage]
//!                    rows keyed by output column
//! ```

pub mod compile;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod registry;
pub mod sql;
pub mod storage;
pub mod table_state;

pub use error::{Error, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::compile::{compile_json, compile_table_state, CompileOptions, CompileOutput};
    pub use crate::compiler::{CompileError, QueryPlan};
    pub use crate::config::Settings;
    pub use crate::engine::{Engine, QueryOutput};
    pub use crate::error::{Error, Result};
    pub use crate::params::{ParamKey, ParamValue, Params, Scalar};
    pub use crate::registry::{ResolutionContext, SplitDimension};
    pub use crate::sql::Dialect;
    pub use crate::storage::{SqliteStorage, Storage};
    pub use crate::table_state::{validate, Limits, TableState};
}
