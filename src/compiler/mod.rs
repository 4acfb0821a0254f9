//! Table-state compiler.
//!
//! Compiles a validated [`TableState`] into one relational statement:
//!
//! ```text
//! TableState
//!     │  Requests::expand          one request per column use
//!     ▼
//! Grouper                          requests clustered by table alias
//!     │
//!     ▼
//! QueryPlanner                     join order, pre-aggregations,
//!     │                            split correlation, rate denominators,
//!     ▼                            ordering, pagination
//! QueryPlan
//!     │  QueryEmitter
//!     ▼
//! SQL (WITH stages, main query over `player`)
//! ```
//!
//! Compilation is synchronous and stateless apart from the read-only
//! column registry.

mod alias;
mod emitter;
mod error;
mod grouper;
mod plan;
mod planner;
mod rate;
mod request;
mod resolve;
mod sort;
mod splits;

pub use alias::AliasKey;
pub use emitter::QueryEmitter;
pub use error::{CompileError, CompileResult};
pub use grouper::{GroupSource, TableGroup, DENOMINATOR_COLUMN};
pub use plan::{OutputColumn, OutputKind, PlannedJoin, PreAggregation, QueryPlan};
pub use planner::QueryPlanner;

use crate::registry::ResolutionContext;
use crate::table_state::{Limits, TableState};

/// Plan a table state.
pub fn compile(
    state: &TableState,
    ctx: &ResolutionContext,
    limits: &Limits,
) -> CompileResult<QueryPlan> {
    QueryPlanner::new(ctx, limits).plan(state)
}
