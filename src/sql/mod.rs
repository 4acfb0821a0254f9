//! SQL generation module.
//!
//! A type-safe SQL builder that renders the compiled analytics query for
//! the storage dialect:
//!
//! - [`query`] - SELECT query builder (CTEs, joins, grouping, ordering)
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, coalesce, col, conjunction, count, count_distinct, count_star, func, lit_bool, lit_float,
    lit_int, lit_null, lit_str, max, min, nullif, star, sum, table_col, BinaryOperator, Expr,
    ExprExt, Literal,
};
pub use query::{
    Cte, Join, JoinType, LimitOffset, NullsOrder, OrderByExpr, Query, SelectExpr, SortDir, TableRef,
};
pub use token::{Token, TokenStream};
