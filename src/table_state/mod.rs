//! Table state: the client's declarative description of a stats table.
//!
//! Raw JSON is checked by [`validate`], which reports every violation at
//! once, and becomes a typed [`TableState`] the compiler consumes.

mod error;
mod validate;

pub use error::{FieldPath, PathSegment, ValidationError, ValidationErrors};
pub use validate::validate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::{Params, Scalar};
use crate::registry::SplitDimension;

/// Pagination bounds enforced on every table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Rows returned when the request omits `limit`.
    pub default_limit: u64,
    /// Largest `limit` a request may ask for.
    pub max_limit: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_limit: 500,
            max_limit: 1000,
        }
    }
}

/// A requested output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub column_id: String,
    pub params: Params,
}

impl ColumnSpec {
    pub fn new(column_id: &str) -> Self {
        Self {
            column_id: column_id.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Filter comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Like,
    NotLike,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::IsNull => "IS NULL",
            FilterOperator::IsNotNull => "IS NOT NULL",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
        }
    }

    /// Shape of value the operator takes.
    pub fn arity(&self) -> ValueArity {
        match self {
            FilterOperator::IsNull | FilterOperator::IsNotNull => ValueArity::None,
            FilterOperator::In | FilterOperator::NotIn => ValueArity::List,
            FilterOperator::Like | FilterOperator::NotLike => ValueArity::Pattern,
            _ => ValueArity::Scalar,
        }
    }

    /// Whether the predicate can hold for an entity with no row at all.
    ///
    /// Only `IS NULL` does; every other operator rejects NULL.
    pub fn matches_missing(&self) -> bool {
        matches!(self, FilterOperator::IsNull)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(FilterOperator::Eq),
            "!=" | "<>" => Ok(FilterOperator::Ne),
            ">" => Ok(FilterOperator::Gt),
            ">=" => Ok(FilterOperator::Gte),
            "<" => Ok(FilterOperator::Lt),
            "<=" => Ok(FilterOperator::Lte),
            "IN" => Ok(FilterOperator::In),
            "NOT IN" => Ok(FilterOperator::NotIn),
            "IS NULL" => Ok(FilterOperator::IsNull),
            "IS NOT NULL" => Ok(FilterOperator::IsNotNull),
            "LIKE" => Ok(FilterOperator::Like),
            "NOT LIKE" => Ok(FilterOperator::NotLike),
            _ => Err(format!("unsupported operator '{}'", s)),
        }
    }
}

impl Serialize for FilterOperator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Value shape an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    None,
    Scalar,
    List,
    Pattern,
}

/// A validated filter operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// A filter clause (`where[i]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterClause {
    pub column_id: String,
    pub operator: FilterOperator,
    pub value: Option<FilterValue>,
    pub params: Params,
}

/// A sort clause (`sort[i]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortClause {
    pub column_id: String,
    /// Occurrence of `column_id` among the requested columns.
    pub column_index: usize,
    pub desc: bool,
    /// Parameters used when the sort adds a column of its own.
    pub params: Params,
}

/// A validated table state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableState {
    pub prefix_columns: Vec<ColumnSpec>,
    pub columns: Vec<ColumnSpec>,
    #[serde(rename = "where")]
    pub filters: Vec<FilterClause>,
    pub sort: Vec<SortClause>,
    pub splits: Vec<SplitDimension>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    pub fn prefix_column(mut self, spec: ColumnSpec) -> Self {
        self.prefix_columns.push(spec);
        self
    }

    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn sort_by(mut self, column_id: &str, column_index: usize, desc: bool) -> Self {
        self.sort.push(SortClause {
            column_id: column_id.into(),
            column_index,
            desc,
            params: Params::new(),
        });
        self
    }

    pub fn split(mut self, dim: SplitDimension) -> Self {
        self.splits.push(dim);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}
