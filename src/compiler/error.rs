//! Compilation errors.

use crate::params::ParamKey;
use crate::registry::RateType;

/// Result type for compilation stages.
pub type CompileResult<T> = Result<T, CompileError>;

/// A table state that validated but cannot be compiled.
///
/// Every variant aborts the whole request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// Column identifier not present in the registry.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// `rate_type` names no known rate.
    #[error("column '{column_id}': unknown rate type '{rate_type}'")]
    UnknownRateType { column_id: String, rate_type: String },

    /// The column exists but cannot be normalized by the requested rate.
    #[error("column '{column_id}' does not support rate type '{rate_type}'")]
    UnsupportedRateType {
        column_id: String,
        rate_type: RateType,
    },

    /// A parameter value the column cannot use.
    #[error("column '{column_id}': invalid parameter '{key}': {message}")]
    InvalidParameter {
        column_id: String,
        key: ParamKey,
        message: String,
    },

    /// A parameter combination no row can satisfy.
    #[error("column '{column_id}': parameter '{key}' can never match: {reason}")]
    Unsatisfiable {
        column_id: String,
        key: ParamKey,
        reason: String,
    },

    /// A directly joined column needs a single value so the join cannot fan out.
    #[error(
        "column '{column_id}': parameter '{key}' must be a single value unless split by {key}"
    )]
    AmbiguousParameter { column_id: String, key: ParamKey },

    /// The operator does not apply to the column's data type.
    #[error("column '{column_id}': operator {operator} is not supported on {data_type} columns")]
    UnsupportedOperator {
        column_id: String,
        operator: String,
        data_type: String,
    },

    /// A sort clause names an occurrence that was never requested.
    #[error("sort references occurrence {occurrence} of '{column_id}', which is not requested")]
    UnknownSortOccurrence { column_id: String, occurrence: usize },

    /// Alias digest input could not be serialized.
    #[error("failed to serialize alias key: {0}")]
    AliasKey(String),
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::AliasKey(err.to_string())
    }
}
