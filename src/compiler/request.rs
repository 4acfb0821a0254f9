//! Column requests: the table state flattened into one entry per use of a column.

use super::error::{CompileError, CompileResult};
use crate::params::{ParamKey, ParamValue, Params};
use crate::registry::{self, ColumnDefinition, DataType, RateType};
use crate::table_state::{ColumnSpec, FilterOperator, FilterValue, TableState, ValueArity};

/// One "show, filter or sort by column X with parameters P".
#[derive(Debug, Clone)]
pub struct ColumnRequest {
    pub column_id: String,
    pub definition: &'static ColumnDefinition,
    /// Request parameters without `rate_type`.
    pub params: Params,
    pub rate_type: Option<RateType>,
    /// Position of the request in the table state; orders table groups.
    pub seq: usize,
}

impl ColumnRequest {
    pub fn new(column_id: &str, params: &Params, seq: usize) -> CompileResult<Self> {
        let definition = registry::lookup(column_id)
            .ok_or_else(|| CompileError::UnknownColumn(column_id.to_string()))?;

        let mut params = params.clone();
        let rate_type = match params.remove(ParamKey::RateType) {
            None => None,
            Some(value) => Some(parse_rate_type(definition, &value)?),
        };

        Ok(Self {
            column_id: definition.id.to_string(),
            definition,
            params,
            rate_type,
            seq,
        })
    }
}

fn parse_rate_type(definition: &ColumnDefinition, value: &ParamValue) -> CompileResult<RateType> {
    let name = value
        .as_scalar()
        .and_then(|s| s.as_str())
        .ok_or_else(|| CompileError::InvalidParameter {
            column_id: definition.id.to_string(),
            key: ParamKey::RateType,
            message: "rate_type must be a single string".into(),
        })?;

    let rate_type = name
        .parse::<RateType>()
        .map_err(|_| CompileError::UnknownRateType {
            column_id: definition.id.to_string(),
            rate_type: name.to_string(),
        })?;

    if !definition.supports_rate(rate_type) {
        return Err(CompileError::UnsupportedRateType {
            column_id: definition.id.to_string(),
            rate_type,
        });
    }
    Ok(rate_type)
}

/// A requested output column.
#[derive(Debug, Clone)]
pub struct SelectRequest {
    pub request: ColumnRequest,
    /// How many earlier selects share this column identifier.
    pub occurrence: usize,
}

impl SelectRequest {
    /// Output column name, `{column_id}_{occurrence}`.
    pub fn output_name(&self) -> String {
        format!("{}_{}", self.request.column_id, self.occurrence)
    }
}

/// A filter clause bound to its column.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub request: ColumnRequest,
    pub clause_index: usize,
    pub operator: FilterOperator,
    pub value: Option<FilterValue>,
}

impl FilterRequest {
    /// Whether the filter can drop entities that have no matching row.
    pub fn restricts(&self) -> bool {
        !self.operator.matches_missing()
    }
}

/// Every request of a table state, in table-state order.
#[derive(Debug, Clone, Default)]
pub struct Requests {
    pub selects: Vec<SelectRequest>,
    pub filters: Vec<FilterRequest>,
    next_seq: usize,
}

impl Requests {
    /// Flatten `prefix_columns`, `columns` and `where` into requests.
    pub fn expand(state: &TableState) -> CompileResult<Self> {
        let mut requests = Requests::default();

        for spec in state.prefix_columns.iter().chain(&state.columns) {
            requests.push_select(spec)?;
        }

        for (clause_index, clause) in state.filters.iter().enumerate() {
            let request = ColumnRequest::new(&clause.column_id, &clause.params, requests.seq())?;
            check_operator(request.definition, clause.operator)?;
            requests.filters.push(FilterRequest {
                request,
                clause_index,
                operator: clause.operator,
                value: clause.value.clone(),
            });
        }

        Ok(requests)
    }

    /// Append a select, numbering its occurrence.
    pub fn push_select(&mut self, spec: &ColumnSpec) -> CompileResult<&SelectRequest> {
        let request = ColumnRequest::new(&spec.column_id, &spec.params, self.seq())?;
        let occurrence = self.occurrences(&request.column_id);
        self.selects.push(SelectRequest {
            request,
            occurrence,
        });
        let last = self.selects.len() - 1;
        Ok(&self.selects[last])
    }

    /// Index into `selects` of a column occurrence.
    pub fn find_select(&self, column_id: &str, occurrence: usize) -> Option<usize> {
        self.selects
            .iter()
            .position(|s| s.request.column_id == column_id && s.occurrence == occurrence)
    }

    pub fn occurrences(&self, column_id: &str) -> usize {
        self.selects
            .iter()
            .filter(|s| s.request.column_id == column_id)
            .count()
    }

    fn seq(&mut self) -> usize {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

fn check_operator(definition: &ColumnDefinition, operator: FilterOperator) -> CompileResult<()> {
    if operator.arity() == ValueArity::Pattern && definition.data_type != DataType::Text {
        return Err(CompileError::UnsupportedOperator {
            column_id: definition.id.to_string(),
            operator: operator.to_string(),
            data_type: definition.data_type.to_string(),
        });
    }
    Ok(())
}
