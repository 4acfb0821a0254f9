//! Sort and pagination resolution.

use super::error::{CompileError, CompileResult};
use super::request::Requests;
use crate::sql::{lit_int, OrderByExpr};
use crate::table_state::{ColumnSpec, Limits, SortClause};

/// Add columns referenced only by sort clauses to the select list.
///
/// A sort on a column that was never requested adds it (with the clause's
/// parameters) when it names occurrence 0; any other missing occurrence is
/// an error.
pub fn append_sort_columns(sort: &[SortClause], requests: &mut Requests) -> CompileResult<()> {
    for clause in sort {
        if requests
            .find_select(&clause.column_id, clause.column_index)
            .is_some()
        {
            continue;
        }
        if clause.column_index == 0 && requests.occurrences(&clause.column_id) == 0 {
            let spec = ColumnSpec::new(&clause.column_id).with_params(clause.params.clone());
            requests.push_select(&spec)?;
            continue;
        }
        return Err(CompileError::UnknownSortOccurrence {
            column_id: clause.column_id.clone(),
            occurrence: clause.column_index,
        });
    }
    Ok(())
}

/// ORDER BY terms over select ordinals.
///
/// `leading` is the number of select positions before the first requested
/// column: the entity key followed by one column per split dimension.
/// Sorted terms come first; the entity key and splits break ties so
/// pagination is stable.
pub fn order_by(
    sort: &[SortClause],
    requests: &Requests,
    leading: usize,
) -> CompileResult<Vec<OrderByExpr>> {
    let mut terms = Vec::with_capacity(sort.len() + leading);

    for clause in sort {
        let index = requests
            .find_select(&clause.column_id, clause.column_index)
            .ok_or_else(|| CompileError::UnknownSortOccurrence {
                column_id: clause.column_id.clone(),
                occurrence: clause.column_index,
            })?;
        let ordinal = lit_int((leading + index + 1) as i64);
        let term = if clause.desc {
            OrderByExpr::desc(ordinal)
        } else {
            OrderByExpr::asc(ordinal)
        };
        terms.push(term.nulls_last());
    }

    for position in 1..=leading {
        terms.push(OrderByExpr::asc(lit_int(position as i64)).nulls_last());
    }

    Ok(terms)
}

/// Effective (limit, offset) of a request.
pub fn pagination(limit: Option<u64>, offset: u64, limits: &Limits) -> (u64, u64) {
    (limit.unwrap_or(limits.default_limit), offset)
}
