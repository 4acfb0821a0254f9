//! Parameter resolution against a relation.
//!
//! Strips parameters the relation does not understand, applies context
//! defaults and folds `year_offset` into `year` when results are not split
//! by year. The output is what the alias digest and the row-level
//! predicates are computed from.

use super::error::{CompileError, CompileResult};
use crate::params::{ParamKey, ParamValue, Params, Scalar};
use crate::registry::{Relation, ResolutionContext, SplitDimension, WeekDefault};

/// Resolve request parameters for `relation`.
///
/// `splits` are the requested split dimensions the relation supports.
pub fn resolve_params(
    column_id: &str,
    relation: &Relation,
    raw: &Params,
    splits: &[SplitDimension],
    ctx: &ResolutionContext,
) -> CompileResult<Params> {
    let mut params = raw.clone();
    params.retain(|key| relation.accepts(key));

    if relation.year_column.is_some() {
        let offset = year_offset(column_id, params.remove(ParamKey::YearOffset))?;
        let split_by_year = splits.contains(&SplitDimension::Year);

        let out_of_range = || CompileError::InvalidParameter {
            column_id: column_id.to_string(),
            key: ParamKey::YearOffset,
            message: format!("year_offset {} moves the year out of range", offset),
        };
        match params.remove(ParamKey::Year) {
            Some(year) => {
                let shifted = offset
                    .checked_neg()
                    .and_then(|delta| year.shifted(delta))
                    .ok_or_else(out_of_range)?;
                params.insert(ParamKey::Year, shifted);
            }
            None if !split_by_year => {
                let year = ctx.year.checked_sub(offset).ok_or_else(out_of_range)?;
                params.insert(ParamKey::Year, Scalar::Int(year));
            }
            None => {}
        }
        if split_by_year && offset != 0 {
            params.insert(ParamKey::YearOffset, Scalar::Int(offset));
        }
    }

    if relation.week_column.is_some()
        && !params.contains(ParamKey::Week)
        && !splits.contains(&SplitDimension::Week)
    {
        match relation.week_default {
            WeekDefault::AllWeeks => {}
            WeekDefault::Fixed(week) => {
                params.insert(ParamKey::Week, Scalar::Int(week));
            }
            WeekDefault::Current => {
                params.insert(ParamKey::Week, Scalar::Int(ctx.week));
            }
        }
    }

    for param in relation.params {
        if !params.contains(param.key) {
            if let Some(value) = ctx.default_for(param.default) {
                params.insert(param.key, value);
            }
        }
    }

    for (key, value) in params.iter() {
        if let Some(reason) = value.unsatisfiable() {
            return Err(CompileError::Unsatisfiable {
                column_id: column_id.to_string(),
                key,
                reason,
            });
        }
    }

    Ok(params)
}

fn year_offset(column_id: &str, value: Option<ParamValue>) -> CompileResult<i64> {
    match value {
        None => Ok(0),
        Some(v) => v.as_i64().ok_or_else(|| CompileError::InvalidParameter {
            column_id: column_id.to_string(),
            key: ParamKey::YearOffset,
            message: "year_offset must be a single integer".into(),
        }),
    }
}

/// Reject multi-valued parameters on a directly joined relation.
///
/// A direct join matches rows one-to-one per entity and split key; a list
/// or range on any other column would multiply result rows.
pub fn require_single_values(
    column_id: &str,
    params: &Params,
    splits: &[SplitDimension],
) -> CompileResult<()> {
    for (key, value) in params.iter() {
        let split = match key {
            ParamKey::Year => splits.contains(&SplitDimension::Year),
            ParamKey::Week => splits.contains(&SplitDimension::Week),
            _ => false,
        };
        if !split && value.as_scalar().is_none() {
            return Err(CompileError::AmbiguousParameter {
                column_id: column_id.to_string(),
                key,
            });
        }
    }
    Ok(())
}
