//! Schema validation of raw table-state JSON.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::{
    ColumnSpec, FieldPath, FilterClause, FilterOperator, FilterValue, Limits, SortClause,
    TableState, ValidationError, ValidationErrors, ValueArity,
};
use crate::params::{Params, Scalar};
use crate::registry::SplitDimension;

static COLUMN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

const COLUMN_ID_KEYS: &[&str] = &["column_id", "id"];
const OCCURRENCE_KEYS: &[&str] = &["column_index", "occurrence", "occurrence_index"];
const DESC_KEYS: &[&str] = &["desc", "descending"];

/// Validate a raw table state.
///
/// Pure: returns the typed state, or every violation found, each tagged
/// with the path of the offending value.
pub fn validate(raw: &Value, limits: &Limits) -> Result<TableState, ValidationErrors> {
    let mut errors = Vec::new();
    let root = FieldPath::root();

    let Value::Object(obj) = raw else {
        return Err(ValidationErrors(vec![ValidationError::new(
            root,
            "table state must be a JSON object",
        )]));
    };

    let prefix_columns = validate_columns(obj, "prefix_columns", &mut errors);
    let columns = validate_columns(obj, "columns", &mut errors);
    let filters = validate_filters(obj, &mut errors);
    let sort = validate_sort(obj, &mut errors);
    let splits = validate_splits(obj, &mut errors);
    let offset = validate_offset(obj, &mut errors);
    let limit = validate_limit(obj, limits, &mut errors);

    if errors.is_empty() {
        Ok(TableState {
            prefix_columns,
            columns,
            filters,
            sort,
            splits,
            offset,
            limit,
        })
    } else {
        tracing::warn!(errors = errors.len(), "rejected table state");
        Err(ValidationErrors(errors))
    }
}

/// Array at `key`, treating absent and null as empty.
fn array_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    errors: &mut Vec<ValidationError>,
) -> &'a [Value] {
    match obj.get(key) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(ValidationError::new(
                FieldPath::root().field(key),
                "must be an array",
            ));
            &[]
        }
    }
}

/// First present key among aliases.
fn aliased<'a>(obj: &'a Map<String, Value>, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
}

fn validate_column_id(value: &Value, path: FieldPath, errors: &mut Vec<ValidationError>) -> Option<String> {
    match value {
        Value::String(s) if COLUMN_ID.is_match(s) => Some(s.clone()),
        Value::String(s) if s.is_empty() => {
            errors.push(ValidationError::new(path, "column id must not be empty"));
            None
        }
        Value::String(s) => {
            errors.push(ValidationError::new(
                path,
                format!("column id '{}' must be snake_case", s),
            ));
            None
        }
        _ => {
            errors.push(ValidationError::new(path, "column id must be a string"));
            None
        }
    }
}

fn validate_params(
    obj: &Map<String, Value>,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) -> Params {
    match obj.get("params") {
        None | Some(Value::Null) => Params::new(),
        Some(raw) => match Params::from_json(raw) {
            Ok(params) => params,
            Err(problems) => {
                let params_path = path.field("params");
                for (key, message) in problems {
                    let p = if key.is_empty() {
                        params_path.clone()
                    } else {
                        params_path.field(&key)
                    };
                    errors.push(ValidationError::new(p, message));
                }
                Params::new()
            }
        },
    }
}

/// Reference to a column: a bare identifier or an object with `column_id`.
fn validate_column_ref(
    item: &Value,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) -> Option<(String, Params)> {
    match item {
        Value::String(_) => validate_column_id(item, path.clone(), errors)
            .map(|id| (id, Params::new())),
        Value::Object(obj) => {
            let id = match aliased(obj, COLUMN_ID_KEYS) {
                Some((key, v)) => validate_column_id(v, path.field(key), errors),
                None => {
                    errors.push(ValidationError::new(
                        path.field("column_id"),
                        "column id is required",
                    ));
                    None
                }
            };
            let params = validate_params(obj, path, errors);
            id.map(|id| (id, params))
        }
        _ => {
            errors.push(ValidationError::new(
                path.clone(),
                "must be a column id or an object with 'column_id'",
            ));
            None
        }
    }
}

fn validate_columns(
    obj: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<ValidationError>,
) -> Vec<ColumnSpec> {
    let base = FieldPath::root().field(key);
    array_field(obj, key, errors)
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            validate_column_ref(item, &base.index(i), errors)
                .map(|(column_id, params)| ColumnSpec { column_id, params })
        })
        .collect()
}

fn validate_filters(obj: &Map<String, Value>, errors: &mut Vec<ValidationError>) -> Vec<FilterClause> {
    let base = FieldPath::root().field("where");
    let mut filters = Vec::new();

    for (i, item) in array_field(obj, "where", errors).iter().enumerate() {
        let path = base.index(i);
        let Value::Object(clause) = item else {
            errors.push(ValidationError::new(path, "filter must be an object"));
            continue;
        };

        let column = validate_column_ref(item, &path, errors);

        let operator = match clause.get("operator") {
            Some(Value::String(s)) => match s.parse::<FilterOperator>() {
                Ok(op) => Some(op),
                Err(msg) => {
                    errors.push(ValidationError::new(path.field("operator"), msg));
                    None
                }
            },
            Some(_) => {
                errors.push(ValidationError::new(
                    path.field("operator"),
                    "operator must be a string",
                ));
                None
            }
            None => {
                errors.push(ValidationError::new(
                    path.field("operator"),
                    "operator is required",
                ));
                None
            }
        };

        let value = operator.and_then(|op| {
            validate_filter_value(op, clause.get("value"), &path.field("value"), errors)
        });

        if let (Some((column_id, params)), Some(operator), Some(value)) = (column, operator, value)
        {
            filters.push(FilterClause {
                column_id,
                operator,
                value,
                params,
            });
        }
    }

    filters
}

/// Outer `None` means the value was rejected.
fn validate_filter_value(
    op: FilterOperator,
    raw: Option<&Value>,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) -> Option<Option<FilterValue>> {
    let raw = raw.filter(|v| !v.is_null());
    let mut reject = |message: String| {
        errors.push(ValidationError::new(path.clone(), message));
        None
    };

    match (op.arity(), raw) {
        (ValueArity::None, None) => Some(None),
        (ValueArity::None, Some(_)) => reject(format!("{} takes no value", op)),
        (_, None) => reject(format!("{} requires a value", op)),
        (ValueArity::List, Some(Value::Array(items))) => {
            if items.is_empty() {
                return reject(format!("{} requires a non-empty array", op));
            }
            let mut scalars = Vec::with_capacity(items.len());
            for item in items {
                match Scalar::from_json(item) {
                    Some(s) => scalars.push(s),
                    None => return reject(format!("{} values must be scalars", op)),
                }
            }
            scalars.sort();
            scalars.dedup();
            Some(Some(FilterValue::List(scalars)))
        }
        (ValueArity::List, Some(_)) => reject(format!("{} requires an array value", op)),
        (ValueArity::Pattern, Some(Value::String(s))) => {
            Some(Some(FilterValue::Scalar(Scalar::Text(s.clone()))))
        }
        (ValueArity::Pattern, Some(_)) => reject(format!("{} requires a string pattern", op)),
        (ValueArity::Scalar, Some(v)) => match Scalar::from_json(v) {
            Some(s) => Some(Some(FilterValue::Scalar(s))),
            None => reject(format!("{} requires a scalar value", op)),
        },
    }
}

fn validate_sort(obj: &Map<String, Value>, errors: &mut Vec<ValidationError>) -> Vec<SortClause> {
    let base = FieldPath::root().field("sort");
    let mut sort = Vec::new();

    for (i, item) in array_field(obj, "sort", errors).iter().enumerate() {
        let path = base.index(i);
        let Value::Object(clause) = item else {
            errors.push(ValidationError::new(path, "sort clause must be an object"));
            continue;
        };

        let column = validate_column_ref(item, &path, errors);

        let column_index = match aliased(clause, OCCURRENCE_KEYS) {
            None => Some(0),
            Some((key, v)) => match non_negative_integer(v) {
                Some(n) => usize::try_from(n).ok(),
                None => {
                    errors.push(ValidationError::new(
                        path.field(key),
                        "occurrence index must be a non-negative integer",
                    ));
                    None
                }
            },
        };

        let desc = match aliased(clause, DESC_KEYS) {
            None => Some(false),
            Some((key, v)) => {
                let parsed = parse_direction(v);
                if parsed.is_none() {
                    errors.push(ValidationError::new(
                        path.field(key),
                        "sort direction must be boolean-like (true/false, 1/0, \"asc\"/\"desc\")",
                    ));
                }
                parsed
            }
        };

        if let (Some((column_id, params)), Some(column_index), Some(desc)) =
            (column, column_index, desc)
        {
            sort.push(SortClause {
                column_id,
                column_index,
                desc,
                params,
            });
        }
    }

    sort
}

/// Boolean-like sort direction; `true` means descending.
fn parse_direction(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "desc" | "true" | "1" => Some(true),
            "asc" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn validate_splits(
    obj: &Map<String, Value>,
    errors: &mut Vec<ValidationError>,
) -> Vec<SplitDimension> {
    let base = FieldPath::root().field("splits");
    let mut splits = Vec::new();

    for (i, item) in array_field(obj, "splits", errors).iter().enumerate() {
        let path = base.index(i);
        let parsed = match item {
            Value::String(s) => s.parse::<SplitDimension>(),
            _ => Err("split must be a string".to_string()),
        };
        match parsed {
            Ok(dim) if splits.contains(&dim) => {
                errors.push(ValidationError::new(
                    path,
                    format!("split '{}' listed more than once", dim),
                ));
            }
            Ok(dim) => splits.push(dim),
            Err(msg) => errors.push(ValidationError::new(path, msg)),
        }
    }

    if splits.contains(&SplitDimension::Week) && !splits.contains(&SplitDimension::Year) {
        errors.push(ValidationError::new(
            base,
            "splitting by week requires splitting by year",
        ));
    }

    splits
}

fn validate_offset(obj: &Map<String, Value>, errors: &mut Vec<ValidationError>) -> u64 {
    match obj.get("offset") {
        None | Some(Value::Null) => 0,
        Some(v) => non_negative_integer(v).unwrap_or_else(|| {
            errors.push(ValidationError::new(
                FieldPath::root().field("offset"),
                "offset must be a non-negative integer",
            ));
            0
        }),
    }
}

fn validate_limit(
    obj: &Map<String, Value>,
    limits: &Limits,
    errors: &mut Vec<ValidationError>,
) -> Option<u64> {
    let path = FieldPath::root().field("limit");
    match obj.get("limit") {
        None | Some(Value::Null) => None,
        Some(v) => match non_negative_integer(v) {
            Some(0) => {
                errors.push(ValidationError::new(path, "limit must be at least 1"));
                None
            }
            Some(n) if n > limits.max_limit => {
                errors.push(ValidationError::new(
                    path,
                    format!("limit {} exceeds the maximum of {}", n, limits.max_limit),
                ));
                None
            }
            Some(n) => Some(n),
            None => {
                errors.push(ValidationError::new(path, "limit must be a positive integer"));
                None
            }
        },
    }
}

/// Integral, non-negative JSON number (`10` and `10.0` both qualify).
fn non_negative_integer(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    n.as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as u64)
}
