//! Structured column parameters.
//!
//! Request parameters arrive as loose JSON. They are parsed into
//! [`ParamValue`]s keyed by [`ParamKey`] and held in a [`Params`] map whose
//! serialization is canonical: keys sorted, lists sorted and de-duplicated,
//! integral floats folded into integers. That serialization feeds the table
//! alias digest, so semantically equal parameter sets always hash the same.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::sql::{lit_bool, lit_float, lit_int, Expr, ExprExt};

// ============================================================================
// Keys
// ============================================================================

/// Recognized parameter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    Year,
    Week,
    SeasType,
    YearOffset,
    ScoringFormat,
    Source,
    RateType,
    #[serde(rename = "dwn")]
    Down,
    #[serde(rename = "qtr")]
    Quarter,
    #[serde(rename = "ydstogo")]
    YardsToGo,
}

impl ParamKey {
    pub const ALL: [ParamKey; 10] = [
        ParamKey::Year,
        ParamKey::Week,
        ParamKey::SeasType,
        ParamKey::YearOffset,
        ParamKey::ScoringFormat,
        ParamKey::Source,
        ParamKey::RateType,
        ParamKey::Down,
        ParamKey::Quarter,
        ParamKey::YardsToGo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::Year => "year",
            ParamKey::Week => "week",
            ParamKey::SeasType => "seas_type",
            ParamKey::YearOffset => "year_offset",
            ParamKey::ScoringFormat => "scoring_format",
            ParamKey::Source => "source",
            ParamKey::RateType => "rate_type",
            ParamKey::Down => "dwn",
            ParamKey::Quarter => "qtr",
            ParamKey::YardsToGo => "ydstogo",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown parameter '{}'", s))
    }
}

// ============================================================================
// Scalars
// ============================================================================

/// A single parameter or filter value.
///
/// Integral floats are folded into `Int` at construction, so `2023` and
/// `2023.0` compare and serialize identically.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Parse a JSON scalar. Null, arrays and objects are not scalars.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Scalar::Int(i))
                } else {
                    n.as_f64().filter(|f| f.is_finite()).map(Scalar::from_f64)
                }
            }
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn from_f64(f: f64) -> Scalar {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            Scalar::Int(f as i64)
        } else {
            Scalar::Float(f)
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// SQL literal for this value.
    pub fn to_expr(&self) -> Expr {
        match self {
            Scalar::Bool(b) => lit_bool(*b),
            Scalar::Int(i) => lit_int(*i),
            Scalar::Float(f) => lit_float(*f),
            Scalar::Text(s) => Expr::from(s.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) | Scalar::Float(_) => 1,
            Scalar::Text(_) => 2,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (a, b) if a.rank() == 1 && b.rank() == 1 => {
                let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                // Ints and floats never hold the same value, break ties by variant.
                x.total_cmp(&y)
                    .then_with(|| matches!(a, Scalar::Float(_)).cmp(&matches!(b, Scalar::Float(_))))
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

// ============================================================================
// Parameter values
// ============================================================================

/// A structured parameter value: a scalar, a membership list, or a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Range {
        min: Option<Scalar>,
        max: Option<Scalar>,
    },
}

impl ParamValue {
    /// Parse and canonicalize a JSON parameter value.
    ///
    /// Lists are sorted and de-duplicated; a one-element list collapses into
    /// its scalar. Ranges are objects with `min` and/or `max`.
    pub fn from_json(value: &Value) -> Result<ParamValue, String> {
        match value {
            Value::Array(items) => {
                let mut scalars = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match Scalar::from_json(item) {
                        Some(s) => scalars.push(s),
                        None => return Err(format!("list element {} is not a scalar", i)),
                    }
                }
                Ok(ParamValue::list(scalars))
            }
            Value::Object(map) => {
                if let Some(key) = map.keys().find(|k| *k != "min" && *k != "max") {
                    return Err(format!(
                        "range objects only accept 'min' and 'max', found '{}'",
                        key
                    ));
                }
                let bound = |name: &str| -> Result<Option<Scalar>, String> {
                    match map.get(name) {
                        None | Some(Value::Null) => Ok(None),
                        Some(v) => Scalar::from_json(v)
                            .map(Some)
                            .ok_or_else(|| format!("range '{}' must be a scalar", name)),
                    }
                };
                let (min, max) = (bound("min")?, bound("max")?);
                if min.is_none() && max.is_none() {
                    return Err("range needs at least one of 'min' or 'max'".into());
                }
                Ok(ParamValue::Range { min, max })
            }
            other => Scalar::from_json(other)
                .map(ParamValue::Scalar)
                .ok_or_else(|| "expected a scalar, an array of scalars, or a {min,max} range".into()),
        }
    }

    /// Build a canonical list value.
    pub fn list(mut scalars: Vec<Scalar>) -> ParamValue {
        scalars.sort();
        scalars.dedup();
        if scalars.len() == 1 {
            ParamValue::Scalar(scalars.remove(0))
        } else {
            ParamValue::List(scalars)
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Scalar::as_i64)
    }

    /// Why this value can never match a row, if it can't.
    pub fn unsatisfiable(&self) -> Option<String> {
        match self {
            ParamValue::List(items) if items.is_empty() => Some("empty list".into()),
            ParamValue::Range {
                min: Some(lo),
                max: Some(hi),
            } if lo > hi => Some(format!("range min {} is greater than max {}", lo, hi)),
            _ => None,
        }
    }

    /// Shift every integer in this value by `delta`; `None` on overflow.
    pub fn shifted(&self, delta: i64) -> Option<ParamValue> {
        let shift = |s: &Scalar| match s {
            Scalar::Int(i) => i.checked_add(delta).map(Scalar::Int),
            other => Some(other.clone()),
        };
        Some(match self {
            ParamValue::Scalar(s) => ParamValue::Scalar(shift(s)?),
            ParamValue::List(items) => {
                ParamValue::list(items.iter().map(shift).collect::<Option<Vec<_>>>()?)
            }
            ParamValue::Range { min, max } => ParamValue::Range {
                min: match min {
                    Some(s) => Some(shift(s)?),
                    None => None,
                },
                max: match max {
                    Some(s) => Some(shift(s)?),
                    None => None,
                },
            },
        })
    }

    /// Row-level predicate restricting `column` to this value.
    pub fn predicate(&self, column: Expr) -> Expr {
        match self {
            ParamValue::Scalar(s) => column.eq(s.to_expr()),
            ParamValue::List(items) => column.in_list(items.iter().map(Scalar::to_expr).collect()),
            ParamValue::Range {
                min: Some(lo),
                max: Some(hi),
            } => column.between(lo.to_expr(), hi.to_expr()),
            ParamValue::Range {
                min: Some(lo),
                max: None,
            } => column.gte(lo.to_expr()),
            ParamValue::Range {
                min: None,
                max: Some(hi),
            } => column.lte(hi.to_expr()),
            // Never constructed by from_json; matches everything.
            ParamValue::Range {
                min: None,
                max: None,
            } => column.is_not_null(),
        }
    }
}

impl From<Scalar> for ParamValue {
    fn from(s: Scalar) -> Self {
        ParamValue::Scalar(s)
    }
}

// ============================================================================
// Parameter maps
// ============================================================================

/// A canonical parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<ParamKey, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of parameters, collecting one message per bad key.
    pub fn from_json(value: &Value) -> Result<Params, Vec<(String, String)>> {
        let Value::Object(map) = value else {
            return Err(vec![(String::new(), "params must be an object".into())]);
        };
        let mut params = Params::new();
        let mut errors = Vec::new();
        for (name, raw) in map {
            let key = match name.parse::<ParamKey>() {
                Ok(key) => key,
                Err(msg) => {
                    errors.push((name.clone(), msg));
                    continue;
                }
            };
            match ParamValue::from_json(raw) {
                Ok(v) => {
                    params.insert(key, v);
                }
                Err(msg) => errors.push((name.clone(), msg)),
            }
        }
        if errors.is_empty() {
            Ok(params)
        } else {
            Err(errors)
        }
    }

    pub fn get(&self, key: ParamKey) -> Option<&ParamValue> {
        self.0.get(&key)
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn insert(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> &mut Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn remove(&mut self, key: ParamKey) -> Option<ParamValue> {
        self.0.remove(&key)
    }

    /// Keep only the keys `keep` accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(ParamKey) -> bool) {
        self.0.retain(|k, _| keep(*k));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &ParamValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builder-style insert, handy in tests and registry defaults.
    pub fn with(mut self, key: ParamKey, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k.as_str(), v)?;
        }
        map.end()
    }
}
