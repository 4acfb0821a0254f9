//! Column registry.
//!
//! A process-wide, read-only map from column identifier to
//! [`ColumnDefinition`]. Definitions are a closed set of kinds:
//!
//! ```text
//! Attribute     player base table, no join
//! Materialized  per-entity table joined directly on entity (+ year/week)
//! Fact          granular fact scan, pre-aggregated into a named sub-query
//! Market        betting market selections joined directly per market type
//! ```
//!
//! Definition modules under [`columns`] are merged once on first use.

pub mod columns;
mod context;
mod rate;
pub mod relations;

pub use context::ResolutionContext;
pub use rate::RateType;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::params::{ParamKey, Scalar};
use crate::sql::{
    coalesce, count_distinct, count_star, lit_float, lit_int, lit_str, nullif, sum, table_col,
    Expr, ExprExt,
};

// ============================================================================
// Splits and data types
// ============================================================================

/// A dimension results can be broken out by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDimension {
    Year,
    Week,
}

impl SplitDimension {
    pub const ALL: [SplitDimension; 2] = [SplitDimension::Year, SplitDimension::Week];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitDimension::Year => "year",
            SplitDimension::Week => "week",
        }
    }
}

impl fmt::Display for SplitDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(SplitDimension::Year),
            "week" => Ok(SplitDimension::Week),
            other => Err(format!("unknown split '{}' (expected 'year' or 'week')", other)),
        }
    }
}

/// Value type a column produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Integer,
    Decimal,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
        })
    }
}

// ============================================================================
// Relations
// ============================================================================

/// Where a defaulted parameter takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDefault {
    /// No default; an absent parameter means "no restriction".
    None,
    SeasType,
    ScoringFormat,
    ProjectionSource,
    RankingSource,
    MarketSource,
}

/// A request parameter that restricts a relation column.
#[derive(Debug, Clone, Copy)]
pub struct ParamColumn {
    pub key: ParamKey,
    pub column: &'static str,
    pub default: ContextDefault,
}

/// Constant value of a fixed predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixedValue {
    Text(&'static str),
    Int(i64),
    Bool(bool),
}

impl FixedValue {
    pub fn to_expr(self) -> Expr {
        match self {
            FixedValue::Text(s) => lit_str(s),
            FixedValue::Int(i) => lit_int(i),
            FixedValue::Bool(b) => Expr::from(b),
        }
    }
}

/// A predicate every row of a relation must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct FixedPredicate {
    pub column: &'static str,
    pub value: FixedValue,
}

/// Week used when a request neither names a week nor splits by week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekDefault {
    /// Every week (season totals).
    AllWeeks,
    /// A sentinel week, such as week 0 for season-long rows.
    Fixed(i64),
    /// The current week from the resolution context.
    Current,
}

/// A base relation a column reads from.
#[derive(Debug)]
pub struct Relation {
    /// Stable name, part of the table alias digest.
    pub name: &'static str,
    pub table: &'static str,
    pub entity_column: &'static str,
    pub year_column: Option<&'static str>,
    pub week_column: Option<&'static str>,
    pub week_default: WeekDefault,
    pub params: &'static [ParamColumn],
    pub fixed: &'static [FixedPredicate],
}

impl Relation {
    /// Column holding `dim`, if the relation can be split by it.
    pub fn split_column(&self, dim: SplitDimension) -> Option<&'static str> {
        match dim {
            SplitDimension::Year => self.year_column,
            SplitDimension::Week => self.week_column,
        }
    }

    pub fn splits(&self) -> Vec<SplitDimension> {
        SplitDimension::ALL
            .into_iter()
            .filter(|d| self.split_column(*d).is_some())
            .collect()
    }

    /// Whether a request parameter means anything for this relation.
    pub fn accepts(&self, key: ParamKey) -> bool {
        match key {
            ParamKey::Year | ParamKey::YearOffset => self.year_column.is_some(),
            ParamKey::Week => self.week_column.is_some(),
            ParamKey::RateType => false,
            other => self.params.iter().any(|p| p.key == other),
        }
    }
}

// ============================================================================
// Column definitions
// ============================================================================

/// How an attribute column is read from the player table.
#[derive(Debug, Clone)]
pub enum AttributeSelect {
    Column(&'static str),
    /// Columns joined with a single space.
    Concat(&'static [&'static str]),
}

impl AttributeSelect {
    pub fn to_expr(&self, table: &str) -> Expr {
        match self {
            AttributeSelect::Column(c) => table_col(table, c),
            AttributeSelect::Concat(cols) => {
                let mut parts = cols.iter().map(|c| table_col(table, c));
                let first = parts.next().unwrap_or_else(|| lit_str(""));
                parts.fold(first, |acc, part| acc.concat(lit_str(" ")).concat(part))
            }
        }
    }
}

/// Aggregate computed by a fact pre-aggregation stage.
#[derive(Debug, Clone)]
pub enum Aggregate {
    Sum(&'static str),
    /// Sum of the null-safe addition of several columns.
    SumOf(&'static [&'static str]),
    Count,
    CountDistinct(&'static str),
    /// Ratio of two aggregates, NULL when the denominator is zero.
    Ratio(Box<Aggregate>, Box<Aggregate>),
}

impl Aggregate {
    pub fn ratio(num: Aggregate, den: Aggregate) -> Aggregate {
        Aggregate::Ratio(Box::new(num), Box::new(den))
    }

    /// Aggregate expression over columns of `table`.
    pub fn to_expr(&self, table: &str) -> Expr {
        match self {
            Aggregate::Sum(c) => sum(table_col(table, c)),
            Aggregate::SumOf(cols) => {
                let mut terms = cols
                    .iter()
                    .map(|c| coalesce(vec![table_col(table, c), lit_int(0)]));
                let first = terms.next().unwrap_or_else(|| lit_int(0));
                sum(terms.fold(first, |acc, t| acc.add(t)))
            }
            Aggregate::Count => count_star(),
            Aggregate::CountDistinct(c) => count_distinct(table_col(table, c)),
            Aggregate::Ratio(num, den) => rate_expr(num.to_expr(table), den.to_expr(table)),
        }
    }

    pub fn is_ratio(&self) -> bool {
        matches!(self, Aggregate::Ratio(..))
    }
}

/// `num * 1.0 / NULLIF(den, 0)`: floating division, NULL on a zero denominator.
pub fn rate_expr(num: Expr, den: Expr) -> Expr {
    num.mul(lit_float(1.0)).div(nullif(den, lit_int(0)))
}

/// The closed set of column kinds.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    Attribute(AttributeSelect),
    Materialized {
        relation: &'static Relation,
        column: &'static str,
    },
    Fact {
        relation: &'static Relation,
        aggregate: Aggregate,
    },
    Market {
        relation: &'static Relation,
        market_type: &'static str,
        column: &'static str,
    },
}

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Attribute(_) => "attribute",
            ColumnKind::Materialized { .. } => "materialized",
            ColumnKind::Fact { .. } => "fact",
            ColumnKind::Market { .. } => "market",
        }
    }

    /// Base relation, `None` for player attributes.
    pub fn relation(&self) -> Option<&'static Relation> {
        match self {
            ColumnKind::Attribute(_) => None,
            ColumnKind::Materialized { relation, .. }
            | ColumnKind::Fact { relation, .. }
            | ColumnKind::Market { relation, .. } => Some(relation),
        }
    }
}

/// An immutable column definition.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub data_type: DataType,
    pub kind: ColumnKind,
    pub rate_types: &'static [RateType],
}

impl ColumnDefinition {
    pub fn attribute(id: &'static str, label: &'static str, select: AttributeSelect) -> Self {
        Self {
            id,
            label,
            data_type: DataType::Text,
            kind: ColumnKind::Attribute(select),
            rate_types: &[],
        }
    }

    pub fn materialized(
        id: &'static str,
        label: &'static str,
        relation: &'static Relation,
        column: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            data_type: DataType::Decimal,
            kind: ColumnKind::Materialized { relation, column },
            rate_types: &[],
        }
    }

    pub fn fact(
        id: &'static str,
        label: &'static str,
        relation: &'static Relation,
        aggregate: Aggregate,
    ) -> Self {
        let data_type = if aggregate.is_ratio() {
            DataType::Decimal
        } else {
            DataType::Integer
        };
        Self {
            id,
            label,
            data_type,
            kind: ColumnKind::Fact {
                relation,
                aggregate,
            },
            rate_types: &[],
        }
    }

    pub fn market(
        id: &'static str,
        label: &'static str,
        relation: &'static Relation,
        market_type: &'static str,
        column: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            data_type: DataType::Decimal,
            kind: ColumnKind::Market {
                relation,
                market_type,
                column,
            },
            rate_types: &[],
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_rates(mut self, rate_types: &'static [RateType]) -> Self {
        self.rate_types = rate_types;
        self
    }

    pub fn supported_splits(&self) -> Vec<SplitDimension> {
        self.kind.relation().map(Relation::splits).unwrap_or_default()
    }

    pub fn supports_rate(&self, rate_type: RateType) -> bool {
        self.rate_types.contains(&rate_type)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The merged column registry.
#[derive(Debug)]
pub struct ColumnRegistry {
    columns: BTreeMap<&'static str, ColumnDefinition>,
}

impl ColumnRegistry {
    fn load() -> Self {
        let mut columns = BTreeMap::new();
        for def in columns::all() {
            if columns.contains_key(def.id) {
                tracing::warn!(column_id = def.id, "duplicate column definition ignored");
                continue;
            }
            columns.insert(def.id, def);
        }
        tracing::debug!(columns = columns.len(), "column registry loaded");
        Self { columns }
    }

    pub fn lookup(&self, column_id: &str) -> Option<&ColumnDefinition> {
        self.columns.get(column_id)
    }

    /// Definitions ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

static REGISTRY: Lazy<ColumnRegistry> = Lazy::new(ColumnRegistry::load);

/// The process-wide registry.
pub fn registry() -> &'static ColumnRegistry {
    &REGISTRY
}

/// Look up a column definition by identifier.
pub fn lookup(column_id: &str) -> Option<&'static ColumnDefinition> {
    REGISTRY.lookup(column_id)
}

impl ResolutionContext {
    /// Value a defaulted parameter takes when the request omits it.
    pub fn default_for(&self, default: ContextDefault) -> Option<Scalar> {
        match default {
            ContextDefault::None => None,
            ContextDefault::SeasType => Some(Scalar::from(self.seas_type.as_str())),
            ContextDefault::ScoringFormat => Some(Scalar::from(self.scoring_format.as_str())),
            ContextDefault::ProjectionSource => Some(Scalar::from(self.projection_source.as_str())),
            ContextDefault::RankingSource => Some(Scalar::from(self.ranking_source.as_str())),
            ContextDefault::MarketSource => Some(Scalar::from(self.market_source.as_str())),
        }
    }
}
