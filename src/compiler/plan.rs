//! The compiled query plan.
//!
//! A plan is an immutable value: stage functions assemble it, the emitter
//! renders it once.

use serde::Serialize;

use crate::registry::SplitDimension;
use crate::sql::{
    conjunction, Cte, Expr, Join, JoinType, OrderByExpr, Query, SelectExpr, TableRef,
};

/// A named pre-aggregation sub-query.
#[derive(Debug, Clone, PartialEq)]
pub struct PreAggregation {
    /// Sub-query name, equal to the table group alias.
    pub name: String,
    pub from: TableRef,
    pub joins: Vec<Join>,
    /// Entity key and split keys; the sub-query groups by these.
    pub keys: Vec<SelectExpr>,
    pub aggregates: Vec<SelectExpr>,
    /// Row-level predicates.
    pub predicates: Vec<Expr>,
    /// Post-aggregation predicates.
    pub having: Vec<Expr>,
}

impl PreAggregation {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new()
            .select(self.keys.iter().chain(&self.aggregates).cloned().collect())
            .from(self.from.clone())
            .group_by(self.keys.iter().map(|k| k.expr.clone()).collect());
        query.joins = self.joins.clone();
        if let Some(predicate) = conjunction(self.predicates.iter().cloned()) {
            query = query.filter(predicate);
        }
        if let Some(having) = conjunction(self.having.iter().cloned()) {
            query = query.having(having);
        }
        query
    }

    pub fn to_cte(&self) -> Cte {
        Cte::new(&self.name, self.to_query())
    }
}

/// A table group joined onto the base table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedJoin {
    pub alias: String,
    /// `fact`, `direct` or `rate`.
    pub kind: &'static str,
    pub join: Join,
}

impl PlannedJoin {
    pub fn join_type(&self) -> JoinType {
        self.join.join_type
    }
}

/// What an output column holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputKind {
    /// The entity key.
    Entity,
    /// A coalesced split dimension.
    Split { dimension: SplitDimension },
    /// A requested column occurrence.
    Column { column_id: String, occurrence: usize },
}

/// One entry of the main select list.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub kind: OutputKind,
    pub expr: Expr,
}

impl OutputColumn {
    pub fn to_select(&self) -> SelectExpr {
        SelectExpr::new(self.expr.clone()).with_alias(&self.name)
    }
}

/// The compiled plan for one table state.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub pre_aggregations: Vec<PreAggregation>,
    pub base: TableRef,
    /// Joins in application order.
    pub joins: Vec<PlannedJoin>,
    /// Select list; 1-based positions are the ordinals used by `order_by`.
    pub outputs: Vec<OutputColumn>,
    /// Predicates applied after every join.
    pub filters: Vec<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: u64,
    pub offset: u64,
}

impl QueryPlan {
    /// Output column names in select order.
    pub fn output_names(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.name.clone()).collect()
    }

    /// 1-based select position of a column occurrence.
    pub fn position_of(&self, column_id: &str, occurrence: usize) -> Option<usize> {
        self.outputs
            .iter()
            .position(|o| {
                matches!(&o.kind, OutputKind::Column { column_id: id, occurrence: occ }
                    if id == column_id && *occ == occurrence)
            })
            .map(|i| i + 1)
    }

    /// Serializable outline of the plan.
    pub fn summary(&self) -> PlanSummary<'_> {
        PlanSummary {
            stages: self.pre_aggregations.iter().map(|p| p.name.as_str()).collect(),
            joins: self
                .joins
                .iter()
                .map(|j| JoinSummary {
                    alias: &j.alias,
                    kind: j.kind,
                    join_type: j.join_type(),
                })
                .collect(),
            columns: self
                .outputs
                .iter()
                .map(|o| ColumnSummary {
                    name: &o.name,
                    kind: &o.kind,
                })
                .collect(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Outline of a [`QueryPlan`], as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct PlanSummary<'a> {
    pub stages: Vec<&'a str>,
    pub joins: Vec<JoinSummary<'a>>,
    pub columns: Vec<ColumnSummary<'a>>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize)]
pub struct JoinSummary<'a> {
    pub alias: &'a str,
    pub kind: &'static str,
    pub join_type: JoinType,
}

#[derive(Debug, Serialize)]
pub struct ColumnSummary<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub kind: &'a OutputKind,
}
