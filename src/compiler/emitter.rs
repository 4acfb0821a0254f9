//! Query emitter.
//!
//! Renders a [`QueryPlan`] into a single statement: pre-aggregation stages
//! become `WITH` sub-queries ahead of the main query over the base table.

use super::plan::QueryPlan;
use crate::sql::{conjunction, Dialect, Query};

/// Renders plans for one SQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEmitter {
    dialect: Dialect,
}

impl QueryEmitter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Assemble the statement AST for a plan.
    pub fn to_query(&self, plan: &QueryPlan) -> Query {
        let mut query = Query::new();
        for stage in &plan.pre_aggregations {
            query = query.with_cte(stage.to_cte());
        }

        query = query
            .select(plan.outputs.iter().map(|o| o.to_select()).collect())
            .from(plan.base.clone());
        for planned in &plan.joins {
            let join = planned.join.clone();
            query = query.join(join.join_type, join.table, join.on);
        }
        if let Some(filter) = conjunction(plan.filters.iter().cloned()) {
            query = query.filter(filter);
        }

        query = query
            .group_by(plan.group_by.clone())
            .order_by(plan.order_by.clone())
            .limit(plan.limit);
        if plan.offset > 0 {
            query = query.offset(plan.offset);
        }
        query
    }

    /// Render a plan to SQL text.
    pub fn emit(&self, plan: &QueryPlan) -> String {
        let sql = self.to_query(plan).to_sql(self.dialect);
        tracing::debug!(dialect = %self.dialect, sql = %sql, "emitted statement");
        sql
    }
}
