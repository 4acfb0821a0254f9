//! Query planner.
//!
//! Turns a validated table state into a [`QueryPlan`]:
//! 1. Expands columns and filters into column requests
//! 2. Adds columns referenced only by sort clauses
//! 3. Groups requests by table alias
//! 4. Orders groups: filter-bearing first, then by split signature and
//!    first appearance; denominators right after their numerator
//! 5. Builds pre-aggregation stages and joins, chaining split correlation
//! 6. Coalesces split columns and assembles the select list
//! 7. Resolves ordering and pagination

use std::cmp::Reverse;

use super::error::CompileResult;
use super::grouper::{player_key, GroupSource, Grouper, Grouping, TableGroup};
use super::plan::{OutputColumn, OutputKind, PlannedJoin, PreAggregation, QueryPlan};
use super::rate;
use super::request::Requests;
use super::sort;
use super::splits::{correlate_to, SplitChain};
use crate::params::{ParamKey, Params};
use crate::registry::relations::{MARKET_TYPE, PLAYER_KEY, PLAYER_TABLE};
use crate::registry::{Relation, ResolutionContext, SplitDimension};
use crate::sql::{conjunction, lit_str, table_col, Expr, ExprExt, Join, TableRef};
use crate::table_state::{Limits, TableState};

/// Plans table states against one resolution context.
pub struct QueryPlanner<'a> {
    ctx: &'a ResolutionContext,
    limits: &'a Limits,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(ctx: &'a ResolutionContext, limits: &'a Limits) -> Self {
        Self { ctx, limits }
    }

    /// Plan a validated table state.
    pub fn plan(&self, state: &TableState) -> CompileResult<QueryPlan> {
        // Step 1-2: requests, including sort-only columns
        let mut requests = Requests::expand(state)?;
        sort::append_sort_columns(&state.sort, &mut requests)?;

        // Step 3: table groups
        let splits: Vec<SplitDimension> = SplitDimension::ALL
            .into_iter()
            .filter(|d| state.splits.contains(d))
            .collect();
        let Grouping {
            groups,
            selects,
            filters,
        } = Grouper::new(self.ctx, &splits).group(&requests)?;

        // Step 4-5: joins and pre-aggregations
        let ordered = join_order(&groups);
        let mut chain = SplitChain::new();
        let mut pre_aggregations = Vec::new();
        let mut joins = Vec::with_capacity(ordered.len());

        for group in &ordered {
            let mut on = vec![entity_key(group).eq(player_key())];
            let table = match &group.source {
                GroupSource::Fact { relation } => {
                    pre_aggregations.push(fact_stage(group, relation));
                    on.extend(chain.correlate(group));
                    TableRef::new(&group.alias)
                }
                GroupSource::Direct {
                    relation,
                    market_type,
                } => {
                    on.extend(param_predicates(relation, &group.params, &group.alias));
                    on.extend(fixed_predicates(relation, &group.alias));
                    if let Some(market_type) = market_type {
                        on.push(table_col(&group.alias, MARKET_TYPE).eq(lit_str(market_type)));
                    }
                    on.extend(chain.correlate(group));
                    TableRef::new(relation.table).with_alias(&group.alias)
                }
                GroupSource::Denominator {
                    rate_type,
                    numerator,
                } => {
                    pre_aggregations.push(rate::denominator_stage(group, *rate_type));
                    if let Some(numerator) = ordered.iter().find(|g| &g.alias == numerator) {
                        on.extend(correlate_to(group, numerator));
                    }
                    TableRef::new(&group.alias)
                }
            };

            joins.push(PlannedJoin {
                alias: group.alias.clone(),
                kind: group.source.kind(),
                join: Join {
                    join_type: group.join_type(),
                    table,
                    on: conjunction(on).unwrap_or_else(|| player_key().is_not_null()),
                },
            });
        }

        // Step 6: select list
        let mut outputs = vec![OutputColumn {
            name: PLAYER_KEY.to_string(),
            kind: OutputKind::Entity,
            expr: player_key(),
        }];
        for dim in &splits {
            if let Some(expr) = chain.output(*dim) {
                outputs.push(OutputColumn {
                    name: dim.as_str().to_string(),
                    kind: OutputKind::Split { dimension: *dim },
                    expr,
                });
            }
        }
        let leading = outputs.len();
        outputs.extend(selects.into_iter().map(|s| OutputColumn {
            name: s.name,
            kind: OutputKind::Column {
                column_id: s.column_id,
                occurrence: s.occurrence,
            },
            expr: s.expr,
        }));

        let group_by = outputs
            .iter()
            .filter(|o| !o.expr.is_aggregate())
            .map(|o| o.expr.clone())
            .collect();

        // Step 7: ordering and pagination
        let order_by = sort::order_by(&state.sort, &requests, leading)?;
        let (limit, offset) = sort::pagination(state.limit, state.offset, self.limits);

        tracing::debug!(
            pre_aggregations = pre_aggregations.len(),
            joins = joins.len(),
            outputs = outputs.len(),
            "planned table state"
        );

        Ok(QueryPlan {
            pre_aggregations,
            base: TableRef::new(PLAYER_TABLE),
            joins,
            outputs,
            filters,
            group_by,
            order_by,
            limit,
            offset,
        })
    }
}

/// Application order of table groups.
fn join_order(groups: &[TableGroup]) -> Vec<&TableGroup> {
    let mut primary: Vec<&TableGroup> = groups.iter().filter(|g| !g.is_denominator()).collect();
    primary.sort_by_key(|g| {
        (
            !g.restricting,
            Reverse(g.splits.len()),
            g.splits.clone(),
            g.first_seen,
        )
    });

    let mut ordered = Vec::with_capacity(groups.len());
    for group in primary {
        ordered.push(group);
        ordered.extend(groups.iter().filter(|d| {
            matches!(&d.source, GroupSource::Denominator { numerator, .. } if *numerator == group.alias)
        }));
    }
    ordered
}

/// Column joined against the base table's entity key.
fn entity_key(group: &TableGroup) -> Expr {
    match &group.source {
        GroupSource::Direct { relation, .. } => table_col(&group.alias, relation.entity_column),
        GroupSource::Fact { .. } | GroupSource::Denominator { .. } => {
            table_col(&group.alias, PLAYER_KEY)
        }
    }
}

/// Pre-aggregation stage of a fact group.
fn fact_stage(group: &TableGroup, relation: &Relation) -> PreAggregation {
    let table = relation.table;
    let mut keys = vec![table_col(table, relation.entity_column).alias(PLAYER_KEY)];
    for dim in &group.splits {
        if let Some(column) = relation.split_column(*dim) {
            keys.push(table_col(table, column).alias(dim.as_str()));
        }
    }

    let mut predicates = vec![table_col(table, relation.entity_column).is_not_null()];
    predicates.extend(fixed_predicates(relation, table));
    predicates.extend(param_predicates(relation, &group.params, table));

    PreAggregation {
        name: group.alias.clone(),
        from: TableRef::new(table),
        joins: Vec::new(),
        keys,
        aggregates: group
            .aggregates
            .iter()
            .map(|(id, aggregate)| aggregate.to_expr(table).alias(id))
            .collect(),
        predicates,
        having: group.having.clone(),
    }
}

/// Row-level predicates for the parameters `relation` has a column for.
pub(super) fn param_predicates(relation: &Relation, params: &Params, table: &str) -> Vec<Expr> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let column = match key {
                ParamKey::Year => relation.year_column,
                ParamKey::Week => relation.week_column,
                ParamKey::YearOffset | ParamKey::RateType => None,
                other => relation
                    .params
                    .iter()
                    .find(|p| p.key == other)
                    .map(|p| p.column),
            }?;
            Some(value.predicate(table_col(table, column)))
        })
        .collect()
}

/// Predicates every row of `relation` must satisfy.
pub(super) fn fixed_predicates(relation: &Relation, table: &str) -> Vec<Expr> {
    relation
        .fixed
        .iter()
        .map(|f| table_col(table, f.column).eq(f.value.to_expr()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Scalar;
    use crate::sql::{Dialect, JoinType};
    use crate::table_state::{ColumnSpec, FilterClause, FilterOperator, FilterValue};
    use serde_json::json;

    fn ctx() -> ResolutionContext {
        ResolutionContext::default().with_year(2023)
    }

    fn plan(state: &TableState) -> QueryPlan {
        QueryPlanner::new(&ctx(), &Limits::default())
            .plan(state)
            .unwrap()
    }

    fn spec(id: &str, params: serde_json::Value) -> ColumnSpec {
        ColumnSpec::new(id).with_params(Params::from_json(&params).unwrap())
    }

    fn sql(expr: &Expr) -> String {
        expr.to_tokens().serialize(Dialect::Postgres)
    }

    fn gt(column_id: &str, value: i64) -> FilterClause {
        FilterClause {
            column_id: column_id.into(),
            operator: FilterOperator::Gt,
            value: Some(FilterValue::Scalar(Scalar::from(value))),
            params: Params::new(),
        }
    }

    #[test]
    fn test_filter_bearing_groups_join_first() {
        let state = TableState::new()
            .column(ColumnSpec::new("fantasy_points"))
            .column(ColumnSpec::new("rush_yards"))
            .filter(gt("receptions", 20));
        let plan = plan(&state);

        let kinds: Vec<(&str, JoinType)> =
            plan.joins.iter().map(|j| (j.kind, j.join_type())).collect();
        assert_eq!(
            kinds,
            vec![
                ("fact", JoinType::Inner),
                ("direct", JoinType::Left),
                ("fact", JoinType::Left),
            ]
        );
    }

    #[test]
    fn test_more_split_dimensions_join_first() {
        let state = TableState::new()
            .column(ColumnSpec::new("fantasy_points"))
            .column(ColumnSpec::new("rush_yards"))
            .split(SplitDimension::Year)
            .split(SplitDimension::Week);
        let plan = plan(&state);
        assert_eq!(plan.joins[0].kind, "fact");
        assert_eq!(plan.joins[1].kind, "direct");
        assert_eq!(
            plan.output_names(),
            vec!["pid", "year", "week", "fantasy_points_0", "rush_yards_0"]
        );
    }

    #[test]
    fn test_split_correlation_chains() {
        let state = TableState::new()
            .column(ColumnSpec::new("rush_yards"))
            .column(ColumnSpec::new("fantasy_points"))
            .split(SplitDimension::Year);
        let plan = plan(&state);
        let first = &plan.joins[0].alias;
        let second = &plan.joins[1].alias;

        assert_eq!(
            sql(&plan.joins[1].join.on),
            format!(
                "\"{s}\".\"pid\" = \"player\".\"pid\" AND \"{s}\".\"scoring_format\" = 'ppr' \
                 AND \"{s}\".\"year\" = COALESCE(\"{f}\".\"year\", \"{s}\".\"year\")",
                s = second,
                f = first
            )
        );
        assert_eq!(
            sql(&plan.outputs[1].expr),
            format!("COALESCE(\"{}\".\"year\", \"{}\".\"year\")", first, second)
        );
    }

    #[test]
    fn test_relative_group_correlates_with_offset() {
        let state = TableState::new()
            .column(ColumnSpec::new("fantasy_points"))
            .column(spec("fantasy_points", json!({"year_offset": 1})))
            .split(SplitDimension::Year);
        let plan = plan(&state);
        let current = &plan.joins[0].alias;
        let prior = &plan.joins[1].alias;

        assert!(sql(&plan.joins[1].join.on).ends_with(&format!(
            "\"{p}\".\"year\" = COALESCE(\"{c}\".\"year\" - 1, \"{p}\".\"year\")",
            p = prior,
            c = current
        )));
        assert_eq!(sql(&plan.outputs[1].expr), format!("\"{}\".\"year\"", current));
    }

    #[test]
    fn test_denominator_follows_numerator() {
        let state = TableState::new()
            .column(ColumnSpec::new("fantasy_points"))
            .column(spec("rush_yards", json!({"rate_type": "per_game"})))
            .split(SplitDimension::Year);
        let plan = plan(&state);

        let kinds: Vec<&str> = plan.joins.iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec!["direct", "fact", "rate"]);
        let numerator = &plan.joins[1].alias;
        let denominator = &plan.joins[2].alias;
        assert_eq!(plan.joins[2].join_type(), JoinType::Left);
        assert_eq!(
            sql(&plan.joins[2].join.on),
            format!(
                "\"{d}\".\"pid\" = \"player\".\"pid\" AND \"{d}\".\"year\" = \"{n}\".\"year\"",
                d = denominator,
                n = numerator
            )
        );
    }

    #[test]
    fn test_sort_positions_account_for_splits() {
        let mut state = TableState::new()
            .column(ColumnSpec::new("rush_yards"))
            .column(ColumnSpec::new("rush_yards"))
            .split(SplitDimension::Year);
        state = state.sort_by("rush_yards", 1, true);
        let plan = plan(&state);
        assert_eq!(plan.position_of("rush_yards", 1), Some(4));
        assert_eq!(sql(&plan.order_by[0].expr), "4");
    }

    #[test]
    fn test_fact_stage_shape() {
        let state = TableState::new()
            .column(ColumnSpec::new("rush_yards"))
            .filter(gt("rush_attempts", 10));
        let plan = plan(&state);
        let stage = &plan.pre_aggregations[0];
        let sql = stage.to_query().to_sql(Dialect::Postgres);

        assert!(sql.contains("\"nfl_plays\".\"bc_pid\" AS \"pid\""));
        assert!(sql.contains("SUM(\"nfl_plays\".\"rush_yds\") AS \"rush_yards\""));
        assert!(sql.contains("\"nfl_plays\".\"play_type\" = 'RUSH'"));
        assert!(sql.contains("\"nfl_plays\".\"year\" = 2023"));
        assert!(sql.contains("HAVING COUNT(*) > 10"));
    }

    #[test]
    fn test_param_predicates_skip_unknown_columns() {
        let params = Params::new()
            .with(ParamKey::Year, Scalar::from(2023))
            .with(ParamKey::Down, Scalar::from(3))
            .with(ParamKey::YearOffset, Scalar::from(1));
        let predicates = param_predicates(&crate::registry::relations::GAMELOGS, &params, "g");
        assert_eq!(predicates.len(), 1);
        assert_eq!(sql(&predicates[0]), "\"g\".\"year\" = 2023");
    }
}
