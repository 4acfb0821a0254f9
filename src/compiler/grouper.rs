//! Request grouping.
//!
//! Each request resolves to a table alias; requests sharing an alias share
//! one table group, and with it one join and one pre-aggregation stage.
//! Binding a request also yields the expression that reads its value in
//! the main query.

use std::collections::HashMap;

use super::alias::AliasKey;
use super::error::CompileResult;
use super::rate;
use super::request::{ColumnRequest, FilterRequest, Requests};
use super::resolve::{require_single_values, resolve_params};
use crate::params::{ParamKey, Params};
use crate::registry::relations::{PLAYER_KEY, PLAYER_TABLE};
use crate::registry::{
    rate_expr, Aggregate, AttributeSelect, ColumnDefinition, ColumnKind, RateType, Relation,
    ResolutionContext, SplitDimension,
};
use crate::sql::{lit_null, table_col, Expr, ExprExt, JoinType};
use crate::table_state::{FilterOperator, FilterValue};

/// Column a rate denominator stage exposes.
pub const DENOMINATOR_COLUMN: &str = "rate_denominator";

/// What a table group reads.
#[derive(Debug, Clone)]
pub enum GroupSource {
    /// Fact scan pre-aggregated into a named sub-query.
    Fact { relation: &'static Relation },
    /// Per-entity relation joined as is.
    Direct {
        relation: &'static Relation,
        market_type: Option<&'static str>,
    },
    /// Rate denominator of the group aliased `numerator`.
    Denominator {
        rate_type: RateType,
        numerator: String,
    },
}

impl GroupSource {
    pub fn kind(&self) -> &'static str {
        match self {
            GroupSource::Fact { .. } => "fact",
            GroupSource::Direct { .. } => "direct",
            GroupSource::Denominator { .. } => "rate",
        }
    }
}

/// Requests resolving to one alias.
#[derive(Debug, Clone)]
pub struct TableGroup {
    pub alias: String,
    pub source: GroupSource,
    /// Resolved, canonical parameters.
    pub params: Params,
    /// Requested split dimensions the group can be broken out by.
    pub splits: Vec<SplitDimension>,
    /// Aggregates the pre-aggregation stage selects, named by column id.
    pub aggregates: Vec<(&'static str, &'static Aggregate)>,
    /// Post-aggregation predicates.
    pub having: Vec<Expr>,
    /// Whether a filter can drop entities lacking a row in this group.
    pub restricting: bool,
    pub first_seen: usize,
}

impl TableGroup {
    fn new(
        alias: String,
        source: GroupSource,
        params: Params,
        splits: Vec<SplitDimension>,
        seq: usize,
    ) -> Self {
        Self {
            alias,
            source,
            params,
            splits,
            aggregates: Vec::new(),
            having: Vec::new(),
            restricting: false,
            first_seen: seq,
        }
    }

    /// Inner join when a filter restricts the group, outer otherwise.
    pub fn join_type(&self) -> JoinType {
        if self.restricting {
            JoinType::Inner
        } else {
            JoinType::Left
        }
    }

    /// Years the group lags the rows it is correlated to.
    pub fn year_offset(&self) -> i64 {
        self.params
            .get(ParamKey::YearOffset)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    pub fn is_denominator(&self) -> bool {
        matches!(self.source, GroupSource::Denominator { .. })
    }

    /// Column holding `dim` on the joined alias.
    pub fn split_column(&self, dim: SplitDimension) -> Option<&'static str> {
        if !self.splits.contains(&dim) {
            return None;
        }
        match &self.source {
            GroupSource::Direct { relation, .. } => relation.split_column(dim),
            GroupSource::Fact { .. } | GroupSource::Denominator { .. } => Some(dim.as_str()),
        }
    }

    fn require_aggregate(&mut self, column_id: &'static str, aggregate: &'static Aggregate) {
        if !self.aggregates.iter().any(|(id, _)| *id == column_id) {
            self.aggregates.push((column_id, aggregate));
        }
    }
}

/// A bound output column.
#[derive(Debug, Clone)]
pub struct BoundSelect {
    pub name: String,
    pub column_id: String,
    pub occurrence: usize,
    pub expr: Expr,
}

/// Output of grouping.
#[derive(Debug, Clone)]
pub struct Grouping {
    /// Groups in order of first appearance; denominators follow their numerator's creation.
    pub groups: Vec<TableGroup>,
    pub selects: Vec<BoundSelect>,
    /// Predicates evaluated after all joins.
    pub filters: Vec<Expr>,
}

/// How a request reads its value.
enum Binding {
    Attribute(&'static AttributeSelect),
    Direct {
        alias: String,
        column: &'static str,
    },
    Fact {
        alias: String,
        relation: &'static Relation,
        aggregate: &'static Aggregate,
    },
}

/// Clusters requests into table groups.
pub struct Grouper<'a> {
    ctx: &'a ResolutionContext,
    splits: &'a [SplitDimension],
    groups: Vec<TableGroup>,
    by_alias: HashMap<String, usize>,
}

impl<'a> Grouper<'a> {
    pub fn new(ctx: &'a ResolutionContext, splits: &'a [SplitDimension]) -> Self {
        Self {
            ctx,
            splits,
            groups: Vec::new(),
            by_alias: HashMap::new(),
        }
    }

    /// Bind every request and collect the table groups.
    pub fn group(mut self, requests: &Requests) -> CompileResult<Grouping> {
        let mut selects = Vec::with_capacity(requests.selects.len());
        for select in &requests.selects {
            let expr = self.bind_value(&select.request)?;
            selects.push(BoundSelect {
                name: select.output_name(),
                column_id: select.request.column_id.clone(),
                occurrence: select.occurrence,
                expr,
            });
        }

        let mut filters = Vec::new();
        for filter in &requests.filters {
            if let Some(predicate) = self.bind_filter(filter)? {
                filters.push(predicate);
            }
        }

        tracing::debug!(
            groups = self.groups.len(),
            selects = selects.len(),
            filters = filters.len(),
            "grouped column requests"
        );

        Ok(Grouping {
            groups: self.groups,
            selects,
            filters,
        })
    }

    /// Expression reading the request's (possibly rate-normalized) value.
    fn bind_value(&mut self, request: &ColumnRequest) -> CompileResult<Expr> {
        let binding = self.bind(request)?;
        let raw = match &binding {
            Binding::Attribute(select) => return Ok(select.to_expr(PLAYER_TABLE)),
            Binding::Direct { alias, column } => table_col(alias, column),
            Binding::Fact {
                alias, aggregate, ..
            } => {
                let id = request.definition.id;
                self.group_mut(alias).require_aggregate(id, *aggregate);
                table_col(alias, id)
            }
        };
        self.normalize(request, &binding, raw)
    }

    /// Divide by the request's rate denominator, if it names one.
    fn normalize(
        &mut self,
        request: &ColumnRequest,
        binding: &Binding,
        raw: Expr,
    ) -> CompileResult<Expr> {
        let (Some(rate_type), Binding::Fact { alias, .. }) = (request.rate_type, binding) else {
            return Ok(raw);
        };
        let denominator = self.bind_denominator(alias, rate_type)?;
        Ok(rate_expr(raw, table_col(&denominator, DENOMINATOR_COLUMN)))
    }

    /// Attach a filter to its group; returns the predicate for the main query, if any.
    fn bind_filter(&mut self, filter: &FilterRequest) -> CompileResult<Option<Expr>> {
        let request = &filter.request;
        let binding = self.bind(request)?;
        let value = filter.value.as_ref();

        let condition = match &binding {
            Binding::Attribute(select) => {
                Some(predicate(select.to_expr(PLAYER_TABLE), filter.operator, value))
            }
            Binding::Direct { alias, column } => {
                Some(predicate(table_col(alias, column), filter.operator, value))
            }
            Binding::Fact {
                alias,
                relation,
                aggregate,
            } => {
                if request.rate_type.is_some() || !filter.restricts() {
                    let id = request.definition.id;
                    self.group_mut(alias).require_aggregate(id, *aggregate);
                    let target = self.normalize(request, &binding, table_col(alias, id))?;
                    Some(predicate(target, filter.operator, value))
                } else {
                    let having = predicate(aggregate.to_expr(relation.table), filter.operator, value);
                    self.group_mut(alias).having.push(having);
                    None
                }
            }
        };

        if filter.restricts() {
            if let Binding::Direct { alias, .. } | Binding::Fact { alias, .. } = &binding {
                self.group_mut(alias).restricting = true;
            }
        }

        Ok(condition)
    }

    fn bind(&mut self, request: &ColumnRequest) -> CompileResult<Binding> {
        let definition: &'static ColumnDefinition = request.definition;
        let column_id = definition.id;
        match &definition.kind {
            ColumnKind::Attribute(select) => Ok(Binding::Attribute(select)),
            ColumnKind::Materialized { relation, column } => {
                let alias = self.bind_direct(request, relation, None)?;
                Ok(Binding::Direct {
                    alias,
                    column: *column,
                })
            }
            ColumnKind::Market {
                relation,
                market_type,
                column,
            } => {
                let alias = self.bind_direct(request, relation, Some(*market_type))?;
                Ok(Binding::Direct {
                    alias,
                    column: *column,
                })
            }
            ColumnKind::Fact {
                relation,
                aggregate,
            } => {
                let relation: &'static Relation = relation;
                let splits = self.splits_for(relation);
                let params = resolve_params(column_id, relation, &request.params, &splits, self.ctx)?;
                let alias = AliasKey::new("fact", relation.name, &params).alias()?;
                self.insert_group(TableGroup::new(
                    alias.clone(),
                    GroupSource::Fact { relation },
                    params,
                    splits,
                    request.seq,
                ));
                Ok(Binding::Fact {
                    alias,
                    relation,
                    aggregate,
                })
            }
        }
    }

    fn bind_direct(
        &mut self,
        request: &ColumnRequest,
        relation: &'static Relation,
        market_type: Option<&'static str>,
    ) -> CompileResult<String> {
        let column_id = request.definition.id;
        let splits = self.splits_for(relation);
        let params = resolve_params(column_id, relation, &request.params, &splits, self.ctx)?;
        require_single_values(column_id, &params, &splits)?;

        let key = match market_type {
            Some(market_type) => format!("{}:{}", relation.name, market_type),
            None => relation.name.to_string(),
        };
        let alias = AliasKey::new("direct", &key, &params).alias()?;
        self.insert_group(TableGroup::new(
            alias.clone(),
            GroupSource::Direct {
                relation,
                market_type,
            },
            params,
            splits,
            request.seq,
        ));
        Ok(alias)
    }

    fn bind_denominator(&mut self, numerator: &str, rate_type: RateType) -> CompileResult<String> {
        let (params, splits, seq) = {
            let group = self.group_mut(numerator);
            (
                rate::denominator_params(rate_type, &group.params),
                group.splits.clone(),
                group.first_seen,
            )
        };
        let alias = AliasKey::new("rate", rate_type.as_str(), &params)
            .anchored(numerator)
            .alias()?;
        self.insert_group(TableGroup::new(
            alias.clone(),
            GroupSource::Denominator {
                rate_type,
                numerator: numerator.to_string(),
            },
            params,
            splits,
            seq,
        ));
        Ok(alias)
    }

    fn splits_for(&self, relation: &Relation) -> Vec<SplitDimension> {
        SplitDimension::ALL
            .into_iter()
            .filter(|d| self.splits.contains(d) && relation.split_column(*d).is_some())
            .collect()
    }

    fn insert_group(&mut self, group: TableGroup) {
        if !self.by_alias.contains_key(&group.alias) {
            self.by_alias.insert(group.alias.clone(), self.groups.len());
            self.groups.push(group);
        }
    }

    fn group_mut(&mut self, alias: &str) -> &mut TableGroup {
        let index = self.by_alias[alias];
        &mut self.groups[index]
    }
}

/// Predicate comparing `target` with a validated filter value.
pub fn predicate(target: Expr, operator: FilterOperator, value: Option<&FilterValue>) -> Expr {
    let operand = || match value {
        Some(FilterValue::Scalar(s)) => s.to_expr(),
        Some(FilterValue::List(items)) => items.first().map(|s| s.to_expr()).unwrap_or_else(lit_null),
        None => lit_null(),
    };
    let list = || match value {
        Some(FilterValue::List(items)) => items.iter().map(|s| s.to_expr()).collect(),
        Some(FilterValue::Scalar(s)) => vec![s.to_expr()],
        None => Vec::new(),
    };

    match operator {
        FilterOperator::Eq => target.eq(operand()),
        FilterOperator::Ne => target.ne(operand()),
        FilterOperator::Gt => target.gt(operand()),
        FilterOperator::Gte => target.gte(operand()),
        FilterOperator::Lt => target.lt(operand()),
        FilterOperator::Lte => target.lte(operand()),
        FilterOperator::In => target.in_list(list()),
        FilterOperator::NotIn => target.not_in_list(list()),
        FilterOperator::IsNull => target.is_null(),
        FilterOperator::IsNotNull => target.is_not_null(),
        FilterOperator::Like => target.ilike(operand(), false),
        FilterOperator::NotLike => target.ilike(operand(), true),
    }
}

/// Entity key of the base table.
pub fn player_key() -> Expr {
    table_col(PLAYER_TABLE, PLAYER_KEY)
}
