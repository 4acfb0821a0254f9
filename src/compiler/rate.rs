//! Rate denominators.
//!
//! A rate-normalized column divides its raw aggregate by a denominator
//! pre-aggregated over game logs, keyed on the same entity and split keys
//! as the numerator and scoped by the same year, week and season type.
//!
//! ```text
//! per_game             COUNT(DISTINCT esbid) over active game logs
//! per_team_play        COUNT(*) of the team's offensive plays in those games
//! per_team_pass_play   ... restricted to PASS plays
//! per_team_rush_play   ... restricted to RUSH plays
//! ```

use super::grouper::{TableGroup, DENOMINATOR_COLUMN};
use super::planner::{fixed_predicates, param_predicates};
use super::plan::PreAggregation;
use crate::params::{ParamKey, Params};
use crate::registry::relations::{
    GAMELOGS, GAMELOG_TEAM, GAME_KEY, PLAYS_TABLE, PLAY_OFFENSE, PLAY_SITUATION_KEYS, PLAY_TYPE,
};
use crate::registry::RateType;
use crate::sql::{count_distinct, count_star, lit_str, table_col, ExprExt, Join, JoinType, TableRef};

const GAMES: &str = "g";
const PLAYS: &str = "p";

/// Parameters of the numerator that scope its denominator.
pub fn denominator_params(rate_type: RateType, numerator: &Params) -> Params {
    let mut params = numerator.clone();
    params.retain(|key| match key {
        ParamKey::Year | ParamKey::Week | ParamKey::SeasType => true,
        other => rate_type.counts_team_plays() && PLAY_SITUATION_KEYS.contains(&other),
    });
    params
}

/// Pre-aggregation stage computing a denominator group.
pub fn denominator_stage(group: &TableGroup, rate_type: RateType) -> PreAggregation {
    let mut keys = vec![table_col(GAMES, GAMELOGS.entity_column).alias("pid")];
    for dim in &group.splits {
        if let Some(column) = GAMELOGS.split_column(*dim) {
            keys.push(table_col(GAMES, column).alias(dim.as_str()));
        }
    }

    let mut predicates = vec![table_col(GAMES, GAMELOGS.entity_column).is_not_null()];
    predicates.extend(fixed_predicates(&GAMELOGS, GAMES));
    predicates.extend(param_predicates(&GAMELOGS, &group.params, GAMES));

    let mut joins = Vec::new();
    let aggregate = if rate_type.counts_team_plays() {
        joins.push(Join {
            join_type: JoinType::Inner,
            table: TableRef::new(PLAYS_TABLE).with_alias(PLAYS),
            on: table_col(PLAYS, GAME_KEY)
                .eq(table_col(GAMES, GAME_KEY))
                .and(table_col(PLAYS, PLAY_OFFENSE).eq(table_col(GAMES, GAMELOG_TEAM))),
        });
        if let Some(play_type) = rate_type.play_type() {
            predicates.push(table_col(PLAYS, PLAY_TYPE).eq(lit_str(play_type)));
        }
        for key in PLAY_SITUATION_KEYS {
            if let Some(value) = group.params.get(key) {
                predicates.push(value.predicate(table_col(PLAYS, key.as_str())));
            }
        }
        count_star()
    } else {
        count_distinct(table_col(GAMES, GAME_KEY))
    };

    PreAggregation {
        name: group.alias.clone(),
        from: TableRef::new(GAMELOGS.table).with_alias(GAMES),
        joins,
        keys,
        aggregates: vec![aggregate.alias(DENOMINATOR_COLUMN)],
        predicates,
        having: Vec::new(),
    }
}
