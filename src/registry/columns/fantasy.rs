//! Fantasy season logs, projections and expert rankings.

use crate::registry::relations::{PROJECTIONS, RANKINGS, SEASONLOGS};
use crate::registry::ColumnDefinition;

pub(super) fn columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::materialized("fantasy_points", "Fantasy Points", &SEASONLOGS, "points"),
        ColumnDefinition::materialized(
            "fantasy_points_per_game",
            "Fantasy Points / Game",
            &SEASONLOGS,
            "points_per_game",
        ),
        ColumnDefinition::materialized(
            "fantasy_points_rank",
            "Fantasy Points Rank",
            &SEASONLOGS,
            "points_rnk",
        ),
        ColumnDefinition::materialized(
            "fantasy_points_position_rank",
            "Fantasy Points Position Rank",
            &SEASONLOGS,
            "points_pos_rnk",
        ),
        ColumnDefinition::materialized(
            "projected_pass_yards",
            "Projected Passing Yards",
            &PROJECTIONS,
            "py",
        ),
        ColumnDefinition::materialized(
            "projected_rush_yards",
            "Projected Rushing Yards",
            &PROJECTIONS,
            "ry",
        ),
        ColumnDefinition::materialized(
            "projected_receptions",
            "Projected Receptions",
            &PROJECTIONS,
            "rec",
        ),
        ColumnDefinition::materialized(
            "projected_rec_yards",
            "Projected Receiving Yards",
            &PROJECTIONS,
            "recy",
        ),
        ColumnDefinition::materialized("rank_avg", "Average Rank", &RANKINGS, "avg"),
        ColumnDefinition::materialized("rank_min", "Best Rank", &RANKINGS, "min"),
        ColumnDefinition::materialized("rank_max", "Worst Rank", &RANKINGS, "max"),
    ]
}
