//! Per-game totals aggregated from player game logs.

use crate::registry::relations::GAMELOGS;
use crate::registry::{Aggregate, ColumnDefinition, RateType};

pub(super) fn columns() -> Vec<ColumnDefinition> {
    let rel = &GAMELOGS;
    vec![
        ColumnDefinition::fact(
            "games_played",
            "Games Played",
            rel,
            Aggregate::CountDistinct("esbid"),
        ),
        ColumnDefinition::fact(
            "total_yards",
            "Scrimmage + Passing Yards",
            rel,
            Aggregate::SumOf(&["py", "ry", "recy"]),
        )
        .with_rates(&[RateType::PerGame]),
        ColumnDefinition::fact(
            "total_touchdowns",
            "Total TDs",
            rel,
            Aggregate::SumOf(&["tdp", "tdr", "tdrec"]),
        )
        .with_rates(&[RateType::PerGame]),
        ColumnDefinition::fact("fumbles_lost", "Fumbles Lost", rel, Aggregate::SumOf(&["fuml"]))
            .with_rates(&[RateType::PerGame]),
    ]
}
