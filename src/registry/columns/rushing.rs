//! Rushing metrics aggregated from play-by-play.

use crate::registry::relations::PLAYS_RUSHER;
use crate::registry::{Aggregate, ColumnDefinition, RateType};

const RATES: &[RateType] = &[
    RateType::PerGame,
    RateType::PerTeamPlay,
    RateType::PerTeamRushPlay,
];

pub(super) fn columns() -> Vec<ColumnDefinition> {
    let rel = &PLAYS_RUSHER;
    vec![
        ColumnDefinition::fact("rush_attempts", "Rush Attempts", rel, Aggregate::Count)
            .with_rates(RATES),
        ColumnDefinition::fact("rush_yards", "Rush Yards", rel, Aggregate::Sum("rush_yds"))
            .with_rates(RATES),
        ColumnDefinition::fact("rush_tds", "Rush TDs", rel, Aggregate::Sum("td")).with_rates(RATES),
        ColumnDefinition::fact(
            "rush_first_downs",
            "Rush First Downs",
            rel,
            Aggregate::Sum("first_down"),
        )
        .with_rates(RATES),
        ColumnDefinition::fact(
            "yards_per_carry",
            "Yards Per Carry",
            rel,
            Aggregate::ratio(Aggregate::Sum("rush_yds"), Aggregate::Count),
        ),
    ]
}
