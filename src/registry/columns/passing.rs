//! Passing metrics aggregated from play-by-play, keyed by passer.

use crate::registry::relations::PLAYS_PASSER;
use crate::registry::{Aggregate, ColumnDefinition, RateType};

const RATES: &[RateType] = &[
    RateType::PerGame,
    RateType::PerTeamPlay,
    RateType::PerTeamPassPlay,
];

pub(super) fn columns() -> Vec<ColumnDefinition> {
    let rel = &PLAYS_PASSER;
    vec![
        ColumnDefinition::fact("pass_attempts", "Pass Attempts", rel, Aggregate::Count)
            .with_rates(RATES),
        ColumnDefinition::fact("completions", "Completions", rel, Aggregate::Sum("comp"))
            .with_rates(RATES),
        ColumnDefinition::fact("pass_yards", "Passing Yards", rel, Aggregate::Sum("pass_yds"))
            .with_rates(RATES),
        ColumnDefinition::fact("pass_tds", "Passing TDs", rel, Aggregate::Sum("td"))
            .with_rates(RATES),
        ColumnDefinition::fact(
            "pass_air_yards",
            "Passing Air Yards",
            rel,
            Aggregate::Sum("air_yds"),
        )
        .with_rates(RATES),
        ColumnDefinition::fact(
            "completion_pct",
            "Completion %",
            rel,
            Aggregate::ratio(Aggregate::Sum("comp"), Aggregate::Count),
        ),
    ]
}
