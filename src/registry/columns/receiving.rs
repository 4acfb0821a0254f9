//! Receiving metrics aggregated from play-by-play, keyed by target.

use crate::registry::relations::PLAYS_TARGET;
use crate::registry::{Aggregate, ColumnDefinition, RateType};

const RATES: &[RateType] = &[
    RateType::PerGame,
    RateType::PerTeamPlay,
    RateType::PerTeamPassPlay,
];

pub(super) fn columns() -> Vec<ColumnDefinition> {
    let rel = &PLAYS_TARGET;
    vec![
        ColumnDefinition::fact("targets", "Targets", rel, Aggregate::Count).with_rates(RATES),
        ColumnDefinition::fact("receptions", "Receptions", rel, Aggregate::Sum("comp"))
            .with_rates(RATES),
        ColumnDefinition::fact("rec_yards", "Receiving Yards", rel, Aggregate::Sum("recv_yds"))
            .with_rates(RATES),
        ColumnDefinition::fact("rec_tds", "Receiving TDs", rel, Aggregate::Sum("td"))
            .with_rates(RATES),
        ColumnDefinition::fact("air_yards", "Air Yards", rel, Aggregate::Sum("air_yds"))
            .with_rates(RATES),
        ColumnDefinition::fact(
            "catch_rate",
            "Catch Rate",
            rel,
            Aggregate::ratio(Aggregate::Sum("comp"), Aggregate::Count),
        ),
    ]
}
