//! Betting market lines and odds.

use crate::registry::relations::{MARKETS_SEASON, MARKETS_WEEKLY};
use crate::registry::ColumnDefinition;

const LINE: &str = "selection_metric_line";
const ODDS: &str = "odds_american";

pub(super) fn columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::market(
            "season_rushing_yards_line",
            "Season Rushing Yards Line",
            &MARKETS_SEASON,
            "SEASON_RUSHING_YARDS",
            LINE,
        ),
        ColumnDefinition::market(
            "season_receiving_yards_line",
            "Season Receiving Yards Line",
            &MARKETS_SEASON,
            "SEASON_RECEIVING_YARDS",
            LINE,
        ),
        ColumnDefinition::market(
            "season_passing_yards_line",
            "Season Passing Yards Line",
            &MARKETS_SEASON,
            "SEASON_PASSING_YARDS",
            LINE,
        ),
        ColumnDefinition::market(
            "game_rushing_yards_line",
            "Game Rushing Yards Line",
            &MARKETS_WEEKLY,
            "GAME_RUSHING_YARDS",
            LINE,
        ),
        ColumnDefinition::market(
            "game_receiving_yards_line",
            "Game Receiving Yards Line",
            &MARKETS_WEEKLY,
            "GAME_RECEIVING_YARDS",
            LINE,
        ),
        ColumnDefinition::market(
            "game_passing_yards_line",
            "Game Passing Yards Line",
            &MARKETS_WEEKLY,
            "GAME_PASSING_YARDS",
            LINE,
        ),
        ColumnDefinition::market(
            "anytime_td_odds",
            "Anytime TD Odds",
            &MARKETS_WEEKLY,
            "ANYTIME_TOUCHDOWN",
            ODDS,
        )
        .with_type(crate::registry::DataType::Integer),
    ]
}
