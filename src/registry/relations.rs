//! Base relations of the analytics store.

use super::{ContextDefault, FixedPredicate, FixedValue, ParamColumn, Relation, WeekDefault};
use crate::params::ParamKey;

/// Entity base table every query starts from.
pub const PLAYER_TABLE: &str = "player";
/// Entity key of the base table.
pub const PLAYER_KEY: &str = "pid";

/// Play-by-play fact table.
pub const PLAYS_TABLE: &str = "nfl_plays";
/// Per-player, per-game fact table.
pub const GAMELOGS_TABLE: &str = "player_gamelogs";

/// Game key shared by plays and game logs.
pub const GAME_KEY: &str = "esbid";
/// Team a game log row played for.
pub const GAMELOG_TEAM: &str = "tm";
/// Offensive team of a play.
pub const PLAY_OFFENSE: &str = "off";
/// Play classification (`PASS`, `RUSH`, ...).
pub const PLAY_TYPE: &str = "play_type";

const SEAS_TYPE: ParamColumn = ParamColumn {
    key: ParamKey::SeasType,
    column: "seas_type",
    default: ContextDefault::SeasType,
};

const PLAY_SITUATION: [ParamColumn; 4] = [
    SEAS_TYPE,
    ParamColumn {
        key: ParamKey::Down,
        column: "dwn",
        default: ContextDefault::None,
    },
    ParamColumn {
        key: ParamKey::Quarter,
        column: "qtr",
        default: ContextDefault::None,
    },
    ParamColumn {
        key: ParamKey::YardsToGo,
        column: "ydstogo",
        default: ContextDefault::None,
    },
];

/// Situational parameters understood by play-level scans.
pub const PLAY_SITUATION_KEYS: [ParamKey; 3] =
    [ParamKey::Down, ParamKey::Quarter, ParamKey::YardsToGo];

const RUSH_PLAYS: [FixedPredicate; 1] = [FixedPredicate {
    column: PLAY_TYPE,
    value: FixedValue::Text("RUSH"),
}];

const PASS_PLAYS: [FixedPredicate; 1] = [FixedPredicate {
    column: PLAY_TYPE,
    value: FixedValue::Text("PASS"),
}];

/// Rushing plays, keyed by ball carrier.
pub static PLAYS_RUSHER: Relation = Relation {
    name: "plays_rusher",
    table: PLAYS_TABLE,
    entity_column: "bc_pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::AllWeeks,
    params: &PLAY_SITUATION,
    fixed: &RUSH_PLAYS,
};

/// Pass plays, keyed by targeted receiver.
pub static PLAYS_TARGET: Relation = Relation {
    name: "plays_target",
    table: PLAYS_TABLE,
    entity_column: "trg_pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::AllWeeks,
    params: &PLAY_SITUATION,
    fixed: &PASS_PLAYS,
};

/// Pass plays, keyed by passer.
pub static PLAYS_PASSER: Relation = Relation {
    name: "plays_passer",
    table: PLAYS_TABLE,
    entity_column: "psr_pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::AllWeeks,
    params: &PLAY_SITUATION,
    fixed: &PASS_PLAYS,
};

/// Games a player was active in.
pub static GAMELOGS: Relation = Relation {
    name: "gamelogs",
    table: GAMELOGS_TABLE,
    entity_column: "pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::AllWeeks,
    params: &[SEAS_TYPE],
    fixed: &[FixedPredicate {
        column: "active",
        value: FixedValue::Bool(true),
    }],
};

/// Season fantasy totals per scoring format.
pub static SEASONLOGS: Relation = Relation {
    name: "scoring_format_seasonlogs",
    table: "scoring_format_player_seasonlogs",
    entity_column: "pid",
    year_column: Some("year"),
    week_column: None,
    week_default: WeekDefault::AllWeeks,
    params: &[ParamColumn {
        key: ParamKey::ScoringFormat,
        column: "scoring_format",
        default: ContextDefault::ScoringFormat,
    }],
    fixed: &[],
};

/// Projections; week 0 holds the season-long projection.
pub static PROJECTIONS: Relation = Relation {
    name: "projections",
    table: "projections_index",
    entity_column: "pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::Fixed(0),
    params: &[
        ParamColumn {
            key: ParamKey::Source,
            column: "sourceid",
            default: ContextDefault::ProjectionSource,
        },
        SEAS_TYPE,
    ],
    fixed: &[],
};

/// Expert consensus rankings; week 0 holds the preseason ranking.
pub static RANKINGS: Relation = Relation {
    name: "rankings",
    table: "player_rankings_index",
    entity_column: "pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::Fixed(0),
    params: &[ParamColumn {
        key: ParamKey::Source,
        column: "source_name",
        default: ContextDefault::RankingSource,
    }],
    fixed: &[FixedPredicate {
        column: "ranking_type",
        value: FixedValue::Text("PPR_REDRAFT"),
    }],
};

const MARKET_SOURCE: [ParamColumn; 1] = [ParamColumn {
    key: ParamKey::Source,
    column: "source_id",
    default: ContextDefault::MarketSource,
}];

const CLOSING_LINES: [FixedPredicate; 1] = [FixedPredicate {
    column: "time_type",
    value: FixedValue::Text("CLOSE"),
}];

/// Table holding every market selection.
pub const MARKETS_TABLE: &str = "prop_market_selections_index";
/// Market classification column of [`MARKETS_TABLE`].
pub const MARKET_TYPE: &str = "market_type";

/// Season-long betting markets (closing lines).
pub static MARKETS_SEASON: Relation = Relation {
    name: "markets_season",
    table: MARKETS_TABLE,
    entity_column: "selection_pid",
    year_column: Some("year"),
    week_column: None,
    week_default: WeekDefault::AllWeeks,
    params: &MARKET_SOURCE,
    fixed: &CLOSING_LINES,
};

/// Single-game betting markets (closing lines), current week by default.
pub static MARKETS_WEEKLY: Relation = Relation {
    name: "markets_weekly",
    table: MARKETS_TABLE,
    entity_column: "selection_pid",
    year_column: Some("year"),
    week_column: Some("week"),
    week_default: WeekDefault::Current,
    params: &MARKET_SOURCE,
    fixed: &CLOSING_LINES,
};
