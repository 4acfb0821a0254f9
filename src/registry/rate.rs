use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Rate normalization applied to a counting column.
///
/// Each variant names the denominator pre-aggregation it divides by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// Games the player was active in.
    PerGame,
    /// Offensive plays run by the player's team in those games.
    PerTeamPlay,
    /// Team pass plays.
    PerTeamPassPlay,
    /// Team rush plays.
    PerTeamRushPlay,
}

impl RateType {
    pub const ALL: [RateType; 4] = [
        RateType::PerGame,
        RateType::PerTeamPlay,
        RateType::PerTeamPassPlay,
        RateType::PerTeamRushPlay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::PerGame => "per_game",
            RateType::PerTeamPlay => "per_team_play",
            RateType::PerTeamPassPlay => "per_team_pass_play",
            RateType::PerTeamRushPlay => "per_team_rush_play",
        }
    }

    /// `play_type` the team-play denominator counts, if restricted.
    pub fn play_type(&self) -> Option<&'static str> {
        match self {
            RateType::PerTeamPassPlay => Some("PASS"),
            RateType::PerTeamRushPlay => Some("RUSH"),
            RateType::PerGame | RateType::PerTeamPlay => None,
        }
    }

    pub fn counts_team_plays(&self) -> bool {
        !matches!(self, RateType::PerGame)
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown rate type '{}'", s))
    }
}
