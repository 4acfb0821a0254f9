use serde::{Deserialize, Serialize};

/// Defaults applied while resolving column parameters.
///
/// Every alias, join and pre-aggregation decision reads its defaults from
/// one of these, never from global state. Built from the `[defaults]`
/// configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionContext {
    pub year: i64,
    pub week: i64,
    pub seas_type: String,
    pub scoring_format: String,
    pub projection_source: String,
    pub ranking_source: String,
    pub market_source: String,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self {
            year: 2025,
            week: 1,
            seas_type: "REG".into(),
            scoring_format: "ppr".into(),
            projection_source: "average".into(),
            ranking_source: "fantasypros".into(),
            market_source: "draftkings".into(),
        }
    }
}

impl ResolutionContext {
    pub fn with_year(mut self, year: i64) -> Self {
        self.year = year;
        self
    }

    pub fn with_week(mut self, week: i64) -> Self {
        self.week = week;
        self
    }
}
