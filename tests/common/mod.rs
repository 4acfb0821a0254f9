//! Shared fixture: a small league database in in-memory SQLite.
//!
//! Players and their 2023 regular-season rushing totals:
//!
//! ```text
//! pid   name          pos  team  2023 rush yards  2022 rush yards  2023 games
//! RB01  Alan Runner   RB   KC    50 (2 carries)   100              2
//! RB02  Bo Back       RB   BUF   80 (3 carries)   10               2 (+1 inactive)
//! RB03  Cy Carry      RB   KC    65 (2 carries)   -                0
//! WR01  Di Catch      WR   KC    -                -                2
//! ```
//!
//! WR01 has 3 targets (2 receptions, 42 yards) on KC's 3 pass plays.

#![allow(dead_code)]

use serde_json::{Map, Value};
use statline::prelude::*;

pub const SCHEMA: &str = r#"
CREATE TABLE player (
    pid TEXT PRIMARY KEY,
    fname TEXT, lname TEXT, pos TEXT, current_nfl_team TEXT, dob TEXT,
    height INTEGER, weight INTEGER, nfl_draft_year INTEGER, dpos INTEGER, col TEXT
);

CREATE TABLE nfl_plays (
    esbid TEXT, year INTEGER, week INTEGER, seas_type TEXT,
    dwn INTEGER, qtr INTEGER, ydstogo INTEGER,
    play_type TEXT, off TEXT,
    bc_pid TEXT, trg_pid TEXT, psr_pid TEXT,
    rush_yds INTEGER, recv_yds INTEGER, pass_yds INTEGER, air_yds INTEGER,
    comp INTEGER, td INTEGER, first_down INTEGER
);

CREATE TABLE player_gamelogs (
    pid TEXT, esbid TEXT, year INTEGER, week INTEGER, seas_type TEXT, tm TEXT, active INTEGER,
    py INTEGER, ry INTEGER, recy INTEGER, tdp INTEGER, tdr INTEGER, tdrec INTEGER, fuml INTEGER
);

CREATE TABLE scoring_format_player_seasonlogs (
    pid TEXT, year INTEGER, scoring_format TEXT,
    points REAL, points_per_game REAL, points_rnk INTEGER, points_pos_rnk INTEGER
);

CREATE TABLE projections_index (
    pid TEXT, year INTEGER, week INTEGER, sourceid TEXT, seas_type TEXT,
    py REAL, ry REAL, rec REAL, recy REAL
);

CREATE TABLE player_rankings_index (
    pid TEXT, year INTEGER, week INTEGER, source_name TEXT, ranking_type TEXT,
    avg REAL, min INTEGER, max INTEGER
);

CREATE TABLE prop_market_selections_index (
    selection_pid TEXT, year INTEGER, week INTEGER, source_id TEXT, time_type TEXT,
    market_type TEXT, selection_metric_line REAL, odds_american INTEGER
);
"#;

pub const DATA: &str = r#"
INSERT INTO player (pid, fname, lname, pos, current_nfl_team) VALUES
    ('RB01', 'Alan', 'Runner', 'RB', 'KC'),
    ('RB02', 'Bo', 'Back', 'RB', 'BUF'),
    ('RB03', 'Cy', 'Carry', 'RB', 'KC'),
    ('WR01', 'Di', 'Catch', 'WR', 'KC');

INSERT INTO nfl_plays
    (esbid, year, week, seas_type, dwn, qtr, ydstogo, play_type, off,
     bc_pid, trg_pid, psr_pid, rush_yds, recv_yds, pass_yds, air_yds, comp, td, first_down)
VALUES
    ('G1', 2023, 1, 'REG', 1, 1, 10, 'RUSH', 'KC',  'RB01', NULL, NULL, 20, NULL, NULL, NULL, NULL, 0, 1),
    ('G2', 2023, 2, 'REG', 2, 2, 7,  'RUSH', 'KC',  'RB01', NULL, NULL, 30, NULL, NULL, NULL, NULL, 1, 1),
    ('G1', 2023, 1, 'REG', 1, 1, 10, 'RUSH', 'BUF', 'RB02', NULL, NULL, 40, NULL, NULL, NULL, NULL, 1, 1),
    ('G1', 2023, 1, 'REG', 3, 3, 2,  'RUSH', 'BUF', 'RB02', NULL, NULL, 25, NULL, NULL, NULL, NULL, 0, 1),
    ('G3', 2023, 2, 'REG', 1, 4, 10, 'RUSH', 'BUF', 'RB02', NULL, NULL, 15, NULL, NULL, NULL, NULL, 0, 0),
    ('G1', 2023, 1, 'REG', 2, 2, 5,  'RUSH', 'KC',  'RB03', NULL, NULL, 60, NULL, NULL, NULL, NULL, 1, 1),
    ('G2', 2023, 2, 'REG', 3, 4, 1,  'RUSH', 'KC',  'RB03', NULL, NULL, 5,  NULL, NULL, NULL, NULL, 0, 1),
    ('G1', 2023, 1, 'REG', 1, 1, 10, 'PASS', 'KC',  NULL, 'WR01', NULL, NULL, 12, 12, 8, 1, 0, 1),
    ('G1', 2023, 1, 'REG', 2, 3, 6,  'PASS', 'KC',  NULL, 'WR01', NULL, NULL, 30, 30, 25, 1, 1, 1),
    ('G2', 2023, 2, 'REG', 3, 2, 8,  'PASS', 'KC',  NULL, 'WR01', NULL, NULL, 0, 0, 14, 0, 0, 0),
    ('G0', 2022, 1, 'REG', 1, 1, 10, 'RUSH', 'KC',  'RB01', NULL, NULL, 100, NULL, NULL, NULL, NULL, 1, 1),
    ('G9', 2022, 1, 'REG', 1, 1, 10, 'RUSH', 'BUF', 'RB02', NULL, NULL, 10, NULL, NULL, NULL, NULL, 0, 0);

INSERT INTO player_gamelogs (pid, esbid, year, week, seas_type, tm, active, py, ry, recy, tdp, tdr, tdrec, fuml) VALUES
    ('RB01', 'G1', 2023, 1, 'REG', 'KC',  1, 0, 20, NULL, 0, 0, 0, 0),
    ('RB01', 'G2', 2023, 2, 'REG', 'KC',  1, 0, 30, NULL, 0, 1, 0, 1),
    ('RB02', 'G1', 2023, 1, 'REG', 'BUF', 1, 0, 65, 5,    0, 1, 0, 0),
    ('RB02', 'G3', 2023, 2, 'REG', 'BUF', 1, 0, 15, NULL, 0, 0, 0, 0),
    ('RB02', 'G4', 2023, 3, 'REG', 'BUF', 0, 0, 0,  0,    0, 0, 0, 0),
    ('WR01', 'G1', 2023, 1, 'REG', 'KC',  1, 0, 0,  42,   0, 0, 1, 0),
    ('WR01', 'G2', 2023, 2, 'REG', 'KC',  1, 0, 0,  0,    0, 0, 0, 0);

INSERT INTO scoring_format_player_seasonlogs (pid, year, scoring_format, points, points_per_game, points_rnk, points_pos_rnk) VALUES
    ('RB01', 2023, 'ppr', 120.5, 10.0, 3, 2),
    ('RB01', 2023, 'half_ppr', 110.0, 9.0, 3, 2),
    ('RB01', 2022, 'ppr', 210.0, 14.0, 1, 1),
    ('RB02', 2023, 'ppr', 150.0, 12.5, 1, 1),
    ('WR01', 2023, 'ppr', 130.0, 11.0, 2, 1);

INSERT INTO projections_index (pid, year, week, sourceid, seas_type, py, ry, rec, recy) VALUES
    ('RB01', 2023, 0, 'average', 'REG', 0, 900.0, 30.0, 250.0),
    ('RB01', 2023, 1, 'average', 'REG', 0, 60.0, 2.0, 15.0),
    ('RB02', 2023, 0, 'average', 'REG', 0, 1100.0, 40.0, 300.0);

INSERT INTO player_rankings_index (pid, year, week, source_name, ranking_type, avg, min, max) VALUES
    ('RB01', 2023, 0, 'fantasypros', 'PPR_REDRAFT', 12.5, 8, 20),
    ('RB02', 2023, 0, 'fantasypros', 'PPR_REDRAFT', 6.0, 3, 9),
    ('RB02', 2023, 0, 'fantasypros', 'HALF_PPR_REDRAFT', 7.0, 4, 10);

INSERT INTO prop_market_selections_index (selection_pid, year, week, source_id, time_type, market_type, selection_metric_line, odds_american) VALUES
    ('RB01', 2023, 1, 'draftkings', 'CLOSE', 'GAME_RUSHING_YARDS', 45.5, -110),
    ('RB01', 2023, 2, 'draftkings', 'CLOSE', 'GAME_RUSHING_YARDS', 38.5, -110),
    ('RB01', 2023, 1, 'draftkings', 'OPEN',  'GAME_RUSHING_YARDS', 50.5, -110),
    ('RB01', 2023, NULL, 'draftkings', 'CLOSE', 'SEASON_RUSHING_YARDS', 850.5, -115),
    ('RB02', 2023, 1, 'draftkings', 'CLOSE', 'GAME_RUSHING_YARDS', 60.5, -110);
"#;

/// Resolution context of the fixture: 2023 regular season, week 1.
pub fn context() -> ResolutionContext {
    ResolutionContext::default().with_year(2023).with_week(1)
}

pub fn options() -> CompileOptions {
    CompileOptions::default()
        .with_context(context())
        .with_dialect(Dialect::Sqlite)
}

pub fn storage() -> SqliteStorage {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.execute_batch(SCHEMA).unwrap();
    storage.execute_batch(DATA).unwrap();
    storage
}

pub fn engine() -> Engine<SqliteStorage> {
    Engine::new(storage(), options())
}

/// Execute a table state, panicking with the statement on failure.
pub async fn run(state: Value) -> QueryOutput {
    let engine = engine();
    match engine.execute(&state).await {
        Ok(output) => output,
        Err(e) => {
            let sql = engine.compile(&state).map(|c| c.sql).unwrap_or_default();
            panic!("execution failed: {}\nSQL:\n{}", e, sql)
        }
    }
}

/// Values of one output column, in row order.
pub fn column(output: &QueryOutput, name: &str) -> Vec<Value> {
    output
        .rows
        .iter()
        .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

/// The row of one player.
pub fn row<'a>(output: &'a QueryOutput, pid: &str) -> &'a Map<String, Value> {
    output
        .rows
        .iter()
        .find(|r| r.get("pid") == Some(&Value::from(pid)))
        .unwrap_or_else(|| panic!("no row for {}", pid))
}
