//! Integration tests executing compiled table states against SQLite.
//!
//! See `tests/common/mod.rs` for the fixture league.

#[path = "../common/mod.rs"]
mod common;

use common::{column, row, run};
use serde_json::{json, Value};
use statline::prelude::*;

// ============================================================================
// Sorting and Pagination
// ============================================================================

#[tokio::test]
async fn test_top_rushers_sorted_and_limited() {
    let output = run(json!({
        "columns": ["rush_yards"],
        "sort": [{"column_id": "rush_yards", "desc": true}],
        "limit": 2
    }))
    .await;

    assert_eq!(column(&output, "rush_yards_0"), vec![json!(80), json!(65)]);
    assert_eq!(column(&output, "pid"), vec![json!("RB02"), json!("RB03")]);
    assert_eq!(output.columns, vec!["pid", "rush_yards_0"]);
}

#[tokio::test]
async fn test_offset_skips_rows() {
    let output = run(json!({
        "columns": ["rush_yards"],
        "sort": [{"column_id": "rush_yards", "desc": true}],
        "offset": 1,
        "limit": 2
    }))
    .await;

    assert_eq!(column(&output, "rush_yards_0"), vec![json!(65), json!(50)]);
}

#[tokio::test]
async fn test_sort_by_second_occurrence() {
    let output = run(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"year": 2023}},
            {"column_id": "rush_yards", "params": {"year": 2022}}
        ],
        "sort": [{"column_id": "rush_yards", "column_index": 1, "desc": true}]
    }))
    .await;

    // NULLs last, ties broken by pid
    assert_eq!(
        column(&output, "pid"),
        vec![json!("RB01"), json!("RB02"), json!("RB03"), json!("WR01")]
    );
}

#[tokio::test]
async fn test_ascending_sort_keeps_nulls_last() {
    let output = run(json!({
        "columns": ["player_name", "rush_yards"],
        "sort": [{"column_id": "rush_yards", "desc": false}]
    }))
    .await;

    assert_eq!(
        column(&output, "rush_yards_0"),
        vec![json!(50), json!(65), json!(80), Value::Null]
    );
}

// ============================================================================
// Parameters
// ============================================================================

#[tokio::test]
async fn test_same_column_with_two_years() {
    let output = run(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"year": 2023}},
            {"column_id": "rush_yards", "params": {"year": 2022}}
        ]
    }))
    .await;

    assert_eq!(output.rows.len(), 4);
    assert_eq!(row(&output, "RB01")["rush_yards_0"], json!(50));
    assert_eq!(row(&output, "RB01")["rush_yards_1"], json!(100));
    assert_eq!(row(&output, "RB02")["rush_yards_1"], json!(10));
    assert_eq!(row(&output, "RB03")["rush_yards_0"], json!(65));
    assert_eq!(row(&output, "RB03")["rush_yards_1"], Value::Null);
    assert_eq!(row(&output, "WR01")["rush_yards_0"], Value::Null);
}

#[tokio::test]
async fn test_situational_parameters() {
    let output = run(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"dwn": 1}},
            {"column_id": "rush_yards", "params": {"dwn": {"min": 2, "max": 3}}}
        ]
    }))
    .await;

    assert_eq!(row(&output, "RB01")["rush_yards_0"], json!(20));
    assert_eq!(row(&output, "RB01")["rush_yards_1"], json!(30));
    assert_eq!(row(&output, "RB02")["rush_yards_0"], json!(55));
    assert_eq!(row(&output, "RB02")["rush_yards_1"], json!(25));
    assert_eq!(row(&output, "RB03")["rush_yards_0"], Value::Null);
    assert_eq!(row(&output, "RB03")["rush_yards_1"], json!(65));
}

#[tokio::test]
async fn test_game_log_totals_skip_inactive_games() {
    let output = run(json!({"columns": ["games_played", "total_yards"]})).await;

    assert_eq!(row(&output, "RB02")["games_played_0"], json!(2));
    assert_eq!(row(&output, "RB02")["total_yards_0"], json!(85));
    assert_eq!(row(&output, "WR01")["total_yards_0"], json!(42));
    assert_eq!(row(&output, "RB03")["games_played_0"], Value::Null);
}

#[tokio::test]
async fn test_direct_relations_use_context_defaults() {
    let output = run(json!({
        "columns": [
            "fantasy_points",
            "rank_avg",
            "projected_rush_yards",
            "game_rushing_yards_line",
            "season_rushing_yards_line"
        ]
    }))
    .await;

    let rb1 = row(&output, "RB01");
    assert_eq!(rb1["fantasy_points_0"], json!(120.5));
    assert_eq!(rb1["rank_avg_0"], json!(12.5));
    assert_eq!(rb1["projected_rush_yards_0"], json!(900.0));
    assert_eq!(rb1["game_rushing_yards_line_0"], json!(45.5));
    assert_eq!(rb1["season_rushing_yards_line_0"], json!(850.5));

    let rb2 = row(&output, "RB02");
    assert_eq!(rb2["rank_avg_0"], json!(6.0));
    assert_eq!(rb2["game_rushing_yards_line_0"], json!(60.5));
    assert_eq!(rb2["season_rushing_yards_line_0"], Value::Null);
}

#[tokio::test]
async fn test_direct_relation_explicit_parameters() {
    let output = run(json!({
        "columns": [
            {"column_id": "fantasy_points", "params": {"scoring_format": "half_ppr"}},
            {"column_id": "game_rushing_yards_line", "params": {"week": 2}},
            {"column_id": "fantasy_points", "params": {"year_offset": 1}}
        ]
    }))
    .await;

    let rb1 = row(&output, "RB01");
    assert_eq!(rb1["fantasy_points_0"], json!(110.0));
    assert_eq!(rb1["game_rushing_yards_line_0"], json!(38.5));
    assert_eq!(rb1["fantasy_points_1"], json!(210.0));
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn test_aggregate_filter_restricts_rows() {
    let output = run(json!({
        "columns": ["player_name", "rush_yards"],
        "where": [{"column_id": "rush_yards", "operator": ">", "value": 60}]
    }))
    .await;

    assert_eq!(column(&output, "pid"), vec![json!("RB02"), json!("RB03")]);
    assert_eq!(row(&output, "RB02")["player_name_0"], json!("Bo Back"));
}

#[tokio::test]
async fn test_filter_on_unselected_column() {
    let output = run(json!({
        "columns": ["rush_yards"],
        "where": [{"column_id": "rush_attempts", "operator": ">=", "value": 3}]
    }))
    .await;

    assert_eq!(column(&output, "pid"), vec![json!("RB02")]);
    assert_eq!(output.columns, vec!["pid", "rush_yards_0"]);
}

#[tokio::test]
async fn test_is_null_filter_keeps_unmatched_players() {
    let output = run(json!({
        "columns": ["player_name"],
        "where": [{"column_id": "rush_yards", "operator": "IS NULL"}]
    }))
    .await;

    assert_eq!(column(&output, "pid"), vec![json!("WR01")]);
}

#[tokio::test]
async fn test_attribute_filters() {
    let output = run(json!({
        "columns": ["player_name"],
        "where": [{"column_id": "player_name", "operator": "LIKE", "value": "a%"}]
    }))
    .await;
    assert_eq!(column(&output, "player_name_0"), vec![json!("Alan Runner")]);

    let output = run(json!({
        "columns": ["position"],
        "where": [{"column_id": "position", "operator": "IN", "value": ["WR", "TE"]}]
    }))
    .await;
    assert_eq!(column(&output, "pid"), vec![json!("WR01")]);
}

// ============================================================================
// Rates
// ============================================================================

#[tokio::test]
async fn test_per_game_rate() {
    let output = run(json!({
        "columns": [
            "rush_yards",
            {"column_id": "rush_yards", "params": {"rate_type": "per_game"}}
        ]
    }))
    .await;

    assert_eq!(row(&output, "RB01")["rush_yards_1"], json!(25.0));
    assert_eq!(row(&output, "RB02")["rush_yards_1"], json!(40.0));
    // No game logs: no denominator
    assert_eq!(row(&output, "RB03")["rush_yards_1"], Value::Null);
    assert_eq!(row(&output, "WR01")["rush_yards_1"], Value::Null);
}

#[tokio::test]
async fn test_team_play_rates() {
    let output = run(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"rate_type": "per_team_rush_play"}},
            {"column_id": "targets", "params": {"rate_type": "per_team_pass_play"}}
        ]
    }))
    .await;

    assert_eq!(row(&output, "RB01")["rush_yards_0"], json!(12.5));
    assert_eq!(row(&output, "WR01")["targets_0"], json!(1.0));
}

#[tokio::test]
async fn test_rate_filter() {
    let output = run(json!({
        "columns": ["player_name"],
        "where": [{
            "column_id": "rush_yards",
            "operator": ">=",
            "value": 30,
            "params": {"rate_type": "per_game"}
        }]
    }))
    .await;

    assert_eq!(column(&output, "pid"), vec![json!("RB02")]);
}

// ============================================================================
// Splits
// ============================================================================

#[tokio::test]
async fn test_split_by_year() {
    let output = run(json!({
        "columns": [{"column_id": "rush_yards", "params": {"year": [2022, 2023]}}],
        "splits": ["year"]
    }))
    .await;

    assert_eq!(output.columns, vec!["pid", "year", "rush_yards_0"]);
    let rows: Vec<(Value, Value, Value)> = output
        .rows
        .iter()
        .map(|r| (r["pid"].clone(), r["year"].clone(), r["rush_yards_0"].clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (json!("RB01"), json!(2022), json!(100)),
            (json!("RB01"), json!(2023), json!(50)),
            (json!("RB02"), json!(2022), json!(10)),
            (json!("RB02"), json!(2023), json!(80)),
            (json!("RB03"), json!(2023), json!(65)),
            (json!("WR01"), Value::Null, Value::Null),
        ]
    );
}

#[tokio::test]
async fn test_split_columns_coalesce_across_groups() {
    let output = run(json!({
        "columns": ["rush_yards", "targets"],
        "splits": ["year"]
    }))
    .await;

    // One row per player and year, no cross product
    let rows: Vec<(Value, Value, Value, Value)> = output
        .rows
        .iter()
        .map(|r| {
            (
                r["pid"].clone(),
                r["year"].clone(),
                r["rush_yards_0"].clone(),
                r["targets_0"].clone(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (json!("RB01"), json!(2022), json!(100), Value::Null),
            (json!("RB01"), json!(2023), json!(50), Value::Null),
            (json!("RB02"), json!(2022), json!(10), Value::Null),
            (json!("RB02"), json!(2023), json!(80), Value::Null),
            (json!("RB03"), json!(2023), json!(65), Value::Null),
            (json!("WR01"), json!(2023), Value::Null, json!(3)),
        ]
    );
}

#[tokio::test]
async fn test_split_by_week() {
    let output = run(json!({
        "columns": [{"column_id": "rush_yards", "params": {"year": 2023}}],
        "splits": ["year", "week"]
    }))
    .await;

    assert_eq!(output.columns, vec!["pid", "year", "week", "rush_yards_0"]);
    let rb02: Vec<(Value, Value)> = output
        .rows
        .iter()
        .filter(|r| r["pid"] == json!("RB02"))
        .map(|r| (r["week"].clone(), r["rush_yards_0"].clone()))
        .collect();
    assert_eq!(rb02, vec![(json!(1), json!(65)), (json!(2), json!(15))]);
    assert_eq!(output.rows.len(), 7);
}

#[tokio::test]
async fn test_season_value_broadcasts_across_week_rows() {
    let output = run(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"year": 2023}},
            {"column_id": "fantasy_points", "params": {"year": 2023}}
        ],
        "splits": ["year", "week"]
    }))
    .await;

    let rows_for = |pid: &str| -> Vec<(Value, Value, Value, Value)> {
        output
            .rows
            .iter()
            .filter(|r| r["pid"] == json!(pid))
            .map(|r| {
                (
                    r["year"].clone(),
                    r["week"].clone(),
                    r["rush_yards_0"].clone(),
                    r["fantasy_points_0"].clone(),
                )
            })
            .collect()
    };

    // Season-level points repeat on every week row; no extra rows appear
    assert_eq!(
        rows_for("RB01"),
        vec![
            (json!(2023), json!(1), json!(20), json!(120.5)),
            (json!(2023), json!(2), json!(30), json!(120.5)),
        ]
    );
    assert_eq!(
        rows_for("RB02"),
        vec![
            (json!(2023), json!(1), json!(65), json!(150.0)),
            (json!(2023), json!(2), json!(15), json!(150.0)),
        ]
    );
}

#[tokio::test]
async fn test_split_rate_matches_denominator_per_week() {
    let output = run(json!({
        "columns": [{"column_id": "rush_yards", "params": {"year": 2023, "rate_type": "per_game"}}],
        "splits": ["year", "week"]
    }))
    .await;

    let rb01: Vec<Value> = output
        .rows
        .iter()
        .filter(|r| r["pid"] == json!("RB01"))
        .map(|r| r["rush_yards_0"].clone())
        .collect();
    assert_eq!(rb01, vec![json!(20.0), json!(30.0)]);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_storage_errors_propagate() {
    let engine = Engine::new(SqliteStorage::open_in_memory().unwrap(), common::options());
    let err = engine
        .execute(&json!({"columns": ["rush_yards"]}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[tokio::test]
async fn test_invalid_state_never_reaches_storage() {
    let engine = common::engine();
    let err = engine
        .execute(&json!({"columns": ["rush_yards"], "splits": ["week"]}))
        .await
        .unwrap_err();
    match err {
        Error::Validation(errors) => assert!(errors.has_path("splits")),
        other => panic!("expected validation errors, got {:?}", other),
    }
}

#[tokio::test]
async fn test_output_carries_statement() {
    let output = run(json!({"columns": ["rush_yards"]})).await;
    let compiled = common::engine()
        .compile(&json!({"columns": ["rush_yards"]}))
        .unwrap();
    assert_eq!(output.sql, compiled.sql);
}
