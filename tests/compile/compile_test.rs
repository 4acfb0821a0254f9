//! Integration tests for the table-state → SQL compilation pipeline.
//!
//! These tests check properties of the emitted statement without running
//! it: determinism, grouping, join types, ordinals and dialect syntax.

use serde_json::{json, Value};
use sqlparser::dialect::{PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use statline::compile::{compile_json, CompileOptions, CompileOutput};
use statline::compiler::{CompileError, OutputKind};
use statline::registry::{ResolutionContext, SplitDimension};
use statline::sql::{Dialect, JoinType};
use statline::Error;

fn options(dialect: Dialect) -> CompileOptions {
    CompileOptions::default()
        .with_context(ResolutionContext::default().with_year(2023))
        .with_dialect(dialect)
}

fn compile(state: Value) -> CompileOutput {
    compile_json(&state, &options(Dialect::Postgres)).unwrap()
}

fn assert_parses(sql: &str, dialect: Dialect) {
    let result = match dialect {
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
        Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql),
    };
    assert!(result.is_ok(), "invalid {} SQL: {:?}\n{}", dialect, result, sql);
}

fn wide_state() -> Value {
    json!({
        "prefix_columns": ["player_name", "position", "team"],
        "columns": [
            "rush_yards",
            {"column_id": "rush_yards", "params": {"year": 2022}},
            {"column_id": "rush_yards", "params": {"rate_type": "per_team_rush_play", "qtr": [1, 2]}},
            {"column_id": "targets", "params": {"rate_type": "per_game"}},
            "catch_rate",
            {"column_id": "pass_yards", "params": {"ydstogo": {"min": 5}}},
            "fantasy_points",
            {"column_id": "fantasy_points", "params": {"year_offset": 1}},
            "projected_receptions",
            "rank_min",
            "anytime_td_odds",
            "season_receiving_yards_line",
            "total_touchdowns"
        ],
        "where": [
            {"column_id": "position", "operator": "IN", "value": ["RB", "WR", "TE"]},
            {"column_id": "last_name", "operator": "NOT LIKE", "value": "%son"},
            {"column_id": "targets", "operator": ">=", "value": 10},
            {"column_id": "rank_min", "operator": "<=", "value": 24},
            {"column_id": "rush_tds", "operator": "IS NOT NULL"}
        ],
        "sort": [
            {"column_id": "fantasy_points", "column_index": 1, "desc": true},
            {"column_id": "player_name", "desc": false}
        ],
        "splits": ["year"],
        "offset": 50,
        "limit": 25
    })
}

// ============================================================================
// Syntax
// ============================================================================

#[test]
fn test_wide_state_parses_in_both_dialects() {
    for dialect in [Dialect::Postgres, Dialect::Sqlite] {
        let output = compile_json(&wide_state(), &options(dialect)).unwrap();
        println!("Generated SQL:\n{}", output.sql);
        assert_parses(&output.sql, dialect);
    }
}

#[test]
fn test_week_split_parses() {
    let output = compile(json!({
        "columns": [
            "rush_yards",
            {"column_id": "targets", "params": {"rate_type": "per_team_pass_play"}},
            "game_receiving_yards_line",
            "projected_rec_yards"
        ],
        "splits": ["year", "week"]
    }));
    assert_parses(&output.sql, Dialect::Postgres);
}

// ============================================================================
// Determinism and Grouping
// ============================================================================

#[test]
fn test_compilation_is_deterministic() {
    let first = compile(wide_state());
    let second = compile(wide_state());
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.plan, second.plan);
}

#[test]
fn test_equal_parameters_share_one_group() {
    let output = compile(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"year": 2023}},
            {"column_id": "rush_tds", "params": {"year": 2023.0, "seas_type": "REG"}},
            {"column_id": "rush_attempts", "params": {"year": [2023]}}
        ],
        "where": [{"column_id": "rush_first_downs", "operator": ">", "value": 1}]
    }));

    assert_eq!(output.plan.pre_aggregations.len(), 1);
    assert_eq!(output.plan.joins.len(), 1);
    assert_eq!(output.sql.matches("JOIN").count(), 1);
}

#[test]
fn test_aliases_do_not_depend_on_request_order() {
    let a = compile(json!({"columns": [
        {"column_id": "rush_yards", "params": {"seas_type": "POST", "year": 2021}}
    ]}));
    let b = compile(json!({"columns": [
        {"column_id": "rush_yards", "params": {"year": 2021, "seas_type": "POST"}}
    ]}));
    assert_eq!(a.plan.joins[0].alias, b.plan.joins[0].alias);
    assert!(a.plan.joins[0].alias.starts_with('t'));
    assert_eq!(a.plan.joins[0].alias.len(), 17);
}

#[test]
fn test_distinct_parameters_get_distinct_groups() {
    let output = compile(json!({
        "columns": [
            {"column_id": "rush_yards", "params": {"year": 2023}},
            {"column_id": "rush_yards", "params": {"year": 2022}}
        ]
    }));
    assert_eq!(output.plan.pre_aggregations.len(), 2);
    assert_ne!(output.plan.joins[0].alias, output.plan.joins[1].alias);
}

// ============================================================================
// Join Types
// ============================================================================

#[test]
fn test_join_types_follow_filters() {
    let output = compile(json!({
        "columns": ["rush_yards", "targets", "fantasy_points"],
        "where": [{"column_id": "receptions", "operator": ">", "value": 5}]
    }));

    let plan = &output.plan;
    let receiving = &plan.joins[0];
    assert_eq!(receiving.kind, "fact");
    assert_eq!(receiving.join_type(), JoinType::Inner);
    assert!(plan.joins[1..].iter().all(|j| j.join_type() == JoinType::Left));
}

#[test]
fn test_attribute_filters_add_no_joins() {
    let output = compile(json!({
        "columns": ["player_name"],
        "where": [{"column_id": "position", "operator": "=", "value": "QB"}]
    }));
    assert!(output.plan.joins.is_empty());
    assert!(output.sql.contains("WHERE \"player\".\"pos\" = 'QB'"));
}

// ============================================================================
// Output Columns and Ordering
// ============================================================================

#[test]
fn test_output_columns() {
    let output = compile(json!({
        "prefix_columns": ["player_name"],
        "columns": ["rush_yards", "rush_yards"],
        "splits": ["week", "year"]
    }));

    let kinds: Vec<&OutputKind> = output.output_columns().iter().map(|c| &c.kind).collect();
    assert_eq!(kinds[0], &OutputKind::Entity);
    assert_eq!(
        kinds[1],
        &OutputKind::Split {
            dimension: SplitDimension::Year
        }
    );
    assert_eq!(
        kinds[2],
        &OutputKind::Split {
            dimension: SplitDimension::Week
        }
    );
    assert_eq!(
        output.plan.output_names(),
        vec!["pid", "year", "week", "player_name_0", "rush_yards_0", "rush_yards_1"]
    );
}

#[test]
fn test_sort_uses_occurrence_ordinal() {
    let output = compile(json!({
        "columns": ["rush_yards", "rush_yards"],
        "sort": [{"column_id": "rush_yards", "column_index": 1, "desc": true}]
    }));
    assert!(output
        .sql
        .contains("ORDER BY 3 DESC NULLS LAST, 1 ASC NULLS LAST"));
}

#[test]
fn test_sort_only_column_is_selected() {
    let output = compile(json!({
        "columns": ["player_name"],
        "sort": [{"column_id": "fantasy_points", "desc": true}]
    }));
    assert_eq!(
        output.plan.output_names(),
        vec!["pid", "player_name_0", "fantasy_points_0"]
    );
    assert!(output.sql.contains("ORDER BY 3 DESC NULLS LAST"));
}

#[test]
fn test_rate_divides_by_denominator() {
    let output = compile(json!({
        "columns": [{"column_id": "rush_yards", "params": {"rate_type": "per_game"}}]
    }));
    let plan = &output.plan;
    let numerator = &plan.joins[0].alias;
    let denominator = &plan.joins[1].alias;
    assert_eq!(plan.joins[1].kind, "rate");

    let expected = format!(
        "\"{}\".\"rush_yards\" * 1.0 / NULLIF(\"{}\".\"rate_denominator\", 0) AS \"rush_yards_0\"",
        numerator, denominator
    );
    assert!(output.sql.contains(&expected), "{}", output.sql);
    assert!(output.sql.contains("COUNT(DISTINCT \"g\".\"esbid\") AS \"rate_denominator\""));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_compile_errors() {
    let opts = options(Dialect::Postgres);
    let cases = [
        (json!({"columns": ["rush_yardz"]}), "rush_yardz"),
        (
            json!({"columns": [{"column_id": "catch_rate", "params": {"rate_type": "per_game"}}]}),
            "catch_rate",
        ),
        (
            json!({"columns": [{"column_id": "rush_yards", "params": {"rate_type": "per_fortnight"}}]}),
            "rush_yards",
        ),
        (
            json!({"columns": [{"column_id": "rush_yards", "params": {"dwn": {"min": 4, "max": 1}}}]}),
            "rush_yards",
        ),
        (
            json!({"columns": [{"column_id": "fantasy_points", "params": {"year": [2022, 2023]}}]}),
            "fantasy_points",
        ),
        (
            json!({"columns": ["rush_yards"], "sort": [{"column_id": "rush_yards", "column_index": 2}]}),
            "rush_yards",
        ),
        (
            json!({"columns": [{"column_id": "fantasy_points", "params": {"year_offset": i64::MIN}}]}),
            "fantasy_points",
        ),
        (
            json!({"columns": [{"column_id": "rush_yards", "params": {"year": i64::MAX, "year_offset": -1}}]}),
            "rush_yards",
        ),
    ];

    for (state, column) in cases {
        match compile_json(&state, &opts) {
            Err(Error::Compile(err)) => {
                assert!(err.to_string().contains(column), "{}", err);
            }
            other => panic!("expected a compile error for {}, got {:?}", state, other),
        }
    }
}

#[test]
fn test_like_requires_text_column() {
    let err = compile_json(
        &json!({
            "columns": ["rush_yards"],
            "where": [{"column_id": "rush_yards", "operator": "LIKE", "value": "1%"}]
        }),
        &options(Dialect::Postgres),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Compile(CompileError::UnsupportedOperator { .. })
    ));
}
