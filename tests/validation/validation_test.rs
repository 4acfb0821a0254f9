//! Integration tests for table-state validation as seen through the
//! public compile and execute entry points.

#[path = "../common/mod.rs"]
mod common;

use serde_json::json;
use statline::compile::{compile_json, compile_str, CompileOptions};
use statline::config::Settings;
use statline::table_state::ValidationErrors;
use statline::Error;

fn validation_errors(result: statline::Result<impl std::fmt::Debug>) -> ValidationErrors {
    match result {
        Err(Error::Validation(errors)) => errors,
        other => panic!("expected validation errors, got {:?}", other),
    }
}

#[test]
fn test_every_violation_is_reported() {
    let state = json!({
        "prefix_columns": "player_name",
        "columns": [{"column_id": ""}, {"column_id": "rush_yards", "params": {"dwn": [[1]]}}],
        "where": [{"column_id": "position", "operator": "BETWEEN", "value": 1}],
        "sort": ["rush_yards"],
        "splits": ["month"],
        "limit": 0
    });

    let errors = validation_errors(compile_json(&state, &common::options()));
    for path in [
        "prefix_columns",
        "columns[0].column_id",
        "columns[1].params.dwn",
        "where[0].operator",
        "sort[0]",
        "splits[0]",
        "limit",
    ] {
        assert!(errors.has_path(path), "missing error at {}: {}", path, errors);
    }
}

#[test]
fn test_errors_carry_clause_index() {
    let state = json!({
        "where": [
            {"column_id": "position", "operator": "=", "value": "RB"},
            {"column_id": "team", "operator": "IN", "value": "KC"}
        ]
    });

    let errors = validation_errors(compile_json(&state, &common::options()));
    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.path.to_string(), "where[1].value");
    assert_eq!(error.path.clause_index(), Some(1));
    assert!(errors.to_string().starts_with("invalid table state: where[1].value"));
}

#[test]
fn test_week_split_requires_year_split() {
    let errors = validation_errors(compile_json(
        &json!({"columns": ["rush_yards"], "splits": ["week"]}),
        &common::options(),
    ));
    assert!(errors.has_path("splits"));

    let ok = compile_json(
        &json!({"columns": ["rush_yards"], "splits": ["week", "year"]}),
        &common::options(),
    );
    assert!(ok.is_ok());
}

#[test]
fn test_unknown_parameter_key() {
    let errors = validation_errors(compile_json(
        &json!({"columns": [{"column_id": "rush_yards", "params": {"down": 3}}]}),
        &common::options(),
    ));
    assert!(errors.has_path("columns[0].params.down"));
}

#[test]
fn test_range_parameter_shape() {
    let errors = validation_errors(compile_json(
        &json!({"columns": [{"column_id": "rush_yards", "params": {"ydstogo": {"min": 1, "step": 2}}}]}),
        &common::options(),
    ));
    assert!(errors.has_path("columns[0].params.ydstogo"));
}

#[test]
fn test_non_object_state_rejected() {
    for raw in [json!(null), json!("columns"), json!([{"column_id": "rush_yards"}])] {
        let errors = validation_errors(compile_json(&raw, &common::options()));
        assert!(errors.has_path("$"), "{}", errors);
    }
}

#[test]
fn test_malformed_json_text() {
    let err = compile_str("{\"columns\": [", &common::options()).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

// ============================================================================
// Configured limits
// ============================================================================

#[test]
fn test_limits_from_settings() {
    let settings = Settings::from_toml(
        r#"
[query]
default_limit = 20
max_limit = 50
dialect = "sqlite"
"#,
    )
    .unwrap();
    let options = CompileOptions::from_settings(&settings);

    let output = compile_json(&json!({"columns": ["rush_yards"]}), &options).unwrap();
    assert_eq!(output.plan.limit, 20);
    assert!(output.sql.ends_with("LIMIT 20"), "{}", output.sql);

    let errors = validation_errors(compile_json(
        &json!({"columns": ["rush_yards"], "limit": 51}),
        &options,
    ));
    assert!(errors.has_path("limit"));

    let output = compile_json(&json!({"columns": ["rush_yards"], "limit": 50}), &options).unwrap();
    assert_eq!(output.plan.limit, 50);
}

#[tokio::test]
async fn test_invalid_state_never_reaches_storage() {
    let engine = common::engine();
    let err = engine
        .execute(&json!({"columns": ["rush_yards"], "offset": "ten"}))
        .await
        .unwrap_err();

    let Error::Validation(errors) = err else {
        panic!("expected validation errors, got {:?}", err);
    };
    assert!(errors.has_path("offset"));
}
