//! SQLite SQL dialect.
//!
//! The embedded store used by the CLI and the test fixtures:
//! - ANSI identifier quoting (`"`)
//! - Booleans are integers (1/0)
//! - LIKE is already case-insensitive for ASCII
//! - NULLS FIRST/LAST supported since 3.30

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn case_insensitive_like(&self) -> &'static str {
        "LIKE"
    }
}
