//! Shared helper functions for SQL dialect implementations.
//!
//! Reusable building blocks that dialects compose to implement the
//! `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Postgres
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: SQLite (booleans are stored as integers)
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit LIMIT ... OFFSET ... (standard SQL).
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(Token::LitInt(lim as i64));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(off as i64));
    }

    ts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Dialect;

    #[test]
    fn test_quote_double_escapes() {
        assert_eq!(quote_double("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_string_single_escapes() {
        assert_eq!(quote_string_single("O'Neil"), "'O''Neil'");
    }

    #[test]
    fn test_limit_offset_standard() {
        let ts = emit_limit_offset_standard(Some(10), Some(20));
        assert_eq!(ts.serialize(Dialect::Postgres), "LIMIT 10 OFFSET 20");

        let ts = emit_limit_offset_standard(None, Some(5));
        assert_eq!(ts.serialize(Dialect::Postgres), "OFFSET 5");
    }
}
