//! Static read-only classification of submitted SQL.
//!
//! This is a keyword allow/deny list over the raw text, not a parser and not a
//! security boundary. Deny patterns run before the allow patterns so a valid
//! `SELECT` prefix never hides a trailing statement.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codes;

/// Longest accepted statement, in characters of the unstripped input.
pub const MAX_SQL_CHARS: usize = 5000;

/// Checked in order; the first match wins. Patterns with a capture group name
/// the offending keyword.
static DANGEROUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(DROP|CREATE|ALTER|TRUNCATE|DELETE|UPDATE|INSERT)\b",
        r"\b(GRANT|REVOKE|EXECUTE|EXEC)\b",
        r";\s*\w+",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("dangerous pattern compiles"))
    .collect()
});

static ALLOWED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*SELECT(\s+|$)",
        r"^\s*WITH\s+.+\s+SELECT\s+",
        r"^\s*\(\s*SELECT\s+",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("allowed pattern compiles"))
    .collect()
});

/// Why a statement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptySql,
    SqlTooLong,
    InvalidSql,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EmptySql => codes::EMPTY_SQL,
            ErrorCode::SqlTooLong => codes::SQL_TOO_LONG,
            ErrorCode::InvalidSql => codes::INVALID_SQL,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`validate_sql`].
///
/// Serializes as `{"valid": true}` or
/// `{"valid": false, "error_code": "...", "error_message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "VerdictBody")]
pub enum ValidationVerdict {
    Valid,
    Invalid { code: ErrorCode, message: String },
}

impl ValidationVerdict {
    fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        ValidationVerdict::Invalid {
            code,
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ValidationVerdict::Valid => None,
            ValidationVerdict::Invalid { code, .. } => Some(*code),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ValidationVerdict::Valid => None,
            ValidationVerdict::Invalid { message, .. } => Some(message),
        }
    }
}

#[derive(Serialize)]
struct VerdictBody {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl From<ValidationVerdict> for VerdictBody {
    fn from(verdict: ValidationVerdict) -> Self {
        match verdict {
            ValidationVerdict::Valid => VerdictBody {
                valid: true,
                error_code: None,
                error_message: None,
            },
            ValidationVerdict::Invalid { code, message } => VerdictBody {
                valid: false,
                error_code: Some(code),
                error_message: Some(message),
            },
        }
    }
}

/// Classify `sql` as executable (read-only) or rejected.
pub fn validate_sql(sql: &str) -> ValidationVerdict {
    let stripped = sql.trim();
    if stripped.is_empty() {
        return ValidationVerdict::invalid(ErrorCode::EmptySql, "no SQL was provided");
    }

    if sql.chars().count() > MAX_SQL_CHARS {
        return ValidationVerdict::invalid(
            ErrorCode::SqlTooLong,
            format!("SQL is too long (max {MAX_SQL_CHARS} characters)"),
        );
    }

    let upper = stripped.to_uppercase();

    for pattern in DANGEROUS_PATTERNS.iter() {
        let Some(captures) = pattern.captures(&upper) else {
            continue;
        };
        let message = match captures.get(1) {
            Some(keyword) => format!("{} statement cannot be executed", keyword.as_str()),
            None => "multiple statements cannot be executed".to_string(),
        };
        return ValidationVerdict::invalid(ErrorCode::InvalidSql, message);
    }

    if !ALLOWED_PATTERNS.iter().any(|pattern| pattern.is_match(&upper)) {
        return ValidationVerdict::invalid(
            ErrorCode::InvalidSql,
            "only SELECT statements may be executed",
        );
    }

    ValidationVerdict::Valid
}

/// Same as [`validate_sql`], treating a missing statement as empty.
pub fn validate_sql_opt(sql: Option<&str>) -> ValidationVerdict {
    validate_sql(sql.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(sql: &str) -> Option<ErrorCode> {
        validate_sql(sql).error_code()
    }

    #[test]
    fn blank_input_is_empty_before_anything_else() {
        assert_eq!(code_of(""), Some(ErrorCode::EmptySql));
        assert_eq!(code_of("   \n\t"), Some(ErrorCode::EmptySql));
        assert_eq!(
            validate_sql_opt(None).error_code(),
            Some(ErrorCode::EmptySql)
        );
    }

    #[test]
    fn length_counts_the_unstripped_input() {
        let padded = format!("SELECT 1{}", " ".repeat(MAX_SQL_CHARS));
        assert_eq!(code_of(&padded), Some(ErrorCode::SqlTooLong));

        let at_limit = format!("SELECT 1{}", " ".repeat(MAX_SQL_CHARS - 8));
        assert!(validate_sql(&at_limit).is_valid());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let sql = format!("SELECT '{}'", "é".repeat(3000));
        assert!(validate_sql(&sql).is_valid());
    }

    #[test]
    fn keyword_message_names_the_match() {
        let verdict = validate_sql("select * from t where x in (select 1) and delete");
        assert_eq!(
            verdict.error_message(),
            Some("DELETE statement cannot be executed")
        );
    }

    #[test]
    fn first_group_wins_over_later_groups() {
        let verdict = validate_sql("GRANT ALL ON t TO x; DROP TABLE t");
        assert_eq!(verdict.error_message(), Some("DROP statement cannot be executed"));
    }

    #[test]
    fn execute_is_preferred_over_exec() {
        let verdict = validate_sql("EXECUTE plan_a");
        assert_eq!(
            verdict.error_message(),
            Some("EXECUTE statement cannot be executed")
        );
    }

    #[test]
    fn keywords_inside_identifiers_do_not_match() {
        assert!(validate_sql("SELECT created_at, updated_by FROM t").is_valid());
        assert!(validate_sql("SELECT dropped FROM t").is_valid());
    }

    #[test]
    fn trailing_semicolon_alone_is_accepted() {
        assert!(validate_sql("SELECT 1;").is_valid());
        assert!(validate_sql("SELECT 1;   ").is_valid());
    }

    #[test]
    fn second_statement_is_rejected_generically() {
        let verdict = validate_sql("SELECT 1; SELECT 2");
        assert_eq!(verdict.error_code(), Some(ErrorCode::InvalidSql));
        assert_eq!(
            verdict.error_message(),
            Some("multiple statements cannot be executed")
        );
    }

    #[test]
    fn cte_requires_a_select_body() {
        assert!(validate_sql("WITH x AS (SELECT 1) SELECT * FROM x").is_valid());
        assert_eq!(code_of("WITH x AS (VALUES (1)) TABLE x"), Some(ErrorCode::InvalidSql));
    }

    #[test]
    fn bare_select_is_accepted() {
        assert!(validate_sql("SELECT").is_valid());
        assert!(validate_sql("  select\n*\nfrom t  ").is_valid());
        assert_eq!(code_of("SELECTX FROM t"), Some(ErrorCode::InvalidSql));
    }

    #[test]
    fn verdict_serializes_flat() {
        let valid = serde_json::to_value(ValidationVerdict::Valid).expect("serialize verdict");
        assert_eq!(valid, serde_json::json!({ "valid": true }));

        let invalid = serde_json::to_value(validate_sql("")).expect("serialize verdict");
        assert_eq!(
            invalid,
            serde_json::json!({
                "valid": false,
                "error_code": "EMPTY_SQL",
                "error_message": "no SQL was provided"
            })
        );
    }
}
