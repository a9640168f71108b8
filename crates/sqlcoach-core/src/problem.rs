use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::TableSchema;
use crate::values::ResultSet;

/// Difficulty label attached to a generated problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Case-insensitive parse that falls back to [`Difficulty::Medium`].
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// A problem ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewProblem {
    pub theme: String,
    pub difficulty: Difficulty,
    /// Reference query; its result is `expected_result`.
    pub correct_sql: String,
    pub expected_result: ResultSet,
    /// Snapshot of the practice tables the problem was generated against.
    pub table_schemas: Vec<TableSchema>,
    pub hint: Option<String>,
}

/// A persisted problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Problem {
    pub id: i64,
    pub theme: String,
    pub difficulty: Difficulty,
    pub correct_sql: String,
    pub expected_result: ResultSet,
    pub table_schemas: Vec<TableSchema>,
    pub hint: Option<String>,
    pub created_at: DateTime<Utc>,
}
