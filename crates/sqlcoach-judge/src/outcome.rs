use serde::Serialize;
use sqlcoach_core::{Difficulty, ErrorCode, ResultSet, TableSchema};

/// Result of checking a learner's answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerCheck {
    /// The guard refused the SQL; nothing was executed.
    Rejected {
        error_code: ErrorCode,
        error_message: String,
        hint: String,
    },
    /// The SQL passed the guard but the database refused or timed out.
    ExecutionFailed {
        error_code: &'static str,
        error_message: String,
        hint: String,
    },
    Graded(Grade),
}

impl AnswerCheck {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerCheck::Graded(grade) if grade.is_correct)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub is_correct: bool,
    pub message: String,
    pub score: u32,
    /// Only present for incorrect answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_result: Option<ResultSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<ResultSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedProblem {
    pub problem_id: i64,
    pub result: ResultSet,
    pub row_count: usize,
    pub column_names: Vec<String>,
    pub difficulty: Difficulty,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTables {
    pub theme: String,
    pub description: String,
    pub table_count: usize,
    pub statements_executed: usize,
    pub dropped_tables: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOverview {
    pub schemas: Vec<TableSchema>,
    pub theme: String,
    pub table_count: usize,
    pub table_names: Vec<String>,
}
