use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlcoach_core::Difficulty;

/// Practice tables proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlueprint {
    pub theme: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sql_statements: Vec<String>,
}

impl TableBlueprint {
    /// Trim statements and drop one dangling trailing comma from each.
    pub fn cleaned(mut self) -> Self {
        for statement in &mut self.sql_statements {
            let trimmed = statement.trim();
            let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
            *statement = trimmed.to_string();
        }
        self
    }

    /// Number of `CREATE TABLE` statements.
    pub fn create_table_count(&self) -> usize {
        self.sql_statements
            .iter()
            .filter(|sql| {
                sql.trim_start()
                    .get(..12)
                    .is_some_and(|head| head.eq_ignore_ascii_case("CREATE TABLE"))
            })
            .count()
    }
}

/// A practice problem proposed by the model.
///
/// `expected_result` is the model's guess; the stored result always comes
/// from running `correct_sql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDraft {
    #[serde(deserialize_with = "lenient_difficulty")]
    pub difficulty: Difficulty,
    pub correct_sql: String,
    pub expected_result: Vec<Value>,
    #[serde(default)]
    pub hint: Option<String>,
}

fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Difficulty, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    Ok(Difficulty::parse_lenient(&label))
}

/// The model's review of a learner's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerReview {
    pub is_correct: bool,
    pub feedback: String,
    /// 0-100; fractional scores are rounded.
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<u32>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let score = Option::<f64>::deserialize(deserializer)?;
    Ok(score
        .filter(|score| score.is_finite())
        .map(|score| score.round().clamp(0.0, 100.0) as u32))
}
