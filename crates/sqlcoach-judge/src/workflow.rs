use sqlcoach_core::{
    NewProblem, TableSchema, ValidationVerdict, infer_theme, results_equal, validate_sql,
};
use sqlcoach_db::{PracticeCatalog, ProblemStore, QueryExecutor};
use sqlcoach_llm::{AnswerSubmission, Tutor};

use crate::error::{JudgeError, JudgeResult};
use crate::options::JudgeOptions;
use crate::outcome::{AnswerCheck, CreatedTables, GeneratedProblem, Grade, TableOverview};

const REJECTED_HINT: &str = "Only SELECT statements can be run. Check your SQL syntax.";
const EXECUTION_HINT: &str =
    "Check your SQL syntax. Make sure the table and column names are spelled correctly.";
const MISMATCH_HINT: &str = "Compare the two results and look for where they differ.";
const DEFAULT_FEEDBACK: &str = "graded";
const DEFAULT_DESCRIPTION: &str = "Practice tables created.";

/// Runs the practice workflows against a database and a tutor.
pub struct Judge<D, T> {
    db: D,
    tutor: T,
    options: JudgeOptions,
}

impl<D, T> Judge<D, T>
where
    D: QueryExecutor + PracticeCatalog + ProblemStore,
    T: Tutor,
{
    pub fn new(db: D, tutor: T) -> Self {
        Self::with_options(db, tutor, JudgeOptions::default())
    }

    pub fn with_options(db: D, tutor: T, options: JudgeOptions) -> Self {
        Self { db, tutor, options }
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn tutor(&self) -> &T {
        &self.tutor
    }

    /// Grade `user_sql` against a stored problem.
    ///
    /// Guard rejections and execution failures are outcomes, not errors: they
    /// are the learner's mistakes. A missing problem or a tutor failure is an
    /// error.
    pub async fn check_answer(&self, problem_id: i64, user_sql: &str) -> JudgeResult<AnswerCheck> {
        if let ValidationVerdict::Invalid { code, message } = validate_sql(user_sql) {
            tracing::info!(event = "answer_rejected", problem_id, code = code.as_str());
            return Ok(AnswerCheck::Rejected {
                error_code: code,
                error_message: message,
                hint: REJECTED_HINT.to_string(),
            });
        }

        let problem = self
            .db
            .get_problem(problem_id)
            .await?
            .ok_or(JudgeError::ProblemNotFound(problem_id))?;

        let user_result = match self
            .db
            .execute_select(user_sql, self.options.answer_timeout)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                tracing::info!(
                    event = "answer_execution_failed",
                    problem_id,
                    code = err.code(),
                    error = %err
                );
                return Ok(AnswerCheck::ExecutionFailed {
                    error_code: err.code(),
                    error_message: err.to_string(),
                    hint: EXECUTION_HINT.to_string(),
                });
            }
        };

        let is_correct = results_equal(&user_result, &problem.expected_result);

        let review = self
            .tutor
            .review_answer(AnswerSubmission {
                user_sql,
                user_result: &user_result,
                expected_result: &problem.expected_result,
                table_schemas: &problem.table_schemas,
            })
            .await?;
        if review.is_correct != is_correct {
            tracing::debug!(
                event = "tutor_verdict_overridden",
                problem_id,
                tutor = review.is_correct,
                comparator = is_correct
            );
        }

        let message = if review.feedback.trim().is_empty() {
            DEFAULT_FEEDBACK.to_string()
        } else {
            review.feedback
        };
        let score = review
            .score
            .unwrap_or(if is_correct { 100 } else { 0 })
            .min(100);

        let grade = if is_correct {
            Grade {
                is_correct,
                message,
                score,
                user_result: None,
                expected_result: None,
                hint: None,
                improvement_suggestions: Vec::new(),
            }
        } else {
            Grade {
                is_correct,
                message,
                score,
                user_result: Some(user_result),
                expected_result: Some(problem.expected_result),
                hint: Some(review.hint.unwrap_or_else(|| MISMATCH_HINT.to_string())),
                improvement_suggestions: review.improvement_suggestions,
            }
        };

        tracing::info!(event = "answer_graded", problem_id, is_correct, score);
        Ok(AnswerCheck::Graded(grade))
    }

    /// Ask the tutor for a problem over the current tables, run its reference
    /// query and store the problem with the real result.
    pub async fn generate_problem(&self, prompt: Option<&str>) -> JudgeResult<GeneratedProblem> {
        self.check_prompt(prompt)?;

        let schemas = self.db.table_schemas().await?;
        if schemas.is_empty() {
            return Err(JudgeError::NoTables);
        }

        let draft = self.tutor.generate_problem(&schemas, prompt).await?;
        let correct_sql = draft.correct_sql.trim().to_string();

        if let ValidationVerdict::Invalid { message, .. } = validate_sql(&correct_sql) {
            tracing::warn!(event = "generated_sql_rejected", reason = %message);
            return Err(JudgeError::ProblemGeneration(format!(
                "reference SQL was rejected ({message}): {}",
                preview(&correct_sql)
            )));
        }

        let expected_result = self
            .db
            .execute_select(&correct_sql, self.options.generation_timeout)
            .await
            .map_err(|err| {
                tracing::warn!(event = "generated_sql_failed", code = err.code(), error = %err);
                JudgeError::ProblemGeneration(format!(
                    "reference SQL could not be executed ({err}): {}",
                    preview(&correct_sql)
                ))
            })?;

        let row_count = expected_result.len();
        if !self.options.expected_rows.contains(&row_count) {
            tracing::warn!(
                event = "generated_row_count_out_of_range",
                row_count,
                min = *self.options.expected_rows.start(),
                max = *self.options.expected_rows.end()
            );
        }

        let column_names: Vec<String> = expected_result
            .first()
            .map(|row| row.columns().map(str::to_string).collect())
            .unwrap_or_default();

        let problem = NewProblem {
            theme: theme_of(&schemas).to_string(),
            difficulty: draft.difficulty,
            correct_sql,
            expected_result,
            table_schemas: schemas,
            hint: draft.hint,
        };
        let problem_id = self.db.save_problem(&problem).await?;

        tracing::info!(
            event = "problem_generated",
            problem_id,
            row_count,
            difficulty = problem.difficulty.as_str()
        );
        Ok(GeneratedProblem {
            problem_id,
            row_count,
            column_names,
            difficulty: problem.difficulty,
            theme: problem.theme,
            result: problem.expected_result,
        })
    }

    /// Replace the practice tables with a fresh set designed by the tutor.
    pub async fn create_tables(&self, prompt: Option<&str>) -> JudgeResult<CreatedTables> {
        self.check_prompt(prompt)?;

        let dropped_tables = self.db.drop_all_user_tables().await?;
        self.db.initialize_system_schema().await?;

        let blueprint = self.tutor.generate_tables(prompt).await?;
        if blueprint.sql_statements.iter().all(|sql| sql.trim().is_empty()) {
            return Err(JudgeError::TableCreation(
                "the tutor returned no SQL statements".to_string(),
            ));
        }

        let statements_executed = self.db.execute_statements(&blueprint.sql_statements).await?;
        let table_count = blueprint.create_table_count();

        tracing::info!(
            event = "tables_created",
            theme = %blueprint.theme,
            table_count,
            statements_executed
        );
        Ok(CreatedTables {
            description: blueprint
                .description
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            theme: blueprint.theme,
            table_count,
            statements_executed,
            dropped_tables,
        })
    }

    /// Describe the current practice tables.
    pub async fn table_overview(&self) -> JudgeResult<TableOverview> {
        let schemas = self.db.table_schemas().await?;
        if schemas.is_empty() {
            return Err(JudgeError::NoTables);
        }

        let table_names: Vec<String> = schemas.iter().map(|t| t.table_name.clone()).collect();
        let theme = theme_of(&schemas).to_string();
        tracing::info!(event = "table_overview", table_count = schemas.len(), theme = %theme);
        Ok(TableOverview {
            table_count: schemas.len(),
            theme,
            table_names,
            schemas,
        })
    }

    fn check_prompt(&self, prompt: Option<&str>) -> JudgeResult<()> {
        let max = self.options.max_prompt_chars;
        match prompt {
            Some(text) if text.chars().count() > max => Err(JudgeError::PromptTooLong { max }),
            _ => Ok(()),
        }
    }
}

fn theme_of(schemas: &[TableSchema]) -> &'static str {
    let names: Vec<&str> = schemas.iter().map(|t| t.table_name.as_str()).collect();
    infer_theme(&names)
}

fn preview(sql: &str) -> String {
    const LIMIT: usize = 100;
    if sql.chars().count() <= LIMIT {
        return sql.to_string();
    }
    let head: String = sql.chars().take(LIMIT).collect();
    format!("{head}...")
}
