use std::time::Duration;

use async_trait::async_trait;
use sqlcoach_core::{NewProblem, Problem, ResultSet, TableSchema};

use crate::error::DbResult;

/// Runs read-only statements and returns their rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `sql` and collect every row, failing with
    /// [`crate::DbError::Timeout`] once `timeout` elapses.
    async fn execute_select(&self, sql: &str, timeout: Duration) -> DbResult<ResultSet>;
}

/// The learner-facing `public` schema: reset, populate and describe it.
#[async_trait]
pub trait PracticeCatalog: Send + Sync {
    /// Create the `app_system` schema and its `problems` table if missing.
    async fn initialize_system_schema(&self) -> DbResult<()>;

    /// Drop every base table in `public`, cascading to dependents.
    async fn drop_all_user_tables(&self) -> DbResult<usize>;

    /// Run statements in order, skipping blank entries.
    async fn execute_statements(&self, statements: &[String]) -> DbResult<usize>;

    /// Describe every base table in `public`, ordered by name.
    async fn table_schemas(&self) -> DbResult<Vec<TableSchema>>;
}

/// Persistence for generated problems.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn save_problem(&self, problem: &NewProblem) -> DbResult<i64>;

    async fn get_problem(&self, id: i64) -> DbResult<Option<Problem>>;
}
