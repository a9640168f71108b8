use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Executor, PgPool};
use sqlx::postgres::{PgPoolOptions, PgRow};

use sqlcoach_core::{NewProblem, Problem, ResultSet, TableSchema};

use crate::adapter::{PracticeCatalog, ProblemStore, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::options::DbOptions;

mod decode;
mod mapper;
mod queries;

pub use decode::decode_row;

const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// PostgreSQL-backed implementation of every database seam.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from `options` and wait for the first connection.
    pub async fn connect(options: &DbOptions) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections.min(options.max_connections))
            .acquire_timeout(options.acquire_timeout)
            .idle_timeout(options.idle_timeout)
            .connect(&options.url)
            .await
            .map_err(|err| DbError::Connection(err.to_string()))?;

        tracing::info!(event = "db_pool_created", max_connections = options.max_connections);
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(event = "db_pool_closed");
    }

    /// Run `sql` in a transaction bounded by `SET LOCAL statement_timeout`,
    /// then roll it back.
    async fn fetch_with_statement_timeout(
        &self,
        sql: &str,
        timeout: Duration,
    ) -> Result<Vec<PgRow>, sqlx::Error> {
        // A zero statement_timeout disables the limit.
        let millis = timeout.as_millis().max(1);
        let mut tx = self.pool.begin().await?;
        let set_timeout = format!("SET LOCAL statement_timeout = {millis}");
        (&mut *tx).execute(sqlx::raw_sql(&set_timeout)).await?;
        let rows = sqlx::query(sql).fetch_all(&mut *tx).await?;
        tx.rollback().await?;
        Ok(rows)
    }

    /// Returns true when `SELECT 1` succeeds.
    pub async fn check_health(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[async_trait]
impl QueryExecutor for PostgresStore {
    async fn execute_select(&self, sql: &str, timeout: Duration) -> DbResult<ResultSet> {
        // The server cancels at `timeout`; the client deadline only covers a
        // stalled connection.
        let fetch = self.fetch_with_statement_timeout(sql, timeout);
        let rows = match tokio::time::timeout(timeout + CLIENT_TIMEOUT_GRACE, fetch).await {
            Ok(result) => result.map_err(|err| {
                let err = DbError::from_select(err, timeout);
                tracing::warn!(event = "select_failed", code = err.code(), error = %err);
                err
            })?,
            Err(_) => {
                tracing::warn!(event = "select_timed_out", timeout_ms = timeout.as_millis() as u64);
                return Err(DbError::Timeout {
                    seconds: timeout.as_secs_f64(),
                });
            }
        };

        rows.iter().map(decode::decode_row).collect()
    }
}

#[async_trait]
impl PracticeCatalog for PostgresStore {
    async fn initialize_system_schema(&self) -> DbResult<()> {
        for statement in [queries::CREATE_SYSTEM_SCHEMA, queries::CREATE_PROBLEMS_TABLE] {
            sqlx::raw_sql(statement)
                .execute(&self.pool)
                .await
                .map_err(|err| DbError::Schema(err.to_string()))?;
        }
        tracing::info!(event = "system_schema_initialized");
        Ok(())
    }

    async fn drop_all_user_tables(&self) -> DbResult<usize> {
        let tables = queries::list_user_tables(&self.pool).await?;
        for table in &tables {
            let statement = format!("DROP TABLE IF EXISTS {} CASCADE", mapper::quote_ident(table));
            sqlx::raw_sql(&statement)
                .execute(&self.pool)
                .await
                .map_err(DbError::from_statement)?;
        }
        tracing::info!(event = "user_tables_dropped", count = tables.len(), tables = ?tables);
        Ok(tables.len())
    }

    async fn execute_statements(&self, statements: &[String]) -> DbResult<usize> {
        let mut executed = 0;
        for statement in statements.iter().map(|sql| sql.trim()) {
            if statement.is_empty() {
                continue;
            }
            sqlx::raw_sql(statement)
                .execute(&self.pool)
                .await
                .map_err(DbError::from_statement)?;
            executed += 1;
        }
        tracing::info!(event = "statements_executed", count = executed);
        Ok(executed)
    }

    async fn table_schemas(&self) -> DbResult<Vec<TableSchema>> {
        let mut schemas = Vec::new();
        for table in queries::list_user_tables(&self.pool).await? {
            let columns = queries::list_columns(&self.pool, &table).await?;
            let primary_key = queries::list_primary_key_columns(&self.pool, &table).await?;
            let foreign_keys = queries::list_foreign_keys(&self.pool, &table).await?;
            schemas.push(mapper::map_table(table, columns, primary_key, foreign_keys));
        }
        Ok(schemas)
    }
}

#[async_trait]
impl ProblemStore for PostgresStore {
    async fn save_problem(&self, problem: &NewProblem) -> DbResult<i64> {
        let id = queries::insert_problem(&self.pool, problem).await?;
        tracing::info!(event = "problem_saved", problem_id = id);
        Ok(id)
    }

    async fn get_problem(&self, id: i64) -> DbResult<Option<Problem>> {
        Ok(queries::fetch_problem(&self.pool, id)
            .await?
            .map(mapper::map_problem))
    }
}
