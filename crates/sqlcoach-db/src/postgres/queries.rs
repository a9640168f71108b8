use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use sqlcoach_core::{NewProblem, ResultSet, TableSchema};

use crate::error::{DbError, DbResult, from_system_statement};

pub const CREATE_SYSTEM_SCHEMA: &str = "CREATE SCHEMA IF NOT EXISTS app_system";

pub const CREATE_PROBLEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS app_system.problems (
    id BIGSERIAL PRIMARY KEY,
    theme VARCHAR(255) NOT NULL,
    difficulty VARCHAR(20) NOT NULL,
    correct_sql TEXT NOT NULL,
    expected_result JSONB NOT NULL,
    hint TEXT,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    table_schemas JSONB NOT NULL
)
"#;

fn schema_error(err: sqlx::Error) -> DbError {
    DbError::Schema(err.to_string())
}

pub async fn list_user_tables(pool: &PgPool) -> DbResult<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select table_name::text
        from information_schema.tables
        where table_schema = 'public'
          and table_type = 'BASE TABLE'
        order by table_name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(schema_error)
}

pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

pub async fn list_columns(pool: &PgPool, table: &str) -> DbResult<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (String, String, bool)>(
        r#"
        select
          column_name::text,
          data_type::text,
          (is_nullable = 'YES') as is_nullable
        from information_schema.columns
        where table_schema = 'public'
          and table_name::text = $1
        order by ordinal_position
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(schema_error)?;

    Ok(rows
        .into_iter()
        .map(|(name, data_type, is_nullable)| RawColumn {
            name,
            data_type,
            is_nullable,
        })
        .collect())
}

pub async fn list_primary_key_columns(pool: &PgPool, table: &str) -> DbResult<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select kcu.column_name::text
        from information_schema.key_column_usage kcu
        join information_schema.table_constraints tc
          on kcu.constraint_name = tc.constraint_name
         and kcu.table_schema = tc.table_schema
        where tc.table_schema = 'public'
          and tc.table_name::text = $1
          and tc.constraint_type = 'PRIMARY KEY'
        order by kcu.ordinal_position
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(schema_error)
}

pub struct RawForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

pub async fn list_foreign_keys(pool: &PgPool, table: &str) -> DbResult<Vec<RawForeignKey>> {
    let rows = sqlx::query_as::<_, (String, String, String)>(
        r#"
        select
          kcu.column_name::text,
          ccu.table_name::text as foreign_table_name,
          ccu.column_name::text as foreign_column_name
        from information_schema.key_column_usage kcu
        join information_schema.constraint_column_usage ccu
          on kcu.constraint_name = ccu.constraint_name
         and kcu.table_schema = ccu.constraint_schema
        join information_schema.table_constraints tc
          on kcu.constraint_name = tc.constraint_name
         and kcu.table_schema = tc.table_schema
        where tc.table_schema = 'public'
          and tc.table_name::text = $1
          and tc.constraint_type = 'FOREIGN KEY'
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(schema_error)?;

    Ok(rows
        .into_iter()
        .map(|(column, referenced_table, referenced_column)| RawForeignKey {
            column,
            referenced_table,
            referenced_column,
        })
        .collect())
}

pub async fn insert_problem(pool: &PgPool, problem: &NewProblem) -> DbResult<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        insert into app_system.problems
          (theme, difficulty, correct_sql, expected_result, table_schemas, hint)
        values ($1, $2, $3, $4, $5, $6)
        returning id
        "#,
    )
    .bind(&problem.theme)
    .bind(problem.difficulty.as_str())
    .bind(&problem.correct_sql)
    .bind(Json(&problem.expected_result))
    .bind(Json(&problem.table_schemas))
    .bind(problem.hint.as_deref())
    .fetch_one(pool)
    .await
    .map_err(from_system_statement)
}

pub struct RawProblem {
    pub id: i64,
    pub theme: String,
    pub difficulty: String,
    pub correct_sql: String,
    pub expected_result: ResultSet,
    pub table_schemas: Vec<TableSchema>,
    pub hint: Option<String>,
    pub created_at: DateTime<Utc>,
}

type ProblemRow = (
    i64,
    String,
    String,
    String,
    Json<ResultSet>,
    Json<Vec<TableSchema>>,
    Option<String>,
    DateTime<Utc>,
);

pub async fn fetch_problem(pool: &PgPool, id: i64) -> DbResult<Option<RawProblem>> {
    let row = sqlx::query_as::<_, ProblemRow>(
        r#"
        select id, theme, difficulty, correct_sql, expected_result,
               table_schemas, hint, created_at
        from app_system.problems
        where id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(from_system_statement)?;

    Ok(row.map(
        |(id, theme, difficulty, correct_sql, expected, schemas, hint, created_at)| RawProblem {
            id,
            theme,
            difficulty,
            correct_sql,
            expected_result: expected.0,
            table_schemas: schemas.0,
            hint,
            created_at,
        },
    ))
}
