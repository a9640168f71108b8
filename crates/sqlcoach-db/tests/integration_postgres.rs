//! Runs against a disposable database: every table in `public` is dropped.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use sqlcoach_core::{Difficulty, NewProblem, Scalar, floats_close, infer_theme, results_equal};
use sqlcoach_db::{
    DbError, DbOptions, PostgresStore, PracticeCatalog, ProblemStore, QueryExecutor,
};

const PRACTICE_SCHEMA: &str = include_str!("fixtures/practice_schema.sql");

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

async fn connect() -> Result<Option<PostgresStore>> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL to run Postgres tests");
        return Ok(None);
    };

    let mut options = DbOptions::new(url);
    options.max_connections = 4;
    options.min_connections = 1;
    let store = PostgresStore::connect(&options)
        .await
        .context("connecting to Postgres")?;
    Ok(Some(store))
}

async fn reset_practice_schema(store: &PostgresStore) -> Result<()> {
    store.drop_all_user_tables().await?;
    store.initialize_system_schema().await?;
    let statements: Vec<String> = PRACTICE_SCHEMA.split(';').map(str::to_string).collect();
    let executed = store.execute_statements(&statements).await?;
    assert_eq!(executed, 4);
    Ok(())
}

#[tokio::test]
async fn round_trips_practice_schema_and_problems() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };
    assert!(store.check_health().await);
    reset_practice_schema(&store).await?;

    let schemas = store.table_schemas().await?;
    let names: Vec<&str> = schemas.iter().map(|t| t.table_name.as_str()).collect();
    assert_eq!(names, vec!["departments", "employees"]);
    assert_eq!(infer_theme(&names), "employee management");

    let employees = schemas
        .iter()
        .find(|t| t.table_name == "employees")
        .ok_or_else(|| anyhow!("expected employees table"))?;
    let department_id = employees
        .columns
        .iter()
        .find(|c| c.column_name == "department_id")
        .ok_or_else(|| anyhow!("expected department_id column"))?;
    let fk = department_id
        .foreign_key
        .as_ref()
        .ok_or_else(|| anyhow!("expected foreign key on department_id"))?;
    assert_eq!(fk.table, "departments");
    assert_eq!(fk.column, "id");
    assert!(employees.columns[0].is_primary_key);
    assert_eq!(employees.columns[3].data_type, "NUMERIC");

    let sql = "SELECT d.name AS department, AVG(e.salary) AS avg_salary \
               FROM employees e JOIN departments d ON d.id = e.department_id \
               GROUP BY d.name ORDER BY d.name";
    let expected = store.execute_select(sql, Duration::from_secs(5)).await?;
    assert_eq!(expected.len(), 3);
    assert!(matches!(expected[0].get("avg_salary"), Some(Scalar::Float(_))));

    let reordered = "SELECT AVG(e.salary) AS avg_salary, d.name AS department \
                     FROM employees e JOIN departments d ON d.id = e.department_id \
                     GROUP BY d.name ORDER BY d.name DESC";
    let actual = store.execute_select(reordered, Duration::from_secs(5)).await?;
    assert!(results_equal(&actual, &expected));

    let id = store
        .save_problem(&NewProblem {
            theme: "employee management".to_string(),
            difficulty: Difficulty::Easy,
            correct_sql: sql.to_string(),
            expected_result: expected.clone(),
            table_schemas: schemas.clone(),
            hint: Some("Join employees to departments".to_string()),
        })
        .await?;

    let problem = store
        .get_problem(id)
        .await?
        .ok_or_else(|| anyhow!("problem {id} should exist"))?;
    assert_eq!(problem.difficulty, Difficulty::Easy);
    assert_eq!(problem.table_schemas, schemas);
    assert!(results_equal(&problem.expected_result, &expected));
    assert!(store.get_problem(id + 1_000_000).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn decodes_nulls_temporals_and_booleans() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };

    let rows = store
        .execute_select(
            "SELECT NULL::int AS missing, DATE '2024-03-09' AS day, TRUE AS flag, 'x'::text AS label",
            Duration::from_secs(5),
        )
        .await?;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("missing"), Some(&Scalar::Null));
    assert_eq!(row.get("day"), Some(&Scalar::Temporal("2024-03-09".to_string())));
    assert_eq!(row.get("flag"), Some(&Scalar::Bool(true)));
    assert_eq!(row.get("label"), Some(&Scalar::Text("x".to_string())));
    Ok(())
}

#[tokio::test]
async fn decodes_intervals_money_and_arrays() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };

    let rows = store
        .execute_select(
            "SELECT INTERVAL '1 day 02:00:00' AS span, TIME WITH TIME ZONE '07:05:00+02' AS local, \
             '12.34'::money AS price, ARRAY[1, NULL, 3] AS ids, ARRAY['a', 'b'] AS tags",
            Duration::from_secs(5),
        )
        .await?;
    let row = &rows[0];
    assert_eq!(row.get("span"), Some(&Scalar::Temporal("P1DT2H".to_string())));
    assert_eq!(row.get("local"), Some(&Scalar::Temporal("07:05:00+02:00".to_string())));
    assert!(matches!(row.get("price"), Some(Scalar::Float(price)) if floats_close(*price, 12.34)));
    assert_eq!(row.get("ids"), Some(&Scalar::Text("[1,null,3]".to_string())));
    assert_eq!(row.get("tags"), Some(&Scalar::Text("[\"a\",\"b\"]".to_string())));
    Ok(())
}

#[tokio::test]
async fn classifies_syntax_errors_and_timeouts() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };

    let err = store
        .execute_select("SELECT * FROM no_such_table_here", Duration::from_secs(5))
        .await
        .err()
        .ok_or_else(|| anyhow!("query against a missing table should fail"))?;
    assert!(matches!(err, DbError::Syntax(_)), "got {err:?}");

    let err = store
        .execute_select("SELECT pg_sleep(2)", Duration::from_millis(200))
        .await
        .err()
        .ok_or_else(|| anyhow!("slow query should time out"))?;
    assert!(matches!(err, DbError::Timeout { .. }), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn timed_out_selects_are_canceled_on_the_server() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };

    let started = std::time::Instant::now();
    let err = store
        .execute_select("SELECT pg_sleep(30)", Duration::from_millis(300))
        .await
        .err()
        .ok_or_else(|| anyhow!("slow query should time out"))?;
    assert!(matches!(err, DbError::Timeout { .. }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let rows = store
        .execute_select(
            "SELECT count(*) AS running FROM pg_stat_activity \
             WHERE state = 'active' AND query = 'SELECT pg_sleep(30)'",
            Duration::from_secs(5),
        )
        .await?;
    assert_eq!(rows[0].get("running"), Some(&Scalar::Int(0)));

    let rows = store
        .execute_select("SELECT 1 AS one", Duration::from_secs(5))
        .await?;
    assert_eq!(rows[0].get("one"), Some(&Scalar::Int(1)));
    Ok(())
}
