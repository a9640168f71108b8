mod logging;
mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use sqlcoach_core::{
    ErrorEnvelope, codes, parse_result_set, redact_database_url, results_equal, validate_sql,
};
use sqlcoach_db::{DbError, PostgresStore};
use sqlcoach_judge::{Judge, JudgeError};
use sqlcoach_llm::{LlmClient, LlmError, LlmTutor};
use thiserror::Error;
use uuid::Uuid;

use logging::init_logging;
use settings::{Settings, SettingsError};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to initialise logging: {0}")]
    Logging(std::io::Error),
    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid result set in {}: {source}", path.display())]
    ResultSet {
        path: PathBuf,
        source: sqlcoach_core::Error,
    },
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Judge(#[from] JudgeError),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            CliError::Db(err) => err.code(),
            CliError::Llm(err) => err.code(),
            CliError::Judge(err) => err.code(),
            _ => codes::INVALID_REQUEST,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sqlcoach", version, about = "SQL practice backend: guard, judge and tutor")]
struct Cli {
    /// TOML settings file; environment variables override its values.
    #[arg(long, global = true, env = "SQLCOACH_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Append JSON-lines logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a statement would be allowed to run.
    Validate {
        /// SQL text to check.
        sql: String,
    },
    /// Compare two JSON result sets the way answers are graded.
    Compare {
        actual: PathBuf,
        expected: PathBuf,
    },
    /// Drop the practice tables and let the tutor design new ones.
    CreateTables(PromptArgs),
    /// Generate and store a problem over the current practice tables.
    GenerateProblem(PromptArgs),
    /// Grade an answer to a stored problem.
    Check {
        #[arg(long)]
        problem_id: i64,
        #[arg(long)]
        sql: String,
    },
    /// Describe the current practice tables.
    Schemas,
    /// Report database and LLM reachability.
    Health,
}

#[derive(Args, Debug)]
struct PromptArgs {
    /// Optional instructions for the tutor.
    #[arg(long)]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let request_id = Uuid::new_v4();

    match run(cli, request_id).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(event = "command_failed", request_id = %request_id, code = err.code(), error = %err);
            let envelope = ErrorEnvelope::build(
                err.code(),
                err.to_string(),
                None,
                Some(json!({ "request_id": request_id.to_string() })),
            );
            match serde_json::to_string_pretty(&envelope) {
                Ok(body) => println!("{body}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, request_id: Uuid) -> Result<ExitCode, CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    init_logging(settings.debug, cli.log_file.as_deref()).map_err(CliError::Logging)?;

    tracing::info!(event = "command_started", request_id = %request_id, command = command_name(&cli.command));

    match cli.command {
        Command::Validate { sql } => {
            let verdict = validate_sql(&sql);
            print_json(&verdict)?;
            Ok(exit_for(verdict.is_valid()))
        }
        Command::Compare { actual, expected } => {
            let actual_rows = read_result_set(&actual)?;
            let expected_rows = read_result_set(&expected)?;
            let equal = results_equal(&actual_rows, &expected_rows);
            print_json(&json!({
                "equal": equal,
                "actual_rows": actual_rows.len(),
                "expected_rows": expected_rows.len(),
            }))?;
            Ok(exit_for(equal))
        }
        Command::CreateTables(args) => {
            let judge = connect_judge(&settings).await?;
            let created = judge.create_tables(args.prompt.as_deref()).await?;
            print_json(&created)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::GenerateProblem(args) => {
            let judge = connect_judge(&settings).await?;
            let generated = judge.generate_problem(args.prompt.as_deref()).await?;
            print_json(&generated)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { problem_id, sql } => {
            let judge = connect_judge(&settings).await?;
            let check = judge.check_answer(problem_id, &sql).await?;
            print_json(&check)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Schemas => {
            let judge = connect_judge(&settings).await?;
            let overview = judge.table_overview().await?;
            print_json(&overview)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Health => {
            let database = match connect_store(&settings).await {
                Ok(store) => store.check_health().await,
                Err(err) => {
                    tracing::warn!(event = "database_unreachable", error = %err);
                    false
                }
            };
            let llm = LlmClient::new(settings.llm_config())?.check_health().await;
            print_json(&json!({ "database": database, "llm": llm }))?;
            Ok(exit_for(database && llm))
        }
    }
}

async fn connect_store(settings: &Settings) -> Result<PostgresStore, DbError> {
    let target = redact_database_url(&settings.database.url);
    tracing::info!(event = "database_connecting", target = %target.redacted);
    PostgresStore::connect(&settings.db_options()).await
}

async fn connect_judge(settings: &Settings) -> Result<Judge<PostgresStore, LlmTutor>, CliError> {
    let store = connect_store(settings).await?;
    let tutor = LlmTutor::new(LlmClient::new(settings.llm_config())?);
    tracing::debug!(event = "tutor_ready", model = %tutor.client().config().model);
    Ok(Judge::with_options(store, tutor, settings.judge_options()))
}

fn read_result_set(path: &Path) -> Result<sqlcoach_core::ResultSet, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    parse_result_set(&content).map_err(|source| CliError::ResultSet {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_for(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Validate { .. } => "validate",
        Command::Compare { .. } => "compare",
        Command::CreateTables(_) => "create-tables",
        Command::GenerateProblem(_) => "generate-problem",
        Command::Check { .. } => "check",
        Command::Schemas => "schemas",
        Command::Health => "health",
    }
}
