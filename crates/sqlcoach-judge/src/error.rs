use sqlcoach_core::codes;
use sqlcoach_db::DbError;
use sqlcoach_llm::LlmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("prompt must be at most {max} characters")]
    PromptTooLong { max: usize },
    #[error("problem {0} was not found")]
    ProblemNotFound(i64),
    #[error("no practice tables exist; create tables first")]
    NoTables,
    #[error("generated problem could not be used: {0}")]
    ProblemGeneration(String),
    #[error("practice tables could not be created: {0}")]
    TableCreation(String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl JudgeError {
    pub fn code(&self) -> &'static str {
        match self {
            JudgeError::PromptTooLong { .. } => codes::INVALID_REQUEST,
            JudgeError::ProblemNotFound(_) => codes::PROBLEM_NOT_FOUND,
            JudgeError::NoTables => codes::NO_TABLES,
            JudgeError::ProblemGeneration(_) => codes::PROBLEM_GENERATION_ERROR,
            JudgeError::TableCreation(_) => codes::TABLE_CREATION_ERROR,
            JudgeError::Db(err) => err.code(),
            JudgeError::Llm(err) => err.code(),
        }
    }

    /// HTTP-style classification: 400 for bad input, 404 for missing
    /// resources, 500 for collaborator failures.
    pub fn status(&self) -> u16 {
        match self {
            JudgeError::PromptTooLong { .. } => 400,
            JudgeError::ProblemNotFound(_) | JudgeError::NoTables => 404,
            _ => 500,
        }
    }
}

pub type JudgeResult<T> = std::result::Result<T, JudgeError>;
