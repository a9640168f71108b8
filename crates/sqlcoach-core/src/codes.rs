//! Stable error codes surfaced to callers. These strings are part of the API.

pub const EMPTY_SQL: &str = "EMPTY_SQL";
pub const SQL_TOO_LONG: &str = "SQL_TOO_LONG";
pub const INVALID_SQL: &str = "INVALID_SQL";

pub const DB_CONNECTION_ERROR: &str = "DB_CONNECTION_ERROR";
pub const DB_NOT_INITIALIZED_ERROR: &str = "DB_NOT_INITIALIZED_ERROR";
pub const DB_TIMEOUT_ERROR: &str = "DB_TIMEOUT_ERROR";
pub const DB_SYNTAX_ERROR: &str = "DB_SYNTAX_ERROR";
pub const DB_EXECUTION_ERROR: &str = "DB_EXECUTION_ERROR";
pub const DB_SCHEMA_ERROR: &str = "DB_SCHEMA_ERROR";

pub const LLM_CONNECTION: &str = "LLM_CONNECTION";
pub const LLM_TIMEOUT: &str = "LLM_TIMEOUT";
pub const LLM_INVALID_RESPONSE: &str = "LLM_INVALID_RESPONSE";
pub const LLM_GENERATION_FAILED: &str = "LLM_GENERATION_FAILED";

pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const PROBLEM_NOT_FOUND: &str = "PROBLEM_NOT_FOUND";
pub const NO_TABLES: &str = "NO_TABLES";
pub const PROBLEM_GENERATION_ERROR: &str = "PROBLEM_GENERATION_ERROR";
pub const TABLE_CREATION_ERROR: &str = "TABLE_CREATION_ERROR";
