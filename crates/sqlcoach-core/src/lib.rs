//! Core contracts for SQLCoach.
//!
//! This crate holds the SQL safety check, the result comparator, and the value
//! and catalog types shared by the database, LLM and judging crates. Nothing
//! here performs I/O.

pub mod catalog;
pub mod codes;
pub mod compare;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod problem;
pub mod redaction;
pub mod values;

pub use catalog::{infer_theme, ColumnSchema, ForeignKeyRef, TableSchema};
pub use compare::{floats_close, results_equal, ABS_TOLERANCE, REL_TOLERANCE};
pub use envelope::{ErrorBody, ErrorEnvelope};
pub use error::{Error, Result};
pub use guard::{validate_sql, validate_sql_opt, ErrorCode, ValidationVerdict, MAX_SQL_CHARS};
pub use problem::{Difficulty, NewProblem, Problem};
pub use redaction::{redact_database_url, DatabaseTarget};
pub use values::{parse_result_set, ResultRow, ResultSet, Scalar};
