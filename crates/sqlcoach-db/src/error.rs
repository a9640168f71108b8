use std::time::Duration;

use sqlcoach_core::codes;
use thiserror::Error;

/// Failures of the database collaborator.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database connection error: {0}")]
    Connection(String),
    /// The `app_system` schema has not been created yet.
    #[error("database is not initialized: {0}")]
    NotInitialized(String),
    #[error("query timed out after {seconds}s")]
    Timeout { seconds: f64 },
    /// Postgres rejected the statement (SQLSTATE class 42: syntax, unknown
    /// table or column, permissions).
    #[error("SQL syntax error: {0}")]
    Syntax(String),
    #[error("SQL execution error: {0}")]
    Execution(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("column '{column}' has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },
}

impl DbError {
    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Connection(_) => codes::DB_CONNECTION_ERROR,
            DbError::NotInitialized(_) => codes::DB_NOT_INITIALIZED_ERROR,
            DbError::Timeout { .. } => codes::DB_TIMEOUT_ERROR,
            DbError::Syntax(_) => codes::DB_SYNTAX_ERROR,
            DbError::Schema(_) => codes::DB_SCHEMA_ERROR,
            DbError::Execution(_) | DbError::Decode(_) | DbError::UnsupportedType { .. } => {
                codes::DB_EXECUTION_ERROR
            }
        }
    }

    /// Classify a driver error raised while running a statement.
    pub(crate) fn from_statement(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().is_some_and(|code| code.starts_with("42")) {
                return DbError::Syntax(db_err.message().to_string());
            }
        }

        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DbError::Connection(err.to_string()),
            _ => DbError::Execution(err.to_string()),
        }
    }

    /// Classify a driver error raised by a SELECT that ran under a
    /// server-side `statement_timeout` of `timeout`.
    pub(crate) fn from_select(err: sqlx::Error, timeout: Duration) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(QUERY_CANCELED) {
                return DbError::Timeout {
                    seconds: timeout.as_secs_f64(),
                };
            }
        }
        DbError::from_statement(err)
    }
}

/// Classify a driver error raised against the `app_system` tables.
pub(crate) fn from_system_statement(err: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNDEFINED_TABLE) {
            return DbError::NotInitialized(db_err.message().to_string());
        }
    }
    DbError::from_statement(err)
}

const UNDEFINED_TABLE: &str = "42P01";
const QUERY_CANCELED: &str = "57014";

/// Result type for database operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct ServerError {
        code: &'static str,
        message: &'static str,
    }

    impl fmt::Display for ServerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for ServerError {}

    impl sqlx::error::DatabaseError for ServerError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn server_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ServerError { code, message }))
    }

    #[test]
    fn codes_follow_variants() {
        assert_eq!(DbError::Timeout { seconds: 5.0 }.code(), "DB_TIMEOUT_ERROR");
        assert_eq!(DbError::Syntax("x".into()).code(), "DB_SYNTAX_ERROR");
        assert_eq!(
            DbError::UnsupportedType {
                column: "c".into(),
                type_name: "TSVECTOR".into()
            }
            .code(),
            "DB_EXECUTION_ERROR"
        );
    }

    #[test]
    fn pool_timeouts_are_connection_errors() {
        let err = DbError::from_statement(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    fn canceled_selects_are_timeouts() {
        let err = DbError::from_select(
            server_error("57014", "canceling statement due to statement timeout"),
            Duration::from_millis(1500),
        );
        assert!(matches!(err, DbError::Timeout { seconds } if seconds == 1.5), "got {err:?}");
    }

    #[test]
    fn select_errors_keep_statement_classification() {
        let err = DbError::from_select(
            server_error("42P01", "relation \"nope\" does not exist"),
            Duration::from_secs(5),
        );
        assert!(matches!(err, DbError::Syntax(_)), "got {err:?}");

        let err = DbError::from_select(
            server_error("22012", "division by zero"),
            Duration::from_secs(5),
        );
        assert!(matches!(err, DbError::Execution(_)), "got {err:?}");
    }

    #[test]
    fn cancellation_outside_a_select_is_an_execution_error() {
        let err = DbError::from_statement(server_error("57014", "canceling statement"));
        assert!(matches!(err, DbError::Execution(_)), "got {err:?}");
    }

    #[test]
    fn timeout_message_names_the_limit() {
        assert_eq!(
            DbError::Timeout { seconds: 5.0 }.to_string(),
            "query timed out after 5s"
        );
    }
}
