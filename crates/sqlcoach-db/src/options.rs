use std::time::Duration;

/// Connection pool settings for [`crate::PostgresStore`].
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a connection to be established or handed out.
    pub acquire_timeout: Duration,
    /// Idle connections older than this are closed.
    pub idle_timeout: Duration,
}

impl DbOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            url: "postgresql://postgres:changethis@db:5432/mydb".to_string(),
            max_connections: 10,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
        }
    }
}
