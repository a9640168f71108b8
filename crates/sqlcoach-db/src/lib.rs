//! PostgreSQL access for SQLCoach: executing learner queries, managing the
//! practice schema and storing generated problems.

pub mod adapter;
pub mod error;
pub mod options;
pub mod postgres;

pub use adapter::{PracticeCatalog, ProblemStore, QueryExecutor};
pub use error::{DbError, DbResult};
pub use options::DbOptions;
pub use postgres::PostgresStore;
