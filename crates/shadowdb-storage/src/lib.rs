//! # shadowdb-storage
//!
//! Per-engine SQL backend drivers. Each backend turns the uniform
//! `BackendDriver` trait into the SQL dialect of its engine; no shared
//! base-class logic is needed since formatting/validation live in the
//! retrieval and write cores (see DESIGN.md, "polymorphic backend").

pub mod pool;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
#[cfg(feature = "mysql")]
pub use mysql::MysqlBackend;
