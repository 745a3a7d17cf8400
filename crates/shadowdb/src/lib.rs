//! # shadowdb
//!
//! Database-backed agent memory engine. `Facade` is the single entrypoint a
//! host process holds: hybrid search, the write/lifecycle state machine,
//! and primer-context assembly, over whichever of Postgres, SQLite, or
//! MySQL is configured.

pub mod errors;
pub mod facade;
pub mod path;

pub use facade::{Facade, RecordView};
pub use path::ParsedPath;

pub use shadowdb_core::config::ShadowDbConfig;
pub use shadowdb_core::errors::{ShadowDbError, ShadowDbResult};
pub use shadowdb_core::search::SearchResult;
pub use shadowdb_core::write_result::WriteResult;
