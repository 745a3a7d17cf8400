//! # shadowdb-core
//!
//! Foundation crate for the shadowdb agent memory engine.
//! Defines the domain types, cross-cutting traits, errors, config, and
//! constants every other crate in the workspace depends on.

pub mod config;
pub mod constants;
pub mod errors;
pub mod memory;
pub mod primer;
pub mod search;
pub mod traits;
pub mod write_result;

pub use config::ShadowDbConfig;
pub use errors::{ShadowDbError, ShadowDbResult};
pub use memory::MemoryRecord;
pub use primer::PrimerRow;
pub use search::{virtual_path, RankedHit, SearchResult};
pub use write_result::WriteResult;
