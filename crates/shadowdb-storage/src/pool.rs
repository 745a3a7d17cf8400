//! Shared connection pool shape across all three backends: capped at 3
//! concurrent connections, 30s idle timeout, 5s connect timeout. Never
//! create a second pool per backend instance — writes and search share one
//! (see DESIGN.md, "connection pool").

use std::time::Duration;

use shadowdb_core::constants::{
    POOL_CONNECT_TIMEOUT_SECS, POOL_IDLE_TIMEOUT_SECS, POOL_MAX_CONNECTIONS,
};
use sqlx::pool::PoolOptions;

pub fn pool_options<DB: sqlx::Database>() -> PoolOptions<DB> {
    PoolOptions::<DB>::new()
        .max_connections(POOL_MAX_CONNECTIONS)
        .idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
        .acquire_timeout(Duration::from_secs(POOL_CONNECT_TIMEOUT_SECS))
}
