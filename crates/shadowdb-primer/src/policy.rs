//! Per-turn inject-or-skip decision, given the configured `InjectMode` and
//! the session's prior entry in the injection map.

use chrono::{DateTime, Utc};

use shadowdb_core::config::InjectMode;

use crate::session_cache::SessionInjectionMap;

/// `always` injects every turn; `first-run` injects only when the session
/// key is new; `digest` injects when absent, when the digest changed, or
/// when `cache_ttl_ms > 0` and the cached entry is older than that TTL.
pub fn should_inject(
    mode: InjectMode,
    cache: &SessionInjectionMap,
    session_key: &str,
    new_digest: &str,
    cache_ttl_ms: i64,
    now: DateTime<Utc>,
) -> bool {
    match mode {
        InjectMode::Always => true,
        InjectMode::FirstRun => cache.get(session_key).is_none(),
        InjectMode::Digest => match cache.get(session_key) {
            None => true,
            Some((stored_digest, stored_time)) => {
                if stored_digest != new_digest {
                    return true;
                }
                if cache_ttl_ms > 0 {
                    let elapsed = (now - stored_time).num_milliseconds();
                    return elapsed >= cache_ttl_ms;
                }
                false
            }
        },
    }
}
