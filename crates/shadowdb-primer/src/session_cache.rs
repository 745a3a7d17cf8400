//! Bounded, process-wide map from session key to `(digest, last_inject_time)`.
//! Capped at 5,000 entries; exceeding the bound evicts the 1,000 oldest by
//! timestamp (a 20% stride), per DESIGN.md "session map eviction".

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use shadowdb_core::constants::{SESSION_MAP_EVICTION_COUNT, SESSION_MAP_MAX_ENTRIES};

#[derive(Debug, Clone)]
struct Entry {
    digest: String,
    last_inject_time: DateTime<Utc>,
}

/// Thread-safe; intended to live for the process lifetime on the Facade.
pub struct SessionInjectionMap {
    inner: Mutex<Inner>,
}

struct Inner {
    entries: HashMap<String, Entry>,
}

impl Default for SessionInjectionMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionInjectionMap {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
            }),
        }
    }

    /// Looks up the stored digest and timestamp for `session_key`, if any.
    pub fn get(&self, session_key: &str) -> Option<(String, DateTime<Utc>)> {
        let inner = self.inner.lock().unwrap();
        inner.entries.get(session_key).map(|e| (e.digest.clone(), e.last_inject_time))
    }

    /// Records an injection at `now`, evicting the oldest 1,000 entries if
    /// the map would exceed its 5,000-entry bound.
    pub fn record(&self, session_key: &str, digest: &str, now: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.insert(
            session_key.to_string(),
            Entry {
                digest: digest.to_string(),
                last_inject_time: now,
            },
        );

        if inner.entries.len() > SESSION_MAP_MAX_ENTRIES {
            let mut by_time: Vec<(String, DateTime<Utc>)> = inner
                .entries
                .iter()
                .map(|(k, e)| (k.clone(), e.last_inject_time))
                .collect();
            by_time.sort_by_key(|(_, t)| *t);

            let evict: Vec<String> = by_time
                .into_iter()
                .take(SESSION_MAP_EVICTION_COUNT)
                .map(|(k, _)| k)
                .collect();
            for key in evict {
                inner.entries.remove(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reads_back() {
        let map = SessionInjectionMap::new();
        let now = Utc::now();
        map.record("session-a", "abc123", now);
        let (digest, time) = map.get("session-a").unwrap();
        assert_eq!(digest, "abc123");
        assert_eq!(time, now);
        assert!(map.get("missing").is_none());
    }

    #[test]
    fn eviction_drops_oldest_thousand_keeps_newest() {
        let map = SessionInjectionMap::new();
        let base = Utc::now();
        for i in 0..5001 {
            let t = base + chrono::Duration::milliseconds(i as i64);
            map.record(&format!("session-{i}"), "d", t);
        }
        assert_eq!(map.len(), 5001 - SESSION_MAP_EVICTION_COUNT);
        assert!(map.get("session-0").is_none());
        assert!(map.get("session-5000").is_some());
    }
}
