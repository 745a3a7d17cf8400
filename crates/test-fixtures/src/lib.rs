//! Fixture loader for sample memories used by cross-crate integration
//! tests. Works from any crate in the workspace: walk up from
//! `CARGO_MANIFEST_DIR` until a directory literally named `test-fixtures`
//! is found (this crate's own root).

use serde::de::DeserializeOwned;
use std::path::PathBuf;

fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!("could not find test-fixtures directory from CARGO_MANIFEST_DIR={manifest_dir}");
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file, relative to this crate's root.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content =
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// One sample memory, shaped for a write-lifecycle `NewMemoryInput`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SampleMemory {
    pub content: String,
    pub category: String,
    pub title: Option<String>,
    pub tags: Vec<String>,
}

/// The bundled `memories/sample_memories.json` fixture set, used across
/// retrieval/write/facade integration tests.
pub fn sample_memories() -> Vec<SampleMemory> {
    load_fixture("memories/sample_memories.json")
}
