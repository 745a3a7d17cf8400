//! Connection resolution cascade: explicit config → environment variables
//! (`SHADOWDB_URL`, `DATABASE_URL`) → home-directory JSON file → a
//! locally-socketed default. Resolved once at Facade construction.
//!
//! Credentials never appear in logs. Callers may log which *source* was
//! chosen (see `ConnectionSource`) but never the resolved value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Postgres,
    Sqlite,
    Mysql,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Sqlite
    }
}

/// Where the resolved connection string came from. Safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource {
    ExplicitConfig,
    EnvShadowDbUrl,
    EnvDatabaseUrl,
    ConfigFile,
    LocalSocketDefault,
}

impl std::fmt::Display for ConnectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionSource::ExplicitConfig => "explicit config",
            ConnectionSource::EnvShadowDbUrl => "SHADOWDB_URL",
            ConnectionSource::EnvDatabaseUrl => "DATABASE_URL",
            ConnectionSource::ConfigFile => "config file",
            ConnectionSource::LocalSocketDefault => "local socket default",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub backend: BackendKind,
    /// A full connection string/URL. When present, takes precedence over
    /// the discrete host/port/user/password/database fields.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

/// On-disk shape of `~/.config/shadowdb/connection.json` (or platform
/// equivalent via `directories`), the last cascade step before the local
/// socket default.
#[derive(Debug, Clone, Deserialize)]
struct ConnectionFile {
    url: Option<String>,
    backend: Option<BackendKind>,
}

/// The locally-socketed default used when nothing else resolves: a SQLite
/// file database, since it requires no running server.
fn local_socket_default() -> (BackendKind, String) {
    (BackendKind::Sqlite, "sqlite://shadowdb.sqlite3".to_string())
}

/// Resolve a connection URL and its backend per the cascade. Never logs the
/// resolved value — only the chosen source.
pub fn resolve_connection(explicit: &ConnectionConfig) -> (BackendKind, String, ConnectionSource) {
    if let Some(url) = explicit.url.as_ref().filter(|u| !u.is_empty()) {
        tracing::debug!(source = %ConnectionSource::ExplicitConfig, "resolved database connection");
        return (explicit.backend, url.clone(), ConnectionSource::ExplicitConfig);
    }

    if let Ok(url) = std::env::var("SHADOWDB_URL") {
        if !url.is_empty() {
            tracing::debug!(source = %ConnectionSource::EnvShadowDbUrl, "resolved database connection");
            return (
                infer_backend(&url).unwrap_or(explicit.backend),
                url,
                ConnectionSource::EnvShadowDbUrl,
            );
        }
    }

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.is_empty() {
            tracing::debug!(source = %ConnectionSource::EnvDatabaseUrl, "resolved database connection");
            return (
                infer_backend(&url).unwrap_or(explicit.backend),
                url,
                ConnectionSource::EnvDatabaseUrl,
            );
        }
    }

    if let Some(file) = read_config_file() {
        if let Some(url) = file.url.filter(|u| !u.is_empty()) {
            tracing::debug!(source = %ConnectionSource::ConfigFile, "resolved database connection");
            return (
                file.backend.unwrap_or(explicit.backend),
                url,
                ConnectionSource::ConfigFile,
            );
        }
    }

    let (backend, url) = local_socket_default();
    tracing::debug!(source = %ConnectionSource::LocalSocketDefault, "resolved database connection");
    (backend, url, ConnectionSource::LocalSocketDefault)
}

fn infer_backend(url: &str) -> Option<BackendKind> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Some(BackendKind::Postgres)
    } else if url.starts_with("mysql://") {
        Some(BackendKind::Mysql)
    } else if url.starts_with("sqlite://") || url.ends_with(".sqlite3") || url.ends_with(".db") {
        Some(BackendKind::Sqlite)
    } else {
        None
    }
}

fn read_config_file() -> Option<ConnectionFile> {
    let dirs = directories::ProjectDirs::from("", "", "shadowdb")?;
    let path = dirs.config_dir().join("connection.json");
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}
