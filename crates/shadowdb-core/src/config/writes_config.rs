use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PURGE_AFTER_DAYS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub purge_after_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            purge_after_days: DEFAULT_PURGE_AFTER_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WritesConfig {
    pub enabled: bool,
    pub auto_embed: bool,
    pub retention: RetentionConfig,
}

impl Default for WritesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_embed: true,
            retention: RetentionConfig::default(),
        }
    }
}
