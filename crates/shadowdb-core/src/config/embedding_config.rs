use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_EMBEDDING_DIMENSIONS};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: Option<String>,
    pub dimensions: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub ollama_url: Option<String>,
    pub headers: HashMap<String, String>,
    pub voyage_input_type: Option<String>,
    pub gemini_task_type: Option<String>,
    pub command: Option<String>,
    pub command_args: Vec<String>,
    pub command_timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: None,
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            api_key: None,
            base_url: None,
            ollama_url: None,
            headers: HashMap::new(),
            voyage_input_type: None,
            gemini_task_type: None,
            command: None,
            command_args: Vec::new(),
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}
