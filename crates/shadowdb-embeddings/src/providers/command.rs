use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use shadowdb_core::config::EmbeddingConfig;
use shadowdb_core::constants::COMMAND_STDERR_SNIPPET_CHARS;
use shadowdb_core::errors::EmbeddingError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Accepts either a bare `[number, ...]` array or `{"embedding": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommandOutput {
    Bare(Vec<f32>),
    Wrapped { embedding: Vec<f32> },
}

pub async fn embed(
    config: &EmbeddingConfig,
    model: &str,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let program = config
        .command
        .as_deref()
        .ok_or_else(|| EmbeddingError::ProviderTransport {
            provider: "command".to_string(),
            detail: "no command configured".to_string(),
        })?;

    let payload = serde_json::json!({
        "text": text,
        "model": model,
        "dimensions": config.dimensions,
    });
    let payload_bytes = serde_json::to_vec(&payload).map_err(|e| EmbeddingError::ProviderTransport {
        provider: "command".to_string(),
        detail: e.to_string(),
    })?;

    let mut child = Command::new(program)
        .args(&config.command_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| EmbeddingError::ProviderTransport {
            provider: "command".to_string(),
            detail: e.to_string(),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(&payload_bytes).await;
    }

    let timeout = Duration::from_millis(config.command_timeout_ms);
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| EmbeddingError::ProviderTransport {
            provider: "command".to_string(),
            detail: e.to_string(),
        })?,
        Err(_) => {
            return Err(EmbeddingError::CommandTimeout {
                timeout_ms: config.command_timeout_ms,
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = super::truncate_chars(&stderr, COMMAND_STDERR_SNIPPET_CHARS);
        return Err(EmbeddingError::CommandFailed {
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    let parsed: CommandOutput =
        serde_json::from_slice(&output.stdout).map_err(|e| EmbeddingError::CommandOutput {
            detail: e.to_string(),
        })?;

    Ok(match parsed {
        CommandOutput::Bare(vector) => vector,
        CommandOutput::Wrapped { embedding } => embedding,
    })
}
