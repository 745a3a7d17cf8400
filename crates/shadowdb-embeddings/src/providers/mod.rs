pub mod command;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod voyage;

use shadowdb_core::constants::HTTP_ERROR_BODY_SNIPPET_CHARS;
use shadowdb_core::errors::EmbeddingError;

/// Shared HTTP response handling: surface status + a bounded body snippet
/// on non-2xx, and `ProviderTransport` on transport-level failure.
pub(crate) async fn handle_response(
    provider: &str,
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<reqwest::Response, EmbeddingError> {
    let response = response.map_err(|e| EmbeddingError::ProviderTransport {
        provider: provider.to_string(),
        detail: e.to_string(),
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let body = truncate_chars(&body, HTTP_ERROR_BODY_SNIPPET_CHARS);
        return Err(EmbeddingError::HttpStatus {
            provider: provider.to_string(),
            status,
            body,
        });
    }

    Ok(response)
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
