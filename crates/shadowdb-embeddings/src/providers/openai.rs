use serde::Deserialize;
use shadowdb_core::config::EmbeddingConfig;
use shadowdb_core::errors::EmbeddingError;

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

/// Shared by `openai` and `openai-compatible`: same request/response shape,
/// only the base URL differs (compatible endpoints are self-hosted or
/// third-party but speak the OpenAI embeddings wire format).
pub async fn embed(
    http: &reqwest::Client,
    config: &EmbeddingConfig,
    model: &str,
    text: &str,
    compatible: bool,
) -> Result<Vec<f32>, EmbeddingError> {
    let provider_name = if compatible { "openai-compatible" } else { "openai" };
    let base = config
        .base_url
        .as_deref()
        .unwrap_or("https://api.openai.com/v1");
    let url = format!("{}/embeddings", base.trim_end_matches('/'));

    let api_key = config.api_key.as_deref().unwrap_or_default();
    let mut request = http
        .post(&url)
        .bearer_auth(api_key)
        .json(&serde_json::json!({
            "model": model,
            "input": text,
        }));
    for (key, value) in &config.headers {
        request = request.header(key, value);
    }

    let response = super::handle_response(provider_name, request.send().await).await?;
    let mut parsed: OpenAiResponse =
        response
            .json()
            .await
            .map_err(|e| EmbeddingError::ProviderTransport {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            })?;

    let embedding = parsed
        .data
        .drain(..)
        .next()
        .ok_or_else(|| EmbeddingError::ProviderTransport {
            provider: provider_name.to_string(),
            detail: "response contained no embeddings".to_string(),
        })?;

    Ok(embedding.embedding)
}
