use serde::Deserialize;
use shadowdb_core::config::EmbeddingConfig;
use shadowdb_core::errors::EmbeddingError;

#[derive(Deserialize)]
struct VoyageResponse {
    data: Vec<VoyageEmbedding>,
}

#[derive(Deserialize)]
struct VoyageEmbedding {
    embedding: Vec<f32>,
}

pub async fn embed(
    http: &reqwest::Client,
    config: &EmbeddingConfig,
    model: &str,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let base = config
        .base_url
        .as_deref()
        .unwrap_or("https://api.voyageai.com/v1");
    let url = format!("{}/embeddings", base.trim_end_matches('/'));

    let api_key = config.api_key.as_deref().unwrap_or_default();
    let mut body = serde_json::json!({
        "model": model,
        "input": [text],
    });
    if let Some(input_type) = &config.voyage_input_type {
        body["input_type"] = serde_json::Value::String(input_type.clone());
    }

    let mut request = http.post(&url).bearer_auth(api_key).json(&body);
    for (key, value) in &config.headers {
        request = request.header(key, value);
    }

    let response = super::handle_response("voyage", request.send().await).await?;
    let mut parsed: VoyageResponse =
        response
            .json()
            .await
            .map_err(|e| EmbeddingError::ProviderTransport {
                provider: "voyage".to_string(),
                detail: e.to_string(),
            })?;

    let embedding = parsed
        .data
        .drain(..)
        .next()
        .ok_or_else(|| EmbeddingError::ProviderTransport {
            provider: "voyage".to_string(),
            detail: "response contained no embeddings".to_string(),
        })?;

    Ok(embedding.embedding)
}
