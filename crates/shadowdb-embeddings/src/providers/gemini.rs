use serde::Deserialize;
use shadowdb_core::config::EmbeddingConfig;
use shadowdb_core::errors::EmbeddingError;

#[derive(Deserialize)]
struct GeminiResponse {
    embedding: GeminiEmbeddingValues,
}

#[derive(Deserialize)]
struct GeminiEmbeddingValues {
    values: Vec<f32>,
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
        .unwrap_or("https://generativelanguage.googleapis.com/v1beta");
    let api_key = config.api_key.as_deref().unwrap_or_default();
    let url = format!(
        "{}/models/{model}:embedContent?key={api_key}",
        base.trim_end_matches('/')
    );

    let mut body = serde_json::json!({
        "content": { "parts": [{ "text": text }] },
    });
    if let Some(task_type) = &config.gemini_task_type {
        body["taskType"] = serde_json::Value::String(task_type.clone());
    }

    let mut request = http.post(&url).json(&body);
    for (key, value) in &config.headers {
        request = request.header(key, value);
    }

    let response = super::handle_response("gemini", request.send().await).await?;
    let parsed: GeminiResponse =
        response
            .json()
            .await
            .map_err(|e| EmbeddingError::ProviderTransport {
                provider: "gemini".to_string(),
                detail: e.to_string(),
            })?;

    Ok(parsed.embedding.values)
}
