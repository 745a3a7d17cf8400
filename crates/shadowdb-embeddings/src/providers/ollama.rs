use serde::Deserialize;
use shadowdb_core::config::EmbeddingConfig;
use shadowdb_core::errors::EmbeddingError;

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Vec<f32>,
}

pub async fn embed(
    http: &reqwest::Client,
    config: &EmbeddingConfig,
    model: &str,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let base = config
        .ollama_url
        .as_deref()
        .unwrap_or("http://localhost:11434");
    let url = format!("{base}/api/embeddings");

    let mut request = http.post(&url).json(&serde_json::json!({
        "model": model,
        "prompt": text,
    }));
    for (key, value) in &config.headers {
        request = request.header(key, value);
    }

    let response = super::handle_response("ollama", request.send().await).await?;
    let parsed: OllamaResponse =
        response
            .json()
            .await
            .map_err(|e| EmbeddingError::ProviderTransport {
                provider: "ollama".to_string(),
                detail: e.to_string(),
            })?;

    Ok(parsed.embedding)
}
