//! End-to-end exercise of the facade over a real (file-backed) SQLite
//! database, with a mock Ollama endpoint standing in for the embedding
//! provider: write, search, path-based retrieval, and the delete/undelete
//! cycle.

use shadowdb::{Facade, ShadowDbConfig};
use shadowdb_core::config::{BackendKind, ConnectionConfig, EmbeddingConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn connect_temp() -> (Facade, tempfile::TempDir, MockServer) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shadowdb_test.sqlite3");

    let embed_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": vec![0.1_f32; 8],
        })))
        .mount(&embed_server)
        .await;

    let mut config = ShadowDbConfig::default();
    config.connection = ConnectionConfig {
        backend: BackendKind::Sqlite,
        url: Some(format!("sqlite://{}", db_path.display())),
        ..Default::default()
    };
    config.embedding = EmbeddingConfig {
        provider: "ollama".to_string(),
        dimensions: 8,
        ollama_url: Some(embed_server.uri()),
        ..Default::default()
    };

    let facade = Facade::connect(config).await.unwrap();
    (facade, dir, embed_server)
}

#[tokio::test]
async fn write_then_get_by_path_round_trips() {
    let (facade, _dir, _server) = connect_temp().await;

    let sample = &test_fixtures::sample_memories()[0];
    let result = facade
        .write(&sample.content, Some(&sample.category), sample.title.as_deref(), &sample.tags)
        .await
        .unwrap();
    assert!(result.ok);
    assert_eq!(result.embedded, Some(true));
    let id = result.id.unwrap();

    let view = facade.get(id).await.unwrap().unwrap();
    assert_eq!(view.text, sample.content);
    assert_eq!(view.path, format!("shadowdb/{}/{}", sample.category, id));

    let by_path = facade
        .get_by_path(&format!("shadowdb/{}/{}", sample.category, id), None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_path.text, sample.content);
}

#[tokio::test]
async fn search_surfaces_written_record() {
    let (facade, _dir, _server) = connect_temp().await;

    for sample in test_fixtures::sample_memories() {
        facade
            .write(&sample.content, Some(&sample.category), sample.title.as_deref(), &sample.tags)
            .await
            .unwrap();
    }

    // The sqlite text leg matches the whole query as one FTS5 phrase, so the
    // query must appear verbatim and contiguous in the target record.
    let results = facade.search("Annie Lin", None, None).await.unwrap();
    assert!(results.iter().any(|r| r.snippet.contains("Annie Lin")));
}

#[tokio::test]
async fn get_by_path_category_listing_returns_recent_records() {
    let (facade, _dir, _server) = connect_temp().await;

    for sample in test_fixtures::sample_memories().into_iter().filter(|m| m.category == "people") {
        facade
            .write(&sample.content, Some(&sample.category), sample.title.as_deref(), &sample.tags)
            .await
            .unwrap();
    }

    let listing = facade.get_by_path("shadowdb/people", None, None).await.unwrap().unwrap();
    assert_eq!(listing.path, "shadowdb/people");
    assert!(listing.text.contains("Annie Lin") || listing.text.contains("Marcus Webb"));
}

#[tokio::test]
async fn delete_then_undelete_restores_visibility() {
    let (facade, _dir, _server) = connect_temp().await;

    let sample = &test_fixtures::sample_memories()[1];
    let id = facade
        .write(&sample.content, Some(&sample.category), sample.title.as_deref(), &sample.tags)
        .await
        .unwrap()
        .id
        .unwrap();

    facade.delete(id).await.unwrap();
    assert!(facade.get(id).await.unwrap().is_none());

    facade.undelete(id).await.unwrap();
    assert!(facade.get(id).await.unwrap().is_some());
}

#[tokio::test]
async fn update_omitting_category_preserves_path() {
    let (facade, _dir, _server) = connect_temp().await;

    let sample = &test_fixtures::sample_memories()[0];
    let id = facade
        .write(&sample.content, Some(&sample.category), sample.title.as_deref(), &sample.tags)
        .await
        .unwrap()
        .id
        .unwrap();

    let result = facade.update(id, None, Some("Annie Lin (updated)"), None, None).await.unwrap();
    assert!(result.ok);
    assert_eq!(result.path.as_deref(), Some(format!("shadowdb/{}/{}", sample.category, id)).as_deref());
}

#[tokio::test]
async fn primer_context_is_absent_with_no_rows() {
    let (facade, _dir, _server) = connect_temp().await;
    assert!(facade.get_primer_context("session-1", None).await.is_none());
}

#[tokio::test]
async fn ping_reports_live_connection() {
    let (facade, _dir, _server) = connect_temp().await;
    assert!(facade.ping().await);
}
