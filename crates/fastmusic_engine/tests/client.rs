use std::time::Duration;

use fastmusic_core::{AudioQuality, DownloadRequest, Locator};
use fastmusic_engine::{Backend, BackendSettings, FailureKind, ReqwestBackend};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> ReqwestBackend {
    ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .unwrap()
}

fn request(url: &str, quality: AudioQuality) -> DownloadRequest {
    DownloadRequest {
        locator: Locator::encode(url),
        quality,
    }
}

#[tokio::test]
async fn search_sends_query_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "daft punk & friends"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"video_id": "abc123", "title": "One More Time", "channel": "Daft Punk", "duration": "5:20"},
                {"video_id": "def456", "title": "Aerodynamic", "channel": "Daft Punk", "duration": "3:27"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = backend_for(&server)
        .search("  daft punk & friends ")
        .await
        .expect("search ok");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "abc123");
    assert_eq!(results[1].title, "Aerodynamic");
}

#[tokio::test]
async fn search_with_missing_results_key_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let results = backend_for(&server).search("nothing").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn blank_search_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend_for(&server).search("   ").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidInput);
}

#[tokio::test]
async fn search_error_uses_detail_then_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "boom"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Search failed: quota"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "bare"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.search("boom").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, "Search failed: quota");

    let err = backend.search("bare").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
    assert_eq!(err.message, "Search failed");
}

#[tokio::test]
async fn malformed_search_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend_for(&server).search("x").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn download_posts_locator_and_quality() {
    let server = MockServer::start().await;
    let url = "https://www.youtube.com/watch?v=abc";
    Mock::given(method("POST"))
        .and(path("/download"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "encoded_url": "aHR0cHM6Ly93d3cueW91dHViZS5jb20vd2F0Y2g/dj1hYmM=",
            "quality": "320"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"Song.mp3\"")
                .set_body_raw(b"ID3audio".to_vec(), "audio/mpeg"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let payload = backend_for(&server)
        .download(&request(url, AudioQuality::Kbps320))
        .await
        .expect("download ok");
    assert_eq!(&payload.bytes[..], b"ID3audio");
    assert_eq!(
        payload.content_disposition.as_deref(),
        Some("attachment; filename=\"Song.mp3\"")
    );
}

#[tokio::test]
async fn download_error_reports_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid YouTube URL"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .download(&request("https://example.com", AudioQuality::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.to_string(), "Invalid YouTube URL");
}

#[tokio::test]
async fn oversized_download_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 64], "audio/mpeg"))
        .mount(&server)
        .await;

    let backend = ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        max_bytes: 16,
        ..BackendSettings::default()
    })
    .unwrap();
    let err = backend
        .download(&request("https://youtu.be/abc", AudioQuality::Kbps128))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 16, .. }));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let backend = ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(200),
        ..BackendSettings::default()
    })
    .unwrap();
    let err = backend
        .download(&request("https://youtu.be/abc", AudioQuality::Kbps128))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let backend = ReqwestBackend::new(BackendSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        connect_timeout: Duration::from_secs(2),
        ..BackendSettings::default()
    })
    .unwrap();
    let err = backend.search("anything").await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
    assert!(!err.message.is_empty());
}

#[tokio::test]
async fn health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    let status = backend_for(&server).health().await.unwrap();
    assert_eq!(status, "healthy");
}
