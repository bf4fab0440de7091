//! Integration tests for remote browser discovery via `/json/version`.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use koszyk_scraper::{resolve_ws_url, ScrapeError};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("failed to build test client")
}

#[tokio::test]
async fn resolves_debugger_url_from_version_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Browser": "HeadlessChrome/124.0.6367.60",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ws = resolve_ws_url(&client(), &server.uri()).await.expect("resolve");
    assert_eq!(ws, "ws://127.0.0.1:9222/devtools/browser/abc-123");
}

#[tokio::test]
async fn ws_scheme_endpoint_is_queried_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "webSocketDebuggerUrl": "ws://chrome:9222/devtools/browser/xyz"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = server.uri().replacen("http://", "ws://", 1);
    let ws = resolve_ws_url(&client(), &endpoint).await.expect("resolve");
    assert_eq!(ws, "ws://chrome:9222/devtools/browser/xyz");
}

#[tokio::test]
async fn full_browser_ws_url_skips_discovery() {
    let ws = resolve_ws_url(&client(), "ws://127.0.0.1:1/devtools/browser/direct")
        .await
        .expect("used as-is");
    assert_eq!(ws, "ws://127.0.0.1:1/devtools/browser/direct");
}

#[tokio::test]
async fn missing_debugger_url_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Browser": "Chrome"})))
        .mount(&server)
        .await;

    let err = resolve_ws_url(&client(), &server.uri()).await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::MissingDebuggerUrl { ref url } if url.ends_with("/json/version")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn server_error_is_a_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = resolve_ws_url(&client(), &server.uri()).await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::Discovery { ref reason, .. } if reason.contains("500")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_json_is_a_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = resolve_ws_url(&client(), &server.uri()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Discovery { .. }), "got: {err:?}");
}
