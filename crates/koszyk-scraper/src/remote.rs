//! Discovery of a remote Chrome's DevTools websocket.

use serde::Deserialize;
use tracing::debug;

use crate::error::ScrapeError;

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Resolve `endpoint` to a browser websocket URL.
///
/// A `ws://.../devtools/browser/...` URL is used as-is. Anything else is
/// treated as the DevTools HTTP root and queried at `/json/version`.
///
/// # Errors
///
/// - [`ScrapeError::Discovery`] if the version endpoint is unreachable,
///   returns a non-2xx status, or returns malformed JSON.
/// - [`ScrapeError::MissingDebuggerUrl`] if the response has no websocket URL.
pub async fn resolve_ws_url(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<String, ScrapeError> {
    if is_browser_ws_url(endpoint) {
        return Ok(endpoint.to_string());
    }

    let http_root = endpoint
        .replacen("wss://", "https://", 1)
        .replacen("ws://", "http://", 1);
    let version_url = format!("{}/json/version", http_root.trim_end_matches('/'));
    debug!(url = %version_url, "querying remote browser version");

    let discovery_error = |reason: String| ScrapeError::Discovery {
        url: version_url.clone(),
        reason,
    };

    let response = client
        .get(&version_url)
        .send()
        .await
        .map_err(|e| discovery_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(discovery_error(format!("unexpected status {status}")));
    }

    let info: VersionInfo = response
        .json()
        .await
        .map_err(|e| discovery_error(e.to_string()))?;

    info.web_socket_debugger_url
        .filter(|url| !url.is_empty())
        .ok_or(ScrapeError::MissingDebuggerUrl { url: version_url })
}

fn is_browser_ws_url(endpoint: &str) -> bool {
    (endpoint.starts_with("ws://") || endpoint.starts_with("wss://"))
        && endpoint.contains("/devtools/browser/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_ws_url_is_recognized() {
        assert!(is_browser_ws_url(
            "ws://127.0.0.1:9222/devtools/browser/abc-123"
        ));
        assert!(!is_browser_ws_url("ws://127.0.0.1:9222"));
        assert!(!is_browser_ws_url("http://127.0.0.1:9222"));
    }
}
