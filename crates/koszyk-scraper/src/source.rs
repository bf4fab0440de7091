//! Rendering seam between the orchestrator and the browser.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ScrapeError;

/// Rendered DOM of one page, captured after navigation and settling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Final URL after redirects.
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Produces rendered page snapshots.
///
/// Implementations must release every resource they acquire before
/// returning, including when `cancel` fires mid-render.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn render(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PageSnapshot, ScrapeError>;
}
