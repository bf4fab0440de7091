//! One headless browser page with guaranteed teardown.

use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use koszyk_core::AppConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::remote::resolve_ws_url;
use crate::source::{PageSnapshot, PageSource};

pub const CONSENT_SELECTOR: &str = r#"button[id*="accept"], #onetrust-accept-btn-handler"#;

const LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-features=VizDisplayCompositor",
];

const READY_POLL: Duration = Duration::from_millis(100);
const CONSENT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub user_agent: String,
    pub chrome_executable: Option<PathBuf>,
    /// Connect here instead of launching a local browser.
    pub remote_url: Option<String>,
    pub headless: bool,
    /// Bounds browser launch, and separately navigation plus DOM-ready.
    pub navigation_timeout: Duration,
    pub consent_timeout: Duration,
    pub consent_selector: String,
    pub settle_delay: Duration,
    /// Added to the settle delay when a consent control was clicked.
    pub consent_settle: Duration,
    pub close_timeout: Duration,
}

impl BrowserSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.browser_user_agent.clone(),
            chrome_executable: config.chrome_executable.clone(),
            remote_url: config.browser_ws_url.clone(),
            headless: config.browser_headless,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            consent_timeout: Duration::from_secs(config.consent_timeout_secs),
            consent_selector: CONSENT_SELECTOR.to_string(),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            consent_settle: Duration::from_millis(config.consent_settle_ms),
            close_timeout: Duration::from_secs(config.teardown_grace_secs),
        }
    }

    /// Wait between DOM-ready and capture.
    #[must_use]
    pub fn settle_after(&self, consent_clicked: bool) -> Duration {
        if consent_clicked {
            self.consent_settle + self.settle_delay
        } else {
            self.settle_delay
        }
    }
}

/// Poll `check` until it reports `interactive` or `complete`.
///
/// Check errors are expected while a navigation swaps execution contexts;
/// they are logged and retried. The caller bounds the wait.
async fn wait_until_ready<F, Fut, E>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: Display,
{
    loop {
        match check().await {
            Ok(state) if state == "interactive" || state == "complete" => return,
            Ok(_) => {}
            Err(e) => debug!(error = %e, "readyState check failed; retrying"),
        }
        tokio::time::sleep(READY_POLL).await;
    }
}

/// A browser page owned for the duration of one scrape.
///
/// Call [`PageSession::close`] on every path. If a session is dropped
/// without it (e.g. its task was aborted), the CDP handler is aborted and
/// a locally launched browser process is killed by `Browser`'s own drop.
pub struct PageSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    /// `false` for remote browsers, which are left running on close.
    owned: bool,
    settings: BrowserSettings,
}

impl PageSession {
    /// Launch (or connect to) a browser and open a blank page with the
    /// configured user agent.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Launch`] if the browser cannot be started in time.
    /// - [`ScrapeError::Discovery`] / [`ScrapeError::MissingDebuggerUrl`] for
    ///   an unreachable remote browser.
    /// - [`ScrapeError::Cdp`] if the page cannot be created.
    pub async fn open(settings: &BrowserSettings) -> Result<Self, ScrapeError> {
        let (browser, mut handler, owned) = match settings.remote_url.as_deref() {
            Some(endpoint) => {
                let client = reqwest::Client::builder()
                    .timeout(settings.navigation_timeout)
                    .build()
                    .map_err(|e| ScrapeError::Launch(e.to_string()))?;
                let ws_url = resolve_ws_url(&client, endpoint).await?;
                info!(ws_url = %ws_url, "connecting to remote browser");
                let (browser, handler) =
                    tokio::time::timeout(settings.navigation_timeout, Browser::connect(ws_url))
                        .await
                        .map_err(|e| ScrapeError::Launch(e.to_string()))?
                        .map_err(|e| ScrapeError::Launch(e.to_string()))?;
                (browser, handler, false)
            }
            None => {
                let config = launch_config(settings)?;
                debug!(headless = settings.headless, "launching browser");
                let (browser, handler) =
                    tokio::time::timeout(settings.navigation_timeout, Browser::launch(config))
                        .await
                        .map_err(|e| ScrapeError::Launch(e.to_string()))?
                        .map_err(|e| ScrapeError::Launch(e.to_string()))?;
                (browser, handler, true)
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let mut session = Self {
            browser: Some(browser),
            page: None,
            handler: Some(handler),
            owned,
            settings: settings.clone(),
        };

        match session.new_page().await {
            Ok(page) => {
                session.page = Some(page);
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn new_page(&self) -> Result<Page, ScrapeError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScrapeError::Launch("browser already closed".to_string()))?;
        let page = browser.new_page("about:blank").await?;
        page.execute(SetUserAgentOverrideParams::new(self.settings.user_agent.clone()))
            .await?;
        Ok(page)
    }

    fn page(&self) -> Result<&Page, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Launch("page already closed".to_string()))
    }

    /// Navigate to `url`, dismiss a cookie banner if one shows up, let the
    /// page settle and capture its rendered DOM.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::NavigationTimeout`] if the DOM is not ready in time.
    /// - [`ScrapeError::Navigation`] if the browser reports a load error.
    /// - [`ScrapeError::Cdp`] for protocol failures while reading the page.
    pub async fn load(&self, url: &str) -> Result<PageSnapshot, ScrapeError> {
        let started = tokio::time::Instant::now();
        let timeout = self.settings.navigation_timeout;

        match tokio::time::timeout(timeout, self.navigate(url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScrapeError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
        debug!(url, elapsed_ms = elapsed_ms(started), "dom ready");

        let clicked = self.accept_consent().await;
        tokio::time::sleep(self.settings.settle_after(clicked)).await;

        let page = self.page()?;
        let html = page.content().await?;
        let final_url = page.url().await?.unwrap_or_else(|| url.to_string());
        info!(
            url = %final_url,
            bytes = html.len(),
            elapsed_ms = elapsed_ms(started),
            "page captured"
        );
        Ok(PageSnapshot::new(final_url, html))
    }

    async fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        let page = self.page()?;
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|reason| ScrapeError::Navigation {
                url: url.to_string(),
                reason,
            })?;

        let response = page.execute(params).await?;
        if let Some(reason) = response.result.error_text.clone() {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason,
            });
        }

        wait_until_ready(move || async move {
            page.evaluate("document.readyState")
                .await
                .map(|result| result.into_value::<String>().unwrap_or_default())
        })
        .await;
        Ok(())
    }

    /// Click the consent control if it appears within the consent timeout.
    /// Absence is normal and only logged. Returns whether a click landed.
    async fn accept_consent(&self) -> bool {
        let Ok(page) = self.page() else { return false };
        let selector = self.settings.consent_selector.as_str();

        let find = async {
            loop {
                if let Ok(element) = page.find_element(selector).await {
                    return element;
                }
                tokio::time::sleep(CONSENT_POLL).await;
            }
        };

        match tokio::time::timeout(self.settings.consent_timeout, find).await {
            Ok(element) => match element.click().await {
                Ok(_) => {
                    debug!("cookie consent accepted");
                    true
                }
                Err(e) => {
                    debug!(error = %e, "cookie consent click failed");
                    false
                }
            },
            Err(_) => {
                debug!("no cookie consent control");
                false
            }
        }
    }

    /// Close the page and, for a launched browser, the browser process.
    /// Bounded by the configured close timeout; never fails.
    pub async fn close(mut self) {
        let page = self.page.take();
        let browser = self.browser.take();
        let owned = self.owned;

        let teardown = async move {
            if let Some(page) = page {
                if let Err(e) = page.close().await {
                    debug!(error = %e, "page close failed");
                }
            }
            if let Some(mut browser) = browser {
                if owned {
                    if let Err(e) = browser.close().await {
                        debug!(error = %e, "browser close failed");
                    }
                    if let Err(e) = browser.wait().await {
                        debug!(error = %e, "browser wait failed");
                    }
                }
            }
        };

        if tokio::time::timeout(self.settings.close_timeout, teardown)
            .await
            .is_err()
        {
            warn!(
                timeout_secs = self.settings.close_timeout.as_secs(),
                "browser teardown timed out; process killed on drop"
            );
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if self.browser.is_some() || self.page.is_some() {
            warn!("page session dropped without close; releasing browser");
        }
    }
}

/// [`PageSource`] backed by a fresh [`PageSession`] per render.
#[derive(Debug, Clone)]
pub struct ChromiumPageSource {
    settings: BrowserSettings,
}

impl ChromiumPageSource {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PageSource for ChromiumPageSource {
    async fn render(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PageSnapshot, ScrapeError> {
        let session = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            opened = PageSession::open(&self.settings) => opened?,
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ScrapeError::Cancelled),
            loaded = session.load(url) => loaded,
        };

        session.close().await;
        result
    }
}

pub(crate) fn elapsed_ms(started: tokio::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn launch_config(settings: &BrowserSettings) -> Result<BrowserConfig, ScrapeError> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .request_timeout(settings.navigation_timeout);
    for arg in LAUNCH_ARGS {
        builder = builder.arg(*arg);
    }
    if !settings.headless {
        builder = builder.with_head();
    }
    if let Some(path) = &settings.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    builder.build().map_err(ScrapeError::Launch)
}
