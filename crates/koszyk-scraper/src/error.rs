use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser failed to start: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page {url} not ready after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("devtools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("scrape attempt cancelled")]
    Cancelled,

    #[error("remote browser discovery at {url} failed: {reason}")]
    Discovery { url: String, reason: String },

    #[error("no webSocketDebuggerUrl in {url} response")]
    MissingDebuggerUrl { url: String },

    #[error("invalid extraction pattern for store {store}: {source}")]
    InvalidPattern {
        store: String,
        #[source]
        source: regex::Error,
    },

    #[error("scrape task failed: {0}")]
    Task(String),

    #[error("no stores requested")]
    NoStores,
}

impl ScrapeError {
    /// Short machine-readable label used in reports and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Launch(_) => "launch_error",
            ScrapeError::Navigation { .. } | ScrapeError::NavigationTimeout { .. } => {
                "navigation_error"
            }
            ScrapeError::Cdp(_) => "cdp_error",
            ScrapeError::Cancelled => "cancelled",
            ScrapeError::Discovery { .. } | ScrapeError::MissingDebuggerUrl { .. } => {
                "discovery_error"
            }
            ScrapeError::InvalidPattern { .. } => "invalid_pattern",
            ScrapeError::Task(_) => "task_error",
            ScrapeError::NoStores => "no_stores",
        }
    }
}
