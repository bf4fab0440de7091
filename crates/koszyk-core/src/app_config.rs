use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub stores_path: PathBuf,
    /// Store ids the catalog scrapes on a cache miss.
    pub catalog_stores: Vec<String>,
    pub cache_ttl_secs: u64,
    pub scrape_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub consent_timeout_secs: u64,
    pub settle_delay_ms: u64,
    /// Extra wait after a cookie banner was dismissed.
    pub consent_settle_ms: u64,
    pub teardown_grace_secs: u64,
    pub browser_user_agent: String,
    pub chrome_executable: Option<PathBuf>,
    /// Remote Chrome endpoint (`ws://` or `http://`); launches locally when unset.
    pub browser_ws_url: Option<String>,
    pub browser_headless: bool,
    pub max_concurrent_stores: usize,
    pub random_seed: Option<u64>,
    pub refresh_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("stores_path", &self.stores_path)
            .field("catalog_stores", &self.catalog_stores)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("scrape_timeout_secs", &self.scrape_timeout_secs)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("consent_timeout_secs", &self.consent_timeout_secs)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("consent_settle_ms", &self.consent_settle_ms)
            .field("teardown_grace_secs", &self.teardown_grace_secs)
            .field("browser_user_agent", &self.browser_user_agent)
            .field("chrome_executable", &self.chrome_executable)
            .field(
                "browser_ws_url",
                &self.browser_ws_url.as_ref().map(|_| "[redacted]"),
            )
            .field("browser_headless", &self.browser_headless)
            .field("max_concurrent_stores", &self.max_concurrent_stores)
            .field("random_seed", &self.random_seed)
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
