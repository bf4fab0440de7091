use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop Chrome identity sent by the headless browser.
pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("KOSZYK_ENV", "development"))?;

    let bind_addr = or_default("KOSZYK_BIND_ADDR", "0.0.0.0:3001")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("KOSZYK_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("KOSZYK_LOG_LEVEL", "info");
    let stores_path = PathBuf::from(or_default("KOSZYK_STORES_PATH", "./config/stores.yaml"));

    let catalog_stores: Vec<String> = or_default("KOSZYK_CATALOG_STORES", "LIDL")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if catalog_stores.is_empty() {
        return Err(invalid(
            "KOSZYK_CATALOG_STORES",
            "at least one store id is required".to_string(),
        ));
    }

    let cache_ttl_secs = parse_positive_u64("KOSZYK_CACHE_TTL_SECS", "1800")?;
    let scrape_timeout_secs = parse_positive_u64("KOSZYK_SCRAPE_TIMEOUT_SECS", "15")?;
    let navigation_timeout_secs = parse_positive_u64("KOSZYK_NAVIGATION_TIMEOUT_SECS", "15")?;
    let consent_timeout_secs = parse_u64("KOSZYK_CONSENT_TIMEOUT_SECS", "3")?;
    let settle_delay_ms = parse_u64("KOSZYK_SETTLE_DELAY_MS", "3000")?;
    let consent_settle_ms = parse_u64("KOSZYK_CONSENT_SETTLE_MS", "2000")?;
    let teardown_grace_secs = parse_positive_u64("KOSZYK_TEARDOWN_GRACE_SECS", "5")?;

    let browser_user_agent = or_default("KOSZYK_BROWSER_USER_AGENT", DEFAULT_BROWSER_USER_AGENT);
    let chrome_executable = optional("KOSZYK_CHROME_EXECUTABLE").map(PathBuf::from);
    let browser_ws_url = optional("KOSZYK_BROWSER_WS_URL");
    let browser_headless = parse_bool("KOSZYK_BROWSER_HEADLESS", "true")?;

    let max_concurrent_stores = or_default("KOSZYK_MAX_CONCURRENT_STORES", "1")
        .parse::<usize>()
        .map_err(|e| invalid("KOSZYK_MAX_CONCURRENT_STORES", e.to_string()))?
        .max(1);

    let random_seed = optional("KOSZYK_RANDOM_SEED")
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|e| invalid("KOSZYK_RANDOM_SEED", e.to_string()))
        })
        .transpose()?;

    let refresh_cron = optional("KOSZYK_REFRESH_CRON");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        stores_path,
        catalog_stores,
        cache_ttl_secs,
        scrape_timeout_secs,
        navigation_timeout_secs,
        consent_timeout_secs,
        settle_delay_ms,
        consent_settle_ms,
        teardown_grace_secs,
        browser_user_agent,
        chrome_executable,
        browser_ws_url,
        browser_headless,
        max_concurrent_stores,
        random_seed,
        refresh_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything but
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KOSZYK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
