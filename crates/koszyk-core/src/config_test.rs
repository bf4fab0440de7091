use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "KOSZYK_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults are valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3001");
    assert_eq!(cfg.catalog_stores, vec!["LIDL".to_string()]);
    assert_eq!(cfg.cache_ttl_secs, 1800);
    assert_eq!(cfg.scrape_timeout_secs, 15);
    assert_eq!(cfg.navigation_timeout_secs, 15);
    assert_eq!(cfg.consent_timeout_secs, 3);
    assert_eq!(cfg.settle_delay_ms, 3000);
    assert_eq!(cfg.consent_settle_ms, 2000);
    assert!(cfg.browser_headless);
    assert_eq!(cfg.max_concurrent_stores, 1);
    assert_eq!(cfg.random_seed, None);
    assert_eq!(cfg.refresh_cron, None);
    assert_eq!(cfg.browser_user_agent, DEFAULT_BROWSER_USER_AGENT);
}

#[test]
fn build_app_config_splits_catalog_stores() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_CATALOG_STORES", " LIDL, Biedronka ,,Auchan ");
    let cfg = build_app_config(lookup_from_map(&map)).expect("valid");
    assert_eq!(cfg.catalog_stores, vec!["LIDL", "Biedronka", "Auchan"]);
}

#[test]
fn build_app_config_rejects_blank_catalog_stores() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_CATALOG_STORES", " , ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KOSZYK_CATALOG_STORES"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KOSZYK_BIND_ADDR"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_ttl() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_CACHE_TTL_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KOSZYK_CACHE_TTL_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_parses_seed_and_headless() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_RANDOM_SEED", "42");
    map.insert("KOSZYK_BROWSER_HEADLESS", "false");
    map.insert("KOSZYK_REFRESH_CRON", "0 */30 * * * *");
    let cfg = build_app_config(lookup_from_map(&map)).expect("valid");
    assert_eq!(cfg.random_seed, Some(42));
    assert!(!cfg.browser_headless);
    assert_eq!(cfg.refresh_cron.as_deref(), Some("0 */30 * * * *"));
}

#[test]
fn build_app_config_rejects_bad_boolean() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_BROWSER_HEADLESS", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KOSZYK_BROWSER_HEADLESS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_blank_optional_values_are_unset() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_BROWSER_WS_URL", "   ");
    map.insert("KOSZYK_CHROME_EXECUTABLE", "");
    let cfg = build_app_config(lookup_from_map(&map)).expect("valid");
    assert!(cfg.browser_ws_url.is_none());
    assert!(cfg.chrome_executable.is_none());
}

#[test]
fn debug_output_redacts_browser_endpoint() {
    let mut map = HashMap::new();
    map.insert("KOSZYK_BROWSER_WS_URL", "ws://user:secret@chrome:9222");
    let cfg = build_app_config(lookup_from_map(&map)).expect("valid");
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("secret"));
    assert!(debug.contains("[redacted]"));
}
