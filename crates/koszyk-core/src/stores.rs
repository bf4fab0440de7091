use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::rules::ExtractionRules;
use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Price-pattern scan over every element of the rendered page.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub kind: ExtractorKind,
    #[serde(default)]
    pub rules: ExtractionRules,
}

/// One retailer the scraper knows about.
///
/// A store with an `extractor` is scraped for real; one without is
/// "planned" and only ever served synthetic report counts and fallback data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Identifier used in requests and record tags, e.g. `"LIDL"`.
    pub id: String,
    pub name: String,
    pub base_url: String,
    /// Listing page rendered for extraction. Required with an extractor.
    #[serde(default)]
    pub scrape_url: Option<String>,
    #[serde(default)]
    pub extractor: Option<ExtractorConfig>,
}

impl StoreConfig {
    #[must_use]
    pub fn has_extractor(&self) -> bool {
        self.extractor.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreConfig>,
}

impl StoresFile {
    /// Registry used when no stores file exists: Lidl with the heuristic
    /// extractor, Biedronka and Auchan as planned stores.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            stores: vec![
                StoreConfig {
                    id: "LIDL".to_string(),
                    name: "Lidl Polska".to_string(),
                    base_url: "https://www.lidl.pl".to_string(),
                    scrape_url: Some("https://www.lidl.pl/c/zywnosc-i-napoje/s10068374".to_string()),
                    extractor: Some(ExtractorConfig {
                        kind: ExtractorKind::Heuristic,
                        rules: ExtractionRules::default(),
                    }),
                },
                StoreConfig {
                    id: "Biedronka".to_string(),
                    name: "Biedronka".to_string(),
                    base_url: "https://www.biedronka.pl".to_string(),
                    scrape_url: None,
                    extractor: None,
                },
                StoreConfig {
                    id: "Auchan".to_string(),
                    name: "Auchan Polska".to_string(),
                    base_url: "https://www.auchan.pl".to_string(),
                    scrape_url: None,
                    extractor: None,
                },
            ],
        }
    }

    /// Case-insensitive lookup by store id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&StoreConfig> {
        self.stores.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }
}

/// Load and validate the store registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_stores(&content)
}

/// Like [`load_stores`], but falls back to [`StoresFile::builtin`] when no
/// file exists at `path`.
///
/// # Errors
///
/// Returns `ConfigError` if an existing file cannot be read, parsed, or fails
/// validation.
pub fn load_stores_or_builtin(path: &Path) -> Result<StoresFile, ConfigError> {
    if path.exists() {
        load_stores(path)
    } else {
        Ok(StoresFile::builtin())
    }
}

/// Parse and validate a store registry from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_stores(content: &str) -> Result<StoresFile, ConfigError> {
    let stores_file: StoresFile = serde_yaml::from_str(content)?;
    validate_stores(&stores_file)?;
    Ok(stores_file)
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    if stores_file.stores.is_empty() {
        return Err(ConfigError::Validation(
            "at least one store must be configured".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for store in &stores_file.stores {
        if store.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(store.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: '{}'",
                store.id
            )));
        }

        if !is_http_url(&store.base_url) {
            return Err(ConfigError::Validation(format!(
                "store '{}' has invalid base_url '{}'; must start with http:// or https://",
                store.id, store.base_url
            )));
        }

        match (&store.extractor, &store.scrape_url) {
            (Some(_), None) => {
                return Err(ConfigError::Validation(format!(
                    "store '{}' configures an extractor but no scrape_url",
                    store.id
                )));
            }
            (_, Some(url)) if !is_http_url(url) => {
                return Err(ConfigError::Validation(format!(
                    "store '{}' has invalid scrape_url '{url}'",
                    store.id
                )));
            }
            _ => {}
        }

        if let Some(extractor) = &store.extractor {
            let rules = &extractor.rules;
            if rules.discount_cents_min >= rules.discount_cents_max {
                return Err(ConfigError::Validation(format!(
                    "store '{}' has an empty discount range",
                    store.id
                )));
            }
            if rules.synthetic_names.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "store '{}' needs at least one synthetic name",
                    store.id
                )));
            }
        }
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
