use std::sync::Arc;

use koszyk_core::{StoreConfig, StoresFile};

use crate::error::ScrapeError;
use crate::extract::{build_extractor, Extractor};

/// A configured store plus its compiled extractor, if any.
#[derive(Clone)]
pub struct StoreEntry {
    pub config: StoreConfig,
    pub extractor: Option<Arc<dyn Extractor>>,
}

impl StoreEntry {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// `true` when the store can be scraped for real.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.extractor.is_some() && self.config.scrape_url.is_some()
    }
}

impl std::fmt::Debug for StoreEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEntry")
            .field("config", &self.config)
            .field("extractor", &self.extractor.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

/// Stores known to the orchestrator, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    entries: Vec<StoreEntry>,
}

impl StoreRegistry {
    /// Compile the extractors of every store in `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidPattern`] for the first store whose
    /// extraction rules do not compile.
    pub fn from_stores(file: &StoresFile) -> Result<Self, ScrapeError> {
        let entries = file
            .stores
            .iter()
            .map(|config| {
                let extractor = config
                    .extractor
                    .as_ref()
                    .map(|ex| build_extractor(&config.id, ex))
                    .transpose()?;
                Ok(StoreEntry {
                    config: config.clone(),
                    extractor,
                })
            })
            .collect::<Result<Vec<_>, ScrapeError>>()?;
        Ok(Self { entries })
    }

    /// Case-insensitive lookup by store id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoreEntry> {
        self.entries
            .iter()
            .find(|entry| entry.config.id.eq_ignore_ascii_case(id))
    }

    pub fn entries(&self) -> impl Iterator<Item = &StoreEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.config.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_one_active_store() {
        let registry = StoreRegistry::from_stores(&StoresFile::builtin()).expect("builtin compiles");
        let active: Vec<&str> = registry
            .entries()
            .filter(|e| e.is_active())
            .map(StoreEntry::id)
            .collect();
        assert_eq!(active, vec!["LIDL"]);
        assert_eq!(registry.ids(), vec!["LIDL", "Biedronka", "Auchan"]);
    }

    #[test]
    fn lookup_ignores_case() {
        let registry = StoreRegistry::from_stores(&StoresFile::builtin()).expect("builtin compiles");
        assert!(registry.get("lidl").is_some());
        assert!(registry.get("Kaufland").is_none());
    }

    #[test]
    fn bad_pattern_names_the_store() {
        let mut file = StoresFile::builtin();
        if let Some(extractor) = file.stores[0].extractor.as_mut() {
            extractor.rules.name_pattern = "[".to_string();
        }
        let err = StoreRegistry::from_stores(&file).unwrap_err();
        assert!(
            matches!(err, ScrapeError::InvalidPattern { ref store, .. } if store == "LIDL"),
            "got: {err:?}"
        );
    }
}
