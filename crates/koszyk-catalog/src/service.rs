//! The catalog façade: cache-or-scrape reads, forced refresh, search.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use koszyk_core::{AppConfig, ProductRecord, StoresFile};
use koszyk_scraper::{
    BrowserSettings, ChromiumPageSource, FallbackCatalog, OrchestratorSettings, PageSource,
    RandomSource, ScrapeError, ScrapeOrchestrator, ScrapeRequest, ScrapeRun, StoreRegistry,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::{CatalogSnapshot, ProductCache};
use crate::status::{ScrapeStatus, ScraperAvailability, StatusTracker};

/// A catalog read and whether it was served from cache.
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub snapshot: Arc<CatalogSnapshot>,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub availability: ScraperAvailability,
    pub records: usize,
}

pub struct CatalogService {
    orchestrator: ScrapeOrchestrator,
    cache: Arc<ProductCache>,
    default_stores: Vec<String>,
    /// Serializes cache refills so concurrent misses share one scrape.
    refresh_gate: Mutex<()>,
    status: StatusTracker,
    refresh_schedule: Option<String>,
}

impl CatalogService {
    /// `cache` may be shared with other holders; the service only reads,
    /// writes and invalidates it.
    #[must_use]
    pub fn new(
        orchestrator: ScrapeOrchestrator,
        cache: Arc<ProductCache>,
        default_stores: Vec<String>,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            default_stores,
            refresh_gate: Mutex::new(()),
            status: StatusTracker::default(),
            refresh_schedule: None,
        }
    }

    #[must_use]
    pub fn with_refresh_schedule(mut self, schedule: Option<String>) -> Self {
        self.refresh_schedule = schedule;
        self
    }

    /// Build the service with a Chromium page source from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidPattern`] if a store's extraction rules
    /// do not compile.
    pub fn from_config(config: &AppConfig, stores: &StoresFile) -> Result<Self, ScrapeError> {
        let source: Arc<dyn PageSource> =
            Arc::new(ChromiumPageSource::new(BrowserSettings::from_app_config(config)));
        Self::with_source(config, stores, source)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied page source.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidPattern`] if a store's extraction rules
    /// do not compile.
    pub fn with_source(
        config: &AppConfig,
        stores: &StoresFile,
        source: Arc<dyn PageSource>,
    ) -> Result<Self, ScrapeError> {
        let registry = StoreRegistry::from_stores(stores)?;
        for id in &config.catalog_stores {
            if registry.get(id).is_none() {
                warn!(store = %id, "default catalog store is not in the registry");
            }
        }
        let orchestrator = ScrapeOrchestrator::new(
            source,
            registry,
            OrchestratorSettings::from_app_config(config),
            RandomSource::from_seed(config.random_seed),
        );
        let cache = Arc::new(ProductCache::new(Duration::from_secs(config.cache_ttl_secs)));
        Ok(Self::new(
            orchestrator,
            cache,
            config.catalog_stores.clone(),
        )
        .with_refresh_schedule(config.refresh_cron.clone()))
    }

    #[must_use]
    pub fn orchestrator(&self) -> &ScrapeOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn default_stores(&self) -> &[String] {
        &self.default_stores
    }

    /// Cached snapshot when fresh; otherwise scrape the default stores and
    /// cache the result. Never fails: any failure yields fallback data.
    pub async fn get_products(&self) -> CatalogView {
        if let Some(snapshot) = self.cache.read().await {
            return CatalogView {
                snapshot,
                cached: true,
            };
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refilled the cache while we waited.
        if let Some(snapshot) = self.cache.read().await {
            return CatalogView {
                snapshot,
                cached: true,
            };
        }

        CatalogView {
            snapshot: self.load_fresh().await,
            cached: false,
        }
    }

    /// Invalidate the cache and reload it.
    pub async fn refresh(&self) -> CatalogView {
        let _gate = self.refresh_gate.lock().await;
        self.cache.invalidate().await;
        CatalogView {
            snapshot: self.load_fresh().await,
            cached: false,
        }
    }

    /// Case-insensitive substring search over the latest snapshot. Never
    /// scrapes; an empty cache yields no results.
    pub async fn search(&self, term: &str) -> Vec<ProductRecord> {
        let needle = term.trim().to_lowercase();
        match self.cache.latest().await {
            Some(snapshot) => snapshot
                .records
                .iter()
                .filter(|r| r.matches_term(&needle))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sorted distinct categories of the current catalog.
    pub async fn categories(&self) -> Vec<String> {
        let view = self.get_products().await;
        view.snapshot
            .records
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Registry stores with their scraper availability and current record counts.
    pub async fn stores(&self) -> Vec<StoreSummary> {
        let view = self.get_products().await;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &view.snapshot.records {
            *counts.entry(record.store.as_str()).or_default() += 1;
        }

        self.orchestrator
            .registry()
            .entries()
            .map(|entry| StoreSummary {
                id: entry.id().to_string(),
                name: entry.config.name.clone(),
                base_url: entry.config.base_url.clone(),
                availability: availability(entry.is_active()),
                records: counts.get(entry.id()).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Run an ad-hoc scrape. Does not touch the catalog cache.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::NoStores`] if no store was requested.
    pub async fn run_scrape(&self, request: &ScrapeRequest) -> Result<ScrapeRun, ScrapeError> {
        let _running = self.status.begin();
        let run = self.orchestrator.run(request).await?;
        if run.report.is_real_scraping {
            self.status.record(&run.report);
        }
        Ok(run)
    }

    pub async fn status(&self) -> ScrapeStatus {
        let (last_run, last_update_counts) = self.status.last_run();
        let available_scrapers = self
            .orchestrator
            .registry()
            .entries()
            .map(|entry| (entry.id().to_string(), availability(entry.is_active())))
            .collect();
        ScrapeStatus {
            is_running: self.status.is_running(),
            last_run,
            last_update_counts,
            available_scrapers,
            cache: self.cache.info().await,
            refresh_schedule: self.refresh_schedule.clone(),
        }
    }

    async fn load_fresh(&self) -> Arc<CatalogSnapshot> {
        let _running = self.status.begin();
        let request = ScrapeRequest {
            stores: self.default_stores.clone(),
            categories: Vec::new(),
            real_scraping: true,
        };

        let records = match self.orchestrator.run(&request).await {
            Ok(run) => {
                self.status.record(&run.report);
                if run.records.is_empty() {
                    warn!("scrape produced no records; caching fallback catalog");
                    self.fallback_records()
                } else {
                    run.records
                }
            }
            Err(e) => {
                warn!(error = %e, "catalog scrape failed; caching fallback catalog");
                self.fallback_records()
            }
        };

        let snapshot = self.cache.write(records).await;
        info!(
            records = snapshot.records.len(),
            origin = ?snapshot.origin,
            "catalog cache refreshed"
        );
        snapshot
    }

    fn fallback_records(&self) -> Vec<ProductRecord> {
        let registry = self.orchestrator.registry();
        let mut stores: Vec<&str> = self.default_stores.iter().map(String::as_str).collect();
        if stores.is_empty() {
            stores = registry.entries().map(|e| e.id()).take(1).collect();
        }
        stores
            .into_iter()
            .flat_map(|id| {
                let base_url = registry.get(id).map_or("", |e| e.config.base_url.as_str());
                FallbackCatalog.records_for(id, base_url)
            })
            .collect()
    }
}

fn availability(active: bool) -> ScraperAvailability {
    if active {
        ScraperAvailability::Active
    } else {
        ScraperAvailability::Planned
    }
}
