//! Per-store scrape coordination under a hard deadline.
//!
//! Every requested store ends up with a report entry and, for known
//! stores, a non-empty record set: scraped records on success, the
//! fallback catalog on any failure, timeout or empty extraction.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use koszyk_core::{AppConfig, ProductRecord};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::fallback::FallbackCatalog;
use crate::random::RandomSource;
use crate::registry::{StoreEntry, StoreRegistry};
use crate::report::{ScrapeOutcome, ScrapeReport, ScrapeRun, StoreReport, StoreStatus};
use crate::session::elapsed_ms;
use crate::source::PageSource;

const SAMPLE_SIZE: usize = 10;

/// Store ids in first-seen order with case-insensitive repeats removed.
fn dedupe_store_ids(stores: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    stores
        .iter()
        .filter(|id| seen.insert(id.to_lowercase()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Hard deadline for render plus extraction of one store.
    pub scrape_timeout: Duration,
    /// Time a cancelled attempt gets to close its browser before it is aborted.
    pub teardown_grace: Duration,
    pub max_concurrent: usize,
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            scrape_timeout: Duration::from_secs(config.scrape_timeout_secs),
            teardown_grace: Duration::from_secs(config.teardown_grace_secs),
            max_concurrent: config.max_concurrent_stores.max(1),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            scrape_timeout: Duration::from_secs(15),
            teardown_grace: Duration::from_secs(5),
            max_concurrent: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub stores: Vec<String>,
    /// Category filter; empty or `all` keeps everything.
    pub categories: Vec<String>,
    /// `false` produces a fully synthetic report without touching a browser.
    pub real_scraping: bool,
}

pub struct ScrapeOrchestrator {
    source: Arc<dyn PageSource>,
    registry: StoreRegistry,
    settings: OrchestratorSettings,
    rng: RandomSource,
}

impl ScrapeOrchestrator {
    #[must_use]
    pub fn new(
        source: Arc<dyn PageSource>,
        registry: StoreRegistry,
        settings: OrchestratorSettings,
        rng: RandomSource,
    ) -> Self {
        Self {
            source,
            registry,
            settings,
            rng,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// Run every requested store and aggregate the outcomes.
    ///
    /// Per-store failures never fail the run; they are substituted with
    /// fallback data and reported as `error`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::NoStores`] if `request.stores` is empty.
    pub async fn run(&self, request: &ScrapeRequest) -> Result<ScrapeRun, ScrapeError> {
        if request.stores.is_empty() {
            return Err(ScrapeError::NoStores);
        }

        let stores = dedupe_store_ids(&request.stores);
        let per_store: Vec<(StoreReport, Vec<ProductRecord>)> = stream::iter(stores.clone())
            .map(|store| async move { self.run_store(&store, request).await })
            .buffered(self.settings.max_concurrent.max(1))
            .collect()
            .await;

        let mut results = Vec::with_capacity(per_store.len());
        let mut records = Vec::new();
        for (report, store_records) in per_store {
            results.push(report);
            records.extend(store_records);
        }

        let report = ScrapeReport::new(
            stores,
            request.categories.clone(),
            results,
            request.real_scraping,
        );
        info!(
            stores = report.results.len(),
            total = report.total_products_scraped,
            records = records.len(),
            real = request.real_scraping,
            "scrape run finished"
        );
        Ok(ScrapeRun { report, records })
    }

    async fn run_store(
        &self,
        store_id: &str,
        request: &ScrapeRequest,
    ) -> (StoreReport, Vec<ProductRecord>) {
        let entry = self.registry.get(store_id);

        let Some(entry) = entry else {
            warn!(store = %store_id, "unknown store; reporting synthetic counts only");
            return (
                self.synthetic_report(store_id, "unknown store; synthetic counts only", false),
                Vec::new(),
            );
        };

        if !request.real_scraping {
            let records = self.fallback_for(entry, &request.categories);
            return (
                self.synthetic_report(entry.id(), "synthetic run; no browser activity", true),
                records,
            );
        }

        if !entry.is_active() {
            let records = self.fallback_for(entry, &request.categories);
            return (
                self.synthetic_report(
                    entry.id(),
                    "real scraper not implemented yet; synthetic counts and fallback data",
                    true,
                ),
                records,
            );
        }

        let started = tokio::time::Instant::now();
        let outcome = self.attempt(entry).await;
        let duration_seconds = round_secs(started.elapsed());
        let elapsed = elapsed_ms(started);

        match outcome {
            ScrapeOutcome::Success(scraped) => {
                let found = count(scraped.len());
                info!(store = %entry.id(), count = found, elapsed_ms = elapsed, "store scraped");
                let kept: Vec<ProductRecord> = scraped
                    .into_iter()
                    .filter(|r| r.in_categories(&request.categories))
                    .collect();
                let report = StoreReport {
                    store: entry.id().to_string(),
                    status: StoreStatus::Success,
                    records_found: found,
                    new_count: found,
                    updated_count: 0,
                    duration_seconds,
                    fallback_used: false,
                    note: None,
                    error: None,
                    sample: kept.iter().take(SAMPLE_SIZE).cloned().collect(),
                };
                (report, kept)
            }
            ScrapeOutcome::Empty => {
                warn!(store = %entry.id(), elapsed_ms = elapsed, "no products extracted; serving fallback");
                let report = StoreReport {
                    note: Some("no products recognized on the page; fallback data served".to_string()),
                    ..fallback_report(entry.id(), StoreStatus::Mock, duration_seconds)
                };
                (report, self.fallback_for(entry, &request.categories))
            }
            ScrapeOutcome::Timeout => {
                warn!(
                    store = %entry.id(),
                    timeout_secs = self.settings.scrape_timeout.as_secs(),
                    "scrape timed out; serving fallback"
                );
                let report = StoreReport {
                    error: Some(format!(
                        "timed out after {}s",
                        self.settings.scrape_timeout.as_secs()
                    )),
                    ..fallback_report(entry.id(), StoreStatus::Error, duration_seconds)
                };
                (report, self.fallback_for(entry, &request.categories))
            }
            ScrapeOutcome::Failure(e) => {
                warn!(store = %entry.id(), error = %e, kind = e.kind(), "scrape failed; serving fallback");
                let report = StoreReport {
                    error: Some(e.to_string()),
                    ..fallback_report(entry.id(), StoreStatus::Error, duration_seconds)
                };
                (report, self.fallback_for(entry, &request.categories))
            }
        }
    }

    /// One render-and-extract attempt for `entry`, raced against the scrape
    /// timeout. On timeout the attempt is cancelled, given the teardown
    /// grace period to release its browser, then aborted.
    pub async fn attempt(&self, entry: &StoreEntry) -> ScrapeOutcome {
        let (Some(extractor), Some(url)) = (entry.extractor.clone(), entry.config.scrape_url.clone())
        else {
            return ScrapeOutcome::Failure(ScrapeError::Task(format!(
                "store {} has no extractor",
                entry.id()
            )));
        };

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let source = Arc::clone(&self.source);
        let rng = self.rng.clone();
        let store = entry.id().to_string();

        let mut handle = tokio::spawn(async move {
            let snapshot = source.render(&url, &task_cancel).await?;
            Ok::<_, ScrapeError>(extractor.extract(&snapshot, &store, &rng))
        });

        match tokio::time::timeout(self.settings.scrape_timeout, &mut handle).await {
            Ok(Ok(Ok(records))) if records.is_empty() => ScrapeOutcome::Empty,
            Ok(Ok(Ok(records))) => ScrapeOutcome::Success(records),
            Ok(Ok(Err(e))) => ScrapeOutcome::Failure(e),
            Ok(Err(join_err)) => ScrapeOutcome::Failure(ScrapeError::Task(join_err.to_string())),
            Err(_) => {
                cancel.cancel();
                if tokio::time::timeout(self.settings.teardown_grace, &mut handle)
                    .await
                    .is_err()
                {
                    warn!(store = %entry.id(), "scrape task ignored cancellation; aborting");
                    handle.abort();
                }
                ScrapeOutcome::Timeout
            }
        }
    }

    fn fallback_for(&self, entry: &StoreEntry, categories: &[String]) -> Vec<ProductRecord> {
        FallbackCatalog
            .records_for(entry.id(), &entry.config.base_url)
            .into_iter()
            .filter(|r| r.in_categories(categories))
            .collect()
    }

    /// Plausible randomized counts, labelled `mock`.
    fn synthetic_report(&self, store: &str, note: &str, fallback_used: bool) -> StoreReport {
        let total: u32 = self.rng.sample(300..=499);
        let duration: u32 = self.rng.sample(30..=59);
        StoreReport {
            store: store.to_string(),
            status: StoreStatus::Mock,
            records_found: total,
            new_count: total * 7 / 10,
            updated_count: total * 3 / 10,
            duration_seconds: f64::from(duration),
            fallback_used,
            note: Some(note.to_string()),
            error: None,
            sample: Vec::new(),
        }
    }
}

fn fallback_report(store: &str, status: StoreStatus, duration_seconds: f64) -> StoreReport {
    StoreReport {
        store: store.to_string(),
        status,
        records_found: 0,
        new_count: 0,
        updated_count: 0,
        duration_seconds,
        fallback_used: true,
        note: None,
        error: None,
        sample: Vec::new(),
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn round_secs(d: Duration) -> f64 {
    (d.as_secs_f64() * 100.0).round() / 100.0
}
