//! Shared fixtures for handler and scheduler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use koszyk_catalog::{CatalogService, ProductCache};
use koszyk_core::StoresFile;
use koszyk_scraper::{
    OrchestratorSettings, PageSnapshot, PageSource, RandomSource, ScrapeError, ScrapeOrchestrator,
    StoreRegistry,
};
use tokio_util::sync::CancellationToken;

/// A page with no price text, so every real scrape falls back.
pub const EMPTY_PAGE: &str = "<html><body><p>brak ofert</p></body></html>";

pub struct FakeSource {
    renders: AtomicUsize,
}

impl FakeSource {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn render(
        &self,
        url: &str,
        _cancel: &CancellationToken,
    ) -> Result<PageSnapshot, ScrapeError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(PageSnapshot::new(url, EMPTY_PAGE))
    }
}

/// A catalog over the built-in registry, defaulting to LIDL, backed by a
/// browserless source.
pub fn catalog() -> (Arc<CatalogService>, Arc<FakeSource>) {
    let source = Arc::new(FakeSource {
        renders: AtomicUsize::new(0),
    });
    let registry = StoreRegistry::from_stores(&StoresFile::builtin()).expect("builtin registry");
    let orchestrator = ScrapeOrchestrator::new(
        Arc::clone(&source) as Arc<dyn PageSource>,
        registry,
        OrchestratorSettings::default(),
        RandomSource::seeded(3),
    );
    let catalog = CatalogService::new(
        orchestrator,
        Arc::new(ProductCache::new(Duration::from_secs(1800))),
        vec!["LIDL".to_string()],
    );
    (Arc::new(catalog), source)
}
