//! Integration tests for `CatalogService`.
//!
//! A counting `PageSource` replaces the browser. TTL tests run on a paused
//! tokio clock so the 30 minute window elapses instantly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use koszyk_catalog::{CatalogOrigin, CatalogService, ProductCache, ScraperAvailability};
use koszyk_core::{RecordSource, StoresFile};
use koszyk_scraper::{
    FallbackCatalog, OrchestratorSettings, PageSnapshot, PageSource, RandomSource, ScrapeError,
    ScrapeOrchestrator, ScrapeRequest, StoreRegistry,
};
use tokio_util::sync::CancellationToken;

const TTL: Duration = Duration::from_secs(1800);

const PRODUCT_PAGE: &str = "<html><body>\
    <p>lorem ipsum dolor sit amet lorem ipsum dolor sit amet lorem ipsum dolor sit amet \
    lorem ipsum dolor sit amet lorem ipsum dolor sit amet lorem ipsum dolor sit amet \
    lorem ipsum dolor sit amet lorem ipsum dolor sit amet</p>\
    <article><h3>Jogurt naturalny 400g</h3><p>Cena: 2,99 zł</p></article>\
    </body></html>";

const EMPTY_PAGE: &str = "<html><body><p>brak ofert</p></body></html>";

struct CountingSource {
    html: &'static str,
    delay: Duration,
    renders: AtomicUsize,
}

impl CountingSource {
    fn new(html: &'static str) -> Arc<Self> {
        Self::slow(html, Duration::ZERO)
    }

    fn slow(html: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            html,
            delay,
            renders: AtomicUsize::new(0),
        })
    }

    fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for CountingSource {
    async fn render(
        &self,
        url: &str,
        _cancel: &CancellationToken,
    ) -> Result<PageSnapshot, ScrapeError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(PageSnapshot::new(url, self.html))
    }
}

fn service_for(source: Arc<CountingSource>, stores: &[&str]) -> CatalogService {
    service_with_cache(source, stores, Arc::new(ProductCache::new(TTL)))
}

fn service_with_cache(
    source: Arc<CountingSource>,
    stores: &[&str],
    cache: Arc<ProductCache>,
) -> CatalogService {
    let registry = StoreRegistry::from_stores(&StoresFile::builtin()).expect("builtin registry");
    let orchestrator = ScrapeOrchestrator::new(
        source,
        registry,
        OrchestratorSettings::default(),
        RandomSource::seeded(7),
    );
    CatalogService::new(
        orchestrator,
        cache,
        stores.iter().map(|s| (*s).to_string()).collect(),
    )
}

fn service(source: Arc<CountingSource>) -> CatalogService {
    service_for(source, &["LIDL"])
}

// ---------------------------------------------------------------------------
// Cache behaviour
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cached_catalog_is_served_until_ttl_expires() {
    let source = CountingSource::new(PRODUCT_PAGE);
    let catalog = service(Arc::clone(&source));

    let first = catalog.get_products().await;
    assert!(!first.cached);
    assert_eq!(source.renders(), 1);
    assert_eq!(first.snapshot.origin, CatalogOrigin::Scraped);

    tokio::time::advance(Duration::from_secs(1799)).await;
    let second = catalog.get_products().await;
    assert!(second.cached);
    assert_eq!(source.renders(), 1);
    assert_eq!(second.snapshot.records, first.snapshot.records);

    tokio::time::advance(Duration::from_secs(1)).await;
    let third = catalog.get_products().await;
    assert!(!third.cached);
    assert_eq!(source.renders(), 2);
}

#[tokio::test]
async fn refresh_always_scrapes_and_refills_the_cache() {
    let source = CountingSource::new(PRODUCT_PAGE);
    let catalog = service(Arc::clone(&source));

    catalog.refresh().await;
    catalog.refresh().await;
    assert_eq!(source.renders(), 2);

    let view = catalog.get_products().await;
    assert!(view.cached);
    assert_eq!(source.renders(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_share_one_scrape() {
    let source = CountingSource::slow(PRODUCT_PAGE, Duration::from_millis(500));
    let catalog = Arc::new(service(Arc::clone(&source)));

    let (a, b, c) = tokio::join!(
        catalog.get_products(),
        catalog.get_products(),
        catalog.get_products()
    );

    assert_eq!(source.renders(), 1);
    assert_eq!(a.snapshot.records, b.snapshot.records);
    assert_eq!(b.snapshot.records, c.snapshot.records);
    assert_eq!([a.cached, b.cached, c.cached].iter().filter(|c| !**c).count(), 1);
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_scrape_caches_exactly_the_fallback_catalog() {
    let catalog = service(CountingSource::new(EMPTY_PAGE));

    let view = catalog.get_products().await;
    assert_eq!(
        view.snapshot.records,
        FallbackCatalog.records_for("LIDL", "https://www.lidl.pl")
    );
    assert_eq!(view.snapshot.origin, CatalogOrigin::Fallback);
    assert!(view.snapshot.records.iter().all(|r| r.store == "LIDL"));
}

#[tokio::test]
async fn unknown_default_store_still_yields_fallback_records() {
    let catalog = service_for(CountingSource::new(PRODUCT_PAGE), &["Kaufland"]);

    let view = catalog.get_products().await;
    assert_eq!(view.snapshot.records.len(), FallbackCatalog.len());
    assert!(view
        .snapshot
        .records
        .iter()
        .all(|r| r.store == "Kaufland" && r.source == RecordSource::Fallback));
}

// ---------------------------------------------------------------------------
// Search and listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_matches_case_insensitively_over_cached_records() {
    let catalog = service(CountingSource::new(EMPTY_PAGE));
    catalog.get_products().await;

    let hits = catalog.search("mleko").await;
    assert!(hits.iter().any(|r| r.name == "Mleko UHT 3.2% 1L"));
    assert!(catalog.search("MLEKO").await.len() == hits.len());
    assert!(catalog.search("nonexistent-term").await.is_empty());
}

#[tokio::test]
async fn search_before_any_load_never_scrapes() {
    let source = CountingSource::new(EMPTY_PAGE);
    let catalog = service(Arc::clone(&source));

    assert!(catalog.search("mleko").await.is_empty());
    assert_eq!(source.renders(), 0);
}

#[tokio::test]
async fn categories_are_sorted_and_distinct() {
    let catalog = service(CountingSource::new(EMPTY_PAGE));
    let categories = catalog.categories().await;

    let mut expected = categories.clone();
    expected.sort();
    expected.dedup();
    assert_eq!(categories, expected);
    assert!(categories.iter().any(|c| c == "Nabiał"));
}

#[tokio::test]
async fn stores_report_availability_and_counts() {
    let catalog = service(CountingSource::new(EMPTY_PAGE));
    let stores = catalog.stores().await;

    let lidl = stores.iter().find(|s| s.id == "LIDL").expect("LIDL listed");
    assert_eq!(lidl.availability, ScraperAvailability::Active);
    assert_eq!(lidl.records, FallbackCatalog.len());

    let biedronka = stores.iter().find(|s| s.id == "Biedronka").expect("Biedronka listed");
    assert_eq!(biedronka.availability, ScraperAvailability::Planned);
    assert_eq!(biedronka.records, 0);
}

// ---------------------------------------------------------------------------
// Ad-hoc runs and status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn synthetic_run_leaves_cache_and_last_run_untouched() {
    let source = CountingSource::new(PRODUCT_PAGE);
    let catalog = service(Arc::clone(&source));

    let run = catalog
        .run_scrape(&ScrapeRequest {
            stores: vec!["LIDL".to_string(), "Auchan".to_string()],
            categories: vec!["all".to_string()],
            real_scraping: false,
        })
        .await
        .expect("run");
    assert_eq!(run.report.results.len(), 2);
    assert_eq!(source.renders(), 0);

    let status = catalog.status().await;
    assert!(status.last_run.is_none());
    assert!(!status.cache.fresh);
    assert!(!status.is_running);
}

#[tokio::test]
async fn status_reflects_catalog_load() {
    let catalog = service(CountingSource::new(PRODUCT_PAGE));
    catalog.get_products().await;

    let status = catalog.status().await;
    assert!(status.last_run.is_some());
    assert_eq!(status.last_update_counts.get("LIDL"), Some(&2));
    assert_eq!(
        status.available_scrapers.get("LIDL"),
        Some(&ScraperAvailability::Active)
    );
    assert_eq!(
        status.available_scrapers.get("Auchan"),
        Some(&ScraperAvailability::Planned)
    );
    assert!(status.cache.fresh);
    assert_eq!(status.cache.ttl_secs, 1800);
}

#[tokio::test]
async fn empty_store_list_in_run_is_an_error() {
    let catalog = service(CountingSource::new(PRODUCT_PAGE));
    let err = catalog
        .run_scrape(&ScrapeRequest {
            stores: Vec::new(),
            categories: Vec::new(),
            real_scraping: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::NoStores), "got: {err:?}");
}

#[tokio::test]
async fn injected_cache_is_shared_with_the_caller() {
    let cache = Arc::new(ProductCache::new(TTL));
    cache
        .write(FallbackCatalog.records_for("LIDL", "https://www.lidl.pl"))
        .await;
    let source = CountingSource::new(PRODUCT_PAGE);
    let catalog = service_with_cache(Arc::clone(&source), &["LIDL"], Arc::clone(&cache));

    let view = catalog.get_products().await;
    assert!(view.cached);
    assert_eq!(view.snapshot.records.len(), 8);
    assert_eq!(source.renders(), 0);

    catalog.refresh().await;
    assert_eq!(source.renders(), 1);
    let shared = cache.read().await.expect("refreshed snapshot");
    assert_eq!(shared.origin, CatalogOrigin::Scraped);
}
