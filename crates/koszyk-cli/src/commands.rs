//! Command handlers for the CLI.
//!
//! Handlers print to stdout; logs go to stderr so output can be piped.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use koszyk_catalog::CatalogService;
use koszyk_core::{
    AppConfig, ExtractorConfig, ExtractorKind, ExtractionRules, ProductRecord, StoresFile,
};
use koszyk_scraper::{
    build_extractor, BrowserSettings, ChromiumPageSource, FallbackCatalog, PageSnapshot,
    PageSource, RandomSource, ScrapeReport, ScrapeRequest, StoreRegistry,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build a scrape request, defaulting stores to the configured catalog set.
pub(crate) fn scrape_request(
    default_stores: &[String],
    stores: Vec<String>,
    categories: Vec<String>,
    synthetic: bool,
) -> ScrapeRequest {
    ScrapeRequest {
        stores: if stores.is_empty() {
            default_stores.to_vec()
        } else {
            stores
        },
        categories: if categories.is_empty() {
            vec!["all".to_string()]
        } else {
            categories
        },
        real_scraping: !synthetic,
    }
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    stores: &StoresFile,
    request: &ScrapeRequest,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = CatalogService::from_config(config, stores)?;
    let run = catalog.run_scrape(request).await?;
    if json {
        print_json(&run.report)?;
    } else {
        for line in summary_lines(&run.report) {
            println!("{line}");
        }
    }
    Ok(())
}

/// One line per store, then a totals line.
pub(crate) fn summary_lines(report: &ScrapeReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|r| {
            let mut line = format!(
                "{:<12} {:<8} found={:<4} new={:<4} updated={:<4} {:.1}s",
                r.store,
                format!("{:?}", r.status).to_lowercase(),
                r.records_found,
                r.new_count,
                r.updated_count,
                r.duration_seconds,
            );
            if r.fallback_used {
                line.push_str(" [fallback]");
            }
            if let Some(error) = &r.error {
                line = format!("{line} error: {error}");
            }
            line
        })
        .collect();
    lines.push(format!(
        "total={} new={} updated={} real={}",
        report.total_products_scraped,
        report.new_prices,
        report.updated_prices,
        report.is_real_scraping
    ));
    lines
}

/// Run `store`'s extractor over saved HTML. Planned stores use the default
/// heuristic rules.
pub(crate) fn extract_records(
    stores: &StoresFile,
    store: &str,
    url: Option<&str>,
    html: &str,
    seed: Option<u64>,
) -> anyhow::Result<Vec<ProductRecord>> {
    let registry = StoreRegistry::from_stores(stores)?;
    let entry = registry
        .get(store)
        .ok_or_else(|| anyhow::anyhow!("store '{store}' is not in the registry"))?;

    let extractor = match &entry.extractor {
        Some(extractor) => Arc::clone(extractor),
        None => build_extractor(
            entry.id(),
            &ExtractorConfig {
                kind: ExtractorKind::Heuristic,
                rules: ExtractionRules::default(),
            },
        )?,
    };

    let page_url = url
        .map(str::to_string)
        .or_else(|| entry.config.scrape_url.clone())
        .unwrap_or_else(|| entry.config.base_url.clone());
    let snapshot = PageSnapshot::new(page_url, html);
    let rng = RandomSource::from_seed(seed);
    let records = extractor.extract(&snapshot, entry.id(), &rng);
    tracing::info!(
        store = %entry.id(),
        count = records.len(),
        extractor = extractor.name(),
        "extracted"
    );
    Ok(records)
}

pub(crate) async fn dump_page(
    config: &AppConfig,
    stores: &StoresFile,
    store: &str,
    url: Option<&str>,
    out: &Path,
) -> anyhow::Result<()> {
    let target = match url {
        Some(url) => url.to_string(),
        None => {
            let entry = stores
                .find(store)
                .ok_or_else(|| anyhow::anyhow!("store '{store}' is not in the registry"))?;
            entry
                .scrape_url
                .clone()
                .unwrap_or_else(|| entry.base_url.clone())
        }
    };

    let source = ChromiumPageSource::new(BrowserSettings::from_app_config(config));
    let cancel = CancellationToken::new();
    // Launch, navigation, consent and settle each have their own bound.
    let deadline = Duration::from_secs(
        config.navigation_timeout_secs * 2
            + config.consent_timeout_secs
            + config.teardown_grace_secs,
    ) + Duration::from_millis(config.settle_delay_ms + config.consent_settle_ms);

    let snapshot = match tokio::time::timeout(deadline, source.render(&target, &cancel)).await {
        Ok(rendered) => rendered?,
        Err(_) => anyhow::bail!(
            "rendering {target} did not finish within {}s",
            deadline.as_secs()
        ),
    };

    std::fs::write(out, &snapshot.html)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", out.display()))?;
    println!(
        "saved {} bytes from {} to {}",
        snapshot.html.len(),
        snapshot.url,
        out.display()
    );
    Ok(())
}

pub(crate) async fn show_catalog(
    config: &AppConfig,
    stores: &StoresFile,
    refresh: bool,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let catalog = CatalogService::from_config(config, stores)?;
    let view = if refresh {
        catalog.refresh().await
    } else {
        catalog.get_products().await
    };
    tracing::info!(
        records = view.snapshot.records.len(),
        origin = ?view.snapshot.origin,
        "catalog loaded"
    );

    match search {
        Some(term) => print_json(&catalog.search(term).await),
        None => print_json(&view.snapshot.records),
    }
}

/// Fallback entries tagged for `store`, linked to its base URL when known.
pub(crate) fn fallback_records(stores: &StoresFile, store: &str) -> Vec<ProductRecord> {
    let base_url = stores.find(store).map_or("", |s| s.base_url.as_str());
    FallbackCatalog.records_for(store, base_url)
}
