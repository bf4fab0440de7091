use chrono::{DateTime, Utc};
use koszyk_core::ProductRecord;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Result of one real scrape attempt, before fallback substitution.
#[derive(Debug)]
pub enum ScrapeOutcome {
    Success(Vec<ProductRecord>),
    /// The page rendered but no product was recognized.
    Empty,
    Timeout,
    Failure(ScrapeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    /// Records were extracted from the live page.
    Success,
    /// Synthetic counts or fallback data; nothing real was extracted.
    Mock,
    /// The attempt failed or timed out; fallback data was served.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReport {
    pub store: String,
    pub status: StoreStatus,
    pub records_found: u32,
    pub new_count: u32,
    pub updated_count: u32,
    pub duration_seconds: f64,
    pub fallback_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Up to ten extracted records, on real success only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample: Vec<ProductRecord>,
}

/// Aggregate of one orchestrator run, one entry per requested store in
/// request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub timestamp: DateTime<Utc>,
    pub stores: Vec<String>,
    pub categories: Vec<String>,
    pub total_products_scraped: u32,
    pub new_prices: u32,
    pub updated_prices: u32,
    pub results: Vec<StoreReport>,
    pub is_real_scraping: bool,
}

impl ScrapeReport {
    #[must_use]
    pub fn new(
        stores: Vec<String>,
        categories: Vec<String>,
        results: Vec<StoreReport>,
        is_real_scraping: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            stores,
            categories,
            total_products_scraped: results.iter().map(|r| r.records_found).sum(),
            new_prices: results.iter().map(|r| r.new_count).sum(),
            updated_prices: results.iter().map(|r| r.updated_count).sum(),
            results,
            is_real_scraping,
        }
    }

    #[must_use]
    pub fn any_success(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == StoreStatus::Success)
    }
}

/// Report plus the records the run produced (scraped or fallback).
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    pub report: ScrapeReport,
    pub records: Vec<ProductRecord>,
}
