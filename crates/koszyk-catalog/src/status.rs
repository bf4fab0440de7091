//! Informational scrape status derived from recent runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use koszyk_scraper::ScrapeReport;
use serde::Serialize;

use crate::cache::CacheInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperAvailability {
    Active,
    Planned,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStatus {
    pub is_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub last_update_counts: BTreeMap<String, u32>,
    pub available_scrapers: BTreeMap<String, ScraperAvailability>,
    pub cache: CacheInfo,
    pub refresh_schedule: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct LastRun {
    at: Option<DateTime<Utc>>,
    counts: BTreeMap<String, u32>,
}

#[derive(Debug, Default)]
pub(crate) struct StatusTracker {
    in_flight: AtomicUsize,
    last: Mutex<LastRun>,
}

impl StatusTracker {
    /// Marks a run as in flight until the returned guard drops.
    pub(crate) fn begin(&self) -> RunGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RunGuard { tracker: self }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn record(&self, report: &ScrapeReport) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        last.at = Some(report.timestamp);
        for result in &report.results {
            last.counts.insert(result.store.clone(), result.records_found);
        }
    }

    pub(crate) fn last_run(&self) -> (Option<DateTime<Utc>>, BTreeMap<String, u32>) {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        (last.at, last.counts.clone())
    }
}

pub(crate) struct RunGuard<'a> {
    tracker: &'a StatusTracker,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
