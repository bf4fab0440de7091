//! Process-wide cache of the latest catalog snapshot.
//!
//! The snapshot is replaced wholesale on every write and never mutated in
//! place, so readers always see a complete set. Freshness is measured on
//! tokio's clock, which lets tests drive the TTL with a paused runtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use koszyk_core::{ProductRecord, RecordSource};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Where the records of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrigin {
    Scraped,
    Fallback,
    Mixed,
}

impl CatalogOrigin {
    #[must_use]
    pub fn of(records: &[ProductRecord]) -> Self {
        let scraped = records.iter().filter(|r| r.source == RecordSource::Scraped).count();
        match scraped {
            0 => CatalogOrigin::Fallback,
            n if n == records.len() => CatalogOrigin::Scraped,
            _ => CatalogOrigin::Mixed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub records: Vec<ProductRecord>,
    pub captured_at: DateTime<Utc>,
    pub origin: CatalogOrigin,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub fresh: bool,
    pub ttl_secs: u64,
    pub age_secs: Option<u64>,
    pub records: usize,
    pub captured_at: Option<DateTime<Utc>>,
}

struct CacheEntry {
    snapshot: Arc<CatalogSnapshot>,
    stored_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.invalidated && self.stored_at.elapsed() < ttl
    }
}

pub struct ProductCache {
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
}

impl ProductCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached snapshot if it is younger than the TTL and has not been
    /// invalidated; `None` is a miss.
    pub async fn read(&self) -> Option<Arc<CatalogSnapshot>> {
        let guard = self.entry.read().await;
        guard
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Replace the whole snapshot and restart its TTL.
    pub async fn write(&self, records: Vec<ProductRecord>) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(CatalogSnapshot {
            origin: CatalogOrigin::of(&records),
            records,
            captured_at: Utc::now(),
        });
        *self.entry.write().await = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            stored_at: Instant::now(),
            invalidated: false,
        });
        snapshot
    }

    /// Force the next [`read`](Self::read) to miss. The stale snapshot stays
    /// visible through [`latest`](Self::latest).
    pub async fn invalidate(&self) {
        if let Some(entry) = self.entry.write().await.as_mut() {
            entry.invalidated = true;
        }
    }

    /// Last written snapshot regardless of age.
    pub async fn latest(&self) -> Option<Arc<CatalogSnapshot>> {
        self.entry
            .read()
            .await
            .as_ref()
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    pub async fn info(&self) -> CacheInfo {
        let guard = self.entry.read().await;
        match guard.as_ref() {
            Some(entry) => CacheInfo {
                fresh: entry.is_fresh(self.ttl),
                ttl_secs: self.ttl.as_secs(),
                age_secs: Some(entry.stored_at.elapsed().as_secs()),
                records: entry.snapshot.records.len(),
                captured_at: Some(entry.snapshot.captured_at),
            },
            None => CacheInfo {
                fresh: false,
                ttl_secs: self.ttl.as_secs(),
                age_secs: None,
                records: 0,
                captured_at: None,
            },
        }
    }
}
