//! Cached product catalog over the scrape pipeline.

pub mod cache;
pub mod service;
pub mod status;

pub use cache::{CacheInfo, CatalogOrigin, CatalogSnapshot, ProductCache};
pub use service::{CatalogService, CatalogView, StoreSummary};
pub use status::{ScrapeStatus, ScraperAvailability};
