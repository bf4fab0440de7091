//! Product extraction from rendered pages.

mod heuristic;
pub mod price;

use std::sync::Arc;

use koszyk_core::{ExtractorConfig, ExtractorKind, ProductRecord};

use crate::error::ScrapeError;
use crate::random::RandomSource;
use crate::source::PageSnapshot;

pub use heuristic::HeuristicExtractor;

/// Turns one rendered page into product records.
///
/// Output is best-effort and in document order. An empty result is a
/// valid outcome, not an error.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, page: &PageSnapshot, store: &str, rng: &RandomSource)
        -> Vec<ProductRecord>;
}

/// Build the extractor configured for `store`.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidPattern`] if a configured pattern does not compile.
pub fn build_extractor(
    store: &str,
    config: &ExtractorConfig,
) -> Result<Arc<dyn Extractor>, ScrapeError> {
    match config.kind {
        ExtractorKind::Heuristic => HeuristicExtractor::new(config.rules.clone())
            .map(|e| Arc::new(e) as Arc<dyn Extractor>)
            .map_err(|source| ScrapeError::InvalidPattern {
                store: store.to_string(),
                source,
            }),
    }
}
