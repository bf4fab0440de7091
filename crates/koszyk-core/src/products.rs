use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a [`ProductRecord`] came from.
///
/// Scraped records are heuristic and approximate; fallback records are
/// hand-authored demo data. Consumers must be able to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Scraped,
    Fallback,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::Scraped => write!(f, "scraped"),
            RecordSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// One product offer, either extracted from a rendered retail page or taken
/// from the fallback catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Free-text name. For scraped records this is heuristically derived and
    /// may be synthesized (e.g. `"Mleko UHT 1"`) when no name was found.
    pub name: String,
    /// Current price with two decimal places, e.g. `"3,49 zł"` → `3.49`.
    pub price: Decimal,
    /// Pre-promotion price; only set when a promotion was detected.
    pub original_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    /// Free-text promotion marker, e.g. `"Promocja specjalna"`.
    pub promotion: Option<String>,
    /// Always `true`: no page exposes a usable out-of-stock signal, so
    /// availability is unknown and reported optimistically.
    pub availability: bool,
    pub category: String,
    /// Page the record was read from (or the store's base URL for fallback data).
    pub url: String,
    pub image: Option<String>,
    /// Store identifier the record is attributed to, e.g. `"LIDL"`.
    pub store: String,
    pub description: Option<String>,
    pub source: RecordSource,
}

impl ProductRecord {
    /// Case-insensitive substring match over name, category, store and
    /// description. `lower_term` must already be lowercased.
    #[must_use]
    pub fn matches_term(&self, lower_term: &str) -> bool {
        self.name.to_lowercase().contains(lower_term)
            || self.category.to_lowercase().contains(lower_term)
            || self.store.to_lowercase().contains(lower_term)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(lower_term))
    }

    /// Returns `true` when the category contains any of `filters`
    /// (case-insensitive). An empty filter list or the literal `all` keeps
    /// every record.
    #[must_use]
    pub fn in_categories(&self, filters: &[String]) -> bool {
        if filters.is_empty() || filters.iter().any(|f| f.eq_ignore_ascii_case("all")) {
            return true;
        }
        let category = self.category.to_lowercase();
        filters
            .iter()
            .any(|f| category.contains(&f.trim().to_lowercase()))
    }

    #[must_use]
    pub fn is_scraped(&self) -> bool {
        self.source == RecordSource::Scraped
    }
}
