//! Tunable matching rules for heuristic product extraction.
//!
//! Every field has a default tuned for Polish grocery listings, so a store
//! entry in `stores.yaml` only needs to list the fields it overrides:
//!
//! ```yaml
//! extractor:
//!   kind: heuristic
//!   rules:
//!     max_records: 10
//!     category: Nabiał
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRICE_PATTERN: &str = r"(?i)(\d+[,.]\d{2})\s*(zł|PLN)";
pub const DEFAULT_NAME_PATTERN: &str = r#"[A-ZĄĆĘŁŃÓŚŹŻ][a-ząćęłńóśźż\s0-9\-.,'"]{5,50}"#;
pub const DEFAULT_PROMOTION_PATTERN: &str = r"(?i)(promocja|rabat|oferta|-%|taniej)";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-{n}?w=200&h=200&fit=crop";

/// Base added to the candidate index to build the placeholder image id.
pub const PLACEHOLDER_IMAGE_BASE: u64 = 1_500_000_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// First capture group is the amount; `,` or `.` as decimal separator.
    pub price_pattern: String,
    /// Candidate product-name runs searched in the candidate and its ancestors.
    pub name_pattern: String,
    pub promotion_pattern: String,
    /// A name run containing any of these is rejected.
    pub currency_markers: Vec<String>,
    /// Elements whose text is this long or longer are not candidates.
    pub max_text_chars: usize,
    pub max_candidates: usize,
    pub max_records: usize,
    /// Number of elements inspected for a name, starting at the candidate.
    pub ancestor_depth: usize,
    /// Prices above this are implausible for a grocery page.
    pub price_ceiling: Decimal,
    pub min_name_chars: usize,
    pub max_name_chars: usize,
    pub category: String,
    pub promotion_label: String,
    /// Rotating names used when no name run is found near a price.
    pub synthetic_names: Vec<String>,
    /// `{n}` is replaced with `PLACEHOLDER_IMAGE_BASE + index`.
    pub placeholder_image: String,
    /// Discount bounds in whole cents, `[min, max)`.
    pub discount_cents_min: i64,
    pub discount_cents_max: i64,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            price_pattern: DEFAULT_PRICE_PATTERN.to_string(),
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
            promotion_pattern: DEFAULT_PROMOTION_PATTERN.to_string(),
            currency_markers: vec!["zł".to_string(), "PLN".to_string()],
            max_text_chars: 200,
            max_candidates: 20,
            max_records: 15,
            ancestor_depth: 5,
            price_ceiling: Decimal::new(1000, 0),
            min_name_chars: 6,
            max_name_chars: 49,
            category: "Spożywcze".to_string(),
            promotion_label: "Promocja specjalna".to_string(),
            synthetic_names: [
                "Mleko UHT",
                "Chleb Żytni",
                "Masło Extra",
                "Jajka Świeże",
                "Jogurt Naturalny",
                "Ser Gouda",
                "Woda Mineralna",
                "Kurczak",
                "Banany",
                "Pomidory",
                "Kawa Mielona",
                "Herbata",
                "Ryż",
                "Makaron",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            discount_cents_min: 50,
            discount_cents_max: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let rules: ExtractionRules =
            serde_yaml::from_str("max_records: 10\ncategory: Nabiał\n").expect("parse");
        assert_eq!(rules.max_records, 10);
        assert_eq!(rules.category, "Nabiał");
        assert_eq!(rules.max_candidates, 20);
        assert_eq!(rules.price_pattern, DEFAULT_PRICE_PATTERN);
    }

    #[test]
    fn default_synthetic_names_rotate_over_fourteen_entries() {
        assert_eq!(ExtractionRules::default().synthetic_names.len(), 14);
    }
}
