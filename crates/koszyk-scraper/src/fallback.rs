//! Hand-authored demo records served when live extraction fails or is empty.

use koszyk_core::{ProductRecord, RecordSource};
use rust_decimal::Decimal;

const FALLBACK_IMAGE: &str = "https://via.placeholder.com/200x150";

struct FallbackEntry {
    name: &'static str,
    /// Price in grosze.
    price: i64,
    original_price: Option<i64>,
    discount: Option<i64>,
    promotion: Option<&'static str>,
    category: &'static str,
    description: &'static str,
}

const ENTRIES: &[FallbackEntry] = &[
    FallbackEntry {
        name: "Mleko UHT 3.2% 1L",
        price: 349,
        original_price: None,
        discount: None,
        promotion: Some("Oferta tygodnia"),
        category: "Nabiał",
        description: "Mleko UHT o zawartości tłuszczu 3,2%, karton 1 l",
    },
    FallbackEntry {
        name: "Chleb Żytni Kaszubski 500g",
        price: 289,
        original_price: None,
        discount: None,
        promotion: None,
        category: "Pieczywo",
        description: "Chleb żytni na zakwasie, krojony",
    },
    FallbackEntry {
        name: "Masło Extra 200g",
        price: 549,
        original_price: None,
        discount: None,
        promotion: None,
        category: "Nabiał",
        description: "Masło ekstra 82% tłuszczu",
    },
    FallbackEntry {
        name: "Jajka L 10szt",
        price: 899,
        original_price: Some(1199),
        discount: Some(300),
        promotion: Some("Promocja -25%"),
        category: "Nabiał",
        description: "Jaja kurze z chowu ściółkowego, rozmiar L",
    },
    FallbackEntry {
        name: "Jogurt Naturalny 400g",
        price: 299,
        original_price: None,
        discount: None,
        promotion: Some("Nowa cena"),
        category: "Nabiał",
        description: "Jogurt naturalny gęsty",
    },
    FallbackEntry {
        name: "Filet z kurczaka 1kg",
        price: 1299,
        original_price: None,
        discount: None,
        promotion: None,
        category: "Mięso",
        description: "Świeży filet z piersi kurczaka",
    },
    FallbackEntry {
        name: "Banany 1kg",
        price: 499,
        original_price: None,
        discount: None,
        promotion: None,
        category: "Owoce",
        description: "Banany z importu, luz",
    },
    FallbackEntry {
        name: "Ryż długoziarnisty 1kg",
        price: 399,
        original_price: None,
        discount: None,
        promotion: None,
        category: "Podstawowe",
        description: "Ryż biały długoziarnisty",
    },
];

/// Fixed set of plausible grocery items.
///
/// Every record is tagged [`RecordSource::Fallback`] so consumers can tell
/// it apart from scraped data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackCatalog;

impl FallbackCatalog {
    #[must_use]
    pub fn len(self) -> usize {
        ENTRIES.len()
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        ENTRIES.is_empty()
    }

    /// All entries attributed to `store`, linking to `base_url`.
    #[must_use]
    pub fn records_for(self, store: &str, base_url: &str) -> Vec<ProductRecord> {
        ENTRIES
            .iter()
            .map(|entry| ProductRecord {
                name: entry.name.to_string(),
                price: Decimal::new(entry.price, 2),
                original_price: entry.original_price.map(|c| Decimal::new(c, 2)),
                discount: entry.discount.map(|c| Decimal::new(c, 2)),
                promotion: entry.promotion.map(str::to_string),
                availability: true,
                category: entry.category.to_string(),
                url: base_url.to_string(),
                image: Some(FALLBACK_IMAGE.to_string()),
                store: store.to_string(),
                description: Some(entry.description.to_string()),
                source: RecordSource::Fallback,
            })
            .collect()
    }
}
