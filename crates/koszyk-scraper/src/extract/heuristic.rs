//! Price-pattern extraction for listing pages with no stable markup.
//!
//! Every element whose text is short and contains a price is a candidate.
//! The product name is the first capitalized run found in the candidate or
//! one of its ancestors. When none is found a name is synthesized from a
//! rotating list, so scraped names are approximate by nature.
//!
//! Promotion discounts are sampled, not read from the page. Scraped
//! `original_price` and `discount` values are therefore non-authoritative.

use koszyk_core::{ExtractionRules, ProductRecord, RecordSource};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use super::price::{is_plausible, parse_amount};
use super::Extractor;
use crate::random::RandomSource;
use crate::source::PageSnapshot;

#[derive(Debug)]
pub struct HeuristicExtractor {
    rules: ExtractionRules,
    price_re: Regex,
    name_re: Regex,
    promo_re: Regex,
}

impl HeuristicExtractor {
    /// Compile the patterns in `rules`.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new(rules: ExtractionRules) -> Result<Self, regex::Error> {
        Ok(Self {
            price_re: Regex::new(&rules.price_pattern)?,
            name_re: Regex::new(&rules.name_pattern)?,
            promo_re: Regex::new(&rules.promotion_pattern)?,
            rules,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Element text, or `None` once it reaches `max_text_chars`.
    fn bounded_text(&self, element: ElementRef<'_>) -> Option<String> {
        let mut text = String::new();
        let mut chars = 0;
        for chunk in element.text() {
            chars += chunk.chars().count();
            if chars >= self.rules.max_text_chars {
                return None;
            }
            text.push_str(chunk);
        }
        Some(text)
    }

    fn find_name(&self, text: &str) -> Option<String> {
        self.name_re
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|run| {
                let len = run.chars().count();
                len >= self.rules.min_name_chars
                    && len <= self.rules.max_name_chars
                    && !self
                        .rules
                        .currency_markers
                        .iter()
                        .any(|marker| run.contains(marker.as_str()))
            })
            .map(|run| run.trim().to_string())
    }

    fn synthetic_name(&self, index: usize) -> String {
        let names = &self.rules.synthetic_names;
        let base = names
            .get(index % names.len().max(1))
            .map_or("Produkt", String::as_str);
        format!("{base} {}", index + 1)
    }

    fn placeholder_image(&self, index: usize) -> String {
        let n = koszyk_core::rules::PLACEHOLDER_IMAGE_BASE + index as u64;
        self.rules.placeholder_image.replace("{n}", &n.to_string())
    }

    fn discount_cents(&self, rng: &RandomSource) -> i64 {
        let (min, max) = (self.rules.discount_cents_min, self.rules.discount_cents_max);
        if min < max {
            rng.sample(min..max)
        } else {
            min
        }
    }

    fn first_image(scope: ElementRef<'_>, page_url: Option<&Url>) -> Option<String> {
        let img = scope
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "img")?;

        let raw = [img.value().attr("src"), img.value().attr("data-src")]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())?;

        match page_url.and_then(|base| base.join(raw).ok()) {
            Some(resolved) => Some(resolved.to_string()),
            None => Some(raw.to_string()),
        }
    }
}

impl Extractor for HeuristicExtractor {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn extract(
        &self,
        page: &PageSnapshot,
        store: &str,
        rng: &RandomSource,
    ) -> Vec<ProductRecord> {
        let document = Html::parse_document(&page.html);
        let page_url = Url::parse(&page.url).ok();

        let candidates: Vec<(ElementRef<'_>, String)> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|el| self.bounded_text(el).map(|text| (el, text)))
            .filter(|(_, text)| self.price_re.is_match(text))
            .take(self.rules.max_candidates)
            .collect();

        debug!(store, candidates = candidates.len(), "price candidates found");

        let mut records = Vec::new();
        for (index, (element, text)) in candidates.into_iter().enumerate() {
            let Some(price) = self
                .price_re
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_amount(m.as_str()))
            else {
                continue;
            };
            if !is_plausible(price, self.rules.price_ceiling) {
                continue;
            }

            let mut scope = Some(element);
            let mut name = None;
            for _ in 0..self.rules.ancestor_depth {
                let Some(current) = scope else { break };
                let text: String = current.text().collect();
                if let Some(found) = self.find_name(&text) {
                    name = Some(found);
                    break;
                }
                scope = current.parent().and_then(ElementRef::wrap);
            }
            let name = name.unwrap_or_else(|| self.synthetic_name(index));

            let image = scope
                .and_then(|s| Self::first_image(s, page_url.as_ref()))
                .unwrap_or_else(|| self.placeholder_image(index));

            let (promotion, discount, original_price) = if self.promo_re.is_match(&text) {
                let discount = Decimal::new(self.discount_cents(rng), 2);
                (
                    Some(self.rules.promotion_label.clone()),
                    Some(discount),
                    Some(price + discount),
                )
            } else {
                (None, None, None)
            };

            records.push(ProductRecord {
                name,
                price,
                original_price,
                discount,
                promotion,
                availability: true,
                category: self.rules.category.clone(),
                url: page.url.clone(),
                image: Some(image),
                store: store.to_string(),
                description: None,
                source: RecordSource::Scraped,
            });
        }

        records.truncate(self.rules.max_records);
        records
    }
}

#[cfg(test)]
#[path = "heuristic_test.rs"]
mod tests;
