//! Best-effort marketplace price lookup.
//!
//! Fetches a search page for a normalized card number and extracts the
//! listings that display it. Any failure along the way — fetch error,
//! unparseable page, zero matches — collapses to `None`; enrichment must
//! never block card persistence.

use async_trait::async_trait;
use common::PriceListing;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

/// Scrapes are bounded like any other external call on the request path.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Narrow listing contract: one container selector, three child selectors.
const LISTING_SELECTOR: &str = ".product-card";
const TITLE_SELECTOR: &str = ".product-title";
const RARITY_SELECTOR: &str = ".product-rarity";
const PRICE_SELECTOR: &str = ".product-price";

/// Source of live marketplace listings for a card number.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Listings matching the card number, or `None` when the lookup
    /// yielded nothing (for any reason).
    async fn lookup_price(&self, card_number: &str) -> Option<Vec<PriceListing>>;
}

#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub base_url: String,
}

/// Client for the marketplace search page.
pub struct MarketplaceClient {
    client: Client,
    config: MarketplaceConfig,
}

impl MarketplaceClient {
    pub fn new(config: MarketplaceConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }
}

#[async_trait]
impl PriceSource for MarketplaceClient {
    async fn lookup_price(&self, card_number: &str) -> Option<Vec<PriceListing>> {
        let number = normalize_card_number(card_number);
        let url = format!("{}/search?q={}", self.config.base_url, number);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("marketplace request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "marketplace search for {} returned {}",
                number,
                response.status()
            );
            return None;
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!("marketplace response could not be read: {}", e);
                return None;
            }
        };

        let listings = parse_listings(&html, &number);
        debug!("found {} listing(s) for {}", listings.len(), number);

        if listings.is_empty() {
            None
        } else {
            Some(listings)
        }
    }
}

/// Canonicalize a raw card number into `"<4-char set code>-<rest>"`.
///
/// `"OP01025"` becomes `"OP01-025"`; already-hyphenated input passes
/// through unchanged.
pub fn normalize_card_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('-') || !trimmed.is_ascii() || trimmed.len() <= 4 {
        return trimmed.to_uppercase();
    }
    let (set, rest) = trimmed.split_at(4);
    format!("{}-{}", set, rest).to_uppercase()
}

/// Parse a localized price string into major units.
///
/// Thousands separators and any currency decoration are stripped; a
/// fractional part is discarded. Text with no digits yields `None`.
pub fn parse_price(text: &str) -> Option<i64> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let integer_part = numeric.split('.').next().unwrap_or("");
    let digits: String = integer_part.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Extract listings whose displayed identifier contains the card number.
fn parse_listings(html: &str, card_number: &str) -> Vec<PriceListing> {
    // The selectors are compile-time constants; parse failures here would
    // be programmer errors, but degrade to "no listings" all the same.
    let (Ok(listing_sel), Ok(title_sel), Ok(rarity_sel), Ok(price_sel)) = (
        Selector::parse(LISTING_SELECTOR),
        Selector::parse(TITLE_SELECTOR),
        Selector::parse(RARITY_SELECTOR),
        Selector::parse(PRICE_SELECTOR),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let needle = card_number.to_uppercase();
    let mut listings = Vec::new();

    for element in document.select(&listing_sel) {
        let title = match element.select(&title_sel).next() {
            Some(node) => node.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if !title.to_uppercase().contains(&needle) {
            continue;
        }

        let price_text = match element.select(&price_sel).next() {
            Some(node) => node.text().collect::<String>(),
            None => continue,
        };
        // A listing whose price text cannot be parsed is dropped.
        let Some(price) = parse_price(&price_text) else {
            continue;
        };

        let rarity = element
            .select(&rarity_sel)
            .next()
            .map(|node| node.text().collect::<String>().trim().to_string())
            .filter(|r| !r.is_empty());

        listings.push(PriceListing {
            title,
            card_number: card_number.to_string(),
            rarity,
            price,
        });
    }

    listings
}

/// Test double answering with canned listings.
pub struct FakePriceSource {
    listings: Option<Vec<PriceListing>>,
}

impl FakePriceSource {
    pub fn with_listings(listings: Vec<PriceListing>) -> Self {
        Self {
            listings: Some(listings),
        }
    }

    /// Simulates a lookup that yields nothing.
    pub fn empty() -> Self {
        Self { listings: None }
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    async fn lookup_price(&self, _card_number: &str) -> Option<Vec<PriceListing>> {
        self.listings.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
          <div class="product-card">
            <span class="product-title">OP01-025 Roronoa Zoro</span>
            <span class="product-rarity">SR</span>
            <span class="product-price">S$1,200</span>
          </div>
          <div class="product-card">
            <span class="product-title">OP01-025 Roronoa Zoro (Alt Art)</span>
            <span class="product-price">Sold out</span>
          </div>
          <div class="product-card">
            <span class="product-title">OP02-001 Edward Newgate</span>
            <span class="product-price">S$90</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_normalize_card_number_inserts_hyphen() {
        assert_eq!(normalize_card_number("OP01025"), "OP01-025");
        assert_eq!(normalize_card_number("op01025"), "OP01-025");
    }

    #[test]
    fn test_normalize_card_number_keeps_hyphenated() {
        assert_eq!(normalize_card_number("OP01-025"), "OP01-025");
        assert_eq!(normalize_card_number(" ST10-001 "), "ST10-001");
    }

    #[test]
    fn test_parse_price_strips_separators() {
        assert_eq!(parse_price("S$1,200"), Some(1200));
        assert_eq!(parse_price("1,234,567円"), Some(1234567));
        assert_eq!(parse_price("$90"), Some(90));
        assert_eq!(parse_price("12.50"), Some(12));
    }

    #[test]
    fn test_parse_price_rejects_non_numeric() {
        assert_eq!(parse_price("Sold out"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_listings_filters_and_drops_unparseable() {
        let listings = parse_listings(SAMPLE_PAGE, "OP01-025");
        // The alt-art listing has no parseable price and the OP02 listing
        // does not match; only one survives.
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "OP01-025 Roronoa Zoro");
        assert_eq!(listings[0].rarity.as_deref(), Some("SR"));
        assert_eq!(listings[0].price, 1200);
    }

    #[test]
    fn test_parse_listings_no_match() {
        assert!(parse_listings(SAMPLE_PAGE, "OP05-119").is_empty());
        assert!(parse_listings("<html></html>", "OP01-025").is_empty());
    }
}
