use super::{Extract, RetailerScraper, SelectorCascade};
use crate::config::GenericRetailer;
use crate::domain::{PriceQuote, PriceStrategy, RawListing};
use crate::error::{Result, ScrapeError};
use crate::utils::{detect_currency, parse_price};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// A retailer whose search result cards are described entirely by config.
pub struct GenericScraper {
    name: String,
    search_url: String,
    card: Selector,
    title: SelectorCascade,
    price: SelectorCascade,
    link: SelectorCascade,
    image: SelectorCascade,
    brand: SelectorCascade,
}

impl GenericScraper {
    pub fn new(name: impl Into<String>, config: &GenericRetailer) -> Result<Self> {
        let card = Selector::parse(&config.card_selector)
            .map_err(|e| ScrapeError::Selector(format!("'{}': {}", config.card_selector, e)))?;

        Ok(Self {
            name: name.into(),
            search_url: config.search_url.clone(),
            card,
            title: SelectorCascade::new(&config.title_selectors, Extract::Text)?,
            price: SelectorCascade::new(&config.price_selectors, Extract::Text)?,
            link: SelectorCascade::new(&config.link_selectors, Extract::attrs(&["href"]))?,
            image: SelectorCascade::new(
                &config.image_selectors,
                Extract::attrs(&["src", "data-src"]),
            )?,
            brand: SelectorCascade::new(&config.brand_selectors, Extract::Text)?,
        })
    }

    fn resolve(&self, base: Option<&Url>, href: &str) -> Option<String> {
        match base {
            Some(base) => base.join(href).ok().map(String::from),
            None => Url::parse(href).ok().map(String::from),
        }
    }

    fn parse_card(&self, card: ElementRef, base: Option<&Url>) -> Option<RawListing> {
        let title = self.title.first_value(card)?;
        let href = self.link.first_value(card)?;
        let url = self.resolve(base, &href)?;

        let price = self.price.first_value(card).and_then(|text| {
            parse_price(&text).map(|current| PriceQuote {
                current,
                list: None,
                currency: detect_currency(&text).to_string(),
                strategy: PriceStrategy::Listing,
            })
        });

        let image_url = self
            .image
            .first_value(card)
            .and_then(|src| self.resolve(base, &src));

        Some(RawListing {
            title,
            url,
            image_url,
            brand: self.brand.first_value(card),
            price,
            retailer: self.name.clone(),
        })
    }
}

impl RetailerScraper for GenericScraper {
    fn name(&self) -> &str {
        &self.name
    }

    fn search_url(&self, term: &str) -> String {
        let query: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        self.search_url.replace("{query}", &query)
    }

    fn parse_search_results(&self, html: &str, max_results: usize) -> Result<Vec<RawListing>> {
        let document = Html::parse_document(html);
        let base = Url::parse(&self.search_url.replace("{query}", "")).ok();

        let listings: Vec<RawListing> = document
            .select(&self.card)
            .filter_map(|card| self.parse_card(card, base.as_ref()))
            .take(max_results)
            .collect();

        debug!("Parsed {} results from {}", listings.len(), self.name);
        Ok(listings)
    }
}
