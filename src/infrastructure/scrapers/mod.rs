use crate::config::{Retailer, RetailerKind};
use crate::domain::{PriceQuote, RawListing};
use crate::error::{Result, ScrapeError};
use crate::utils::element_text;
use rustc_hash::FxHashMap;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

pub(crate) mod amazon;
pub(crate) mod generic;

/// Details read off a single product page.
#[derive(Debug, Clone, Default)]
pub struct ProductDetails {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<PriceQuote>,
}

pub trait RetailerScraper: Send + Sync {
    fn name(&self) -> &str;

    fn search_url(&self, term: &str) -> String;

    fn parse_search_results(&self, html: &str, max_results: usize) -> Result<Vec<RawListing>>;

    /// Whether product pages are worth a visit to refine the card data.
    fn has_product_pages(&self) -> bool {
        false
    }

    /// Retailers without a product-page parser keep whatever the search card
    /// gave them.
    fn parse_product_page(&self, _html: &str, _url: &str) -> Result<Option<ProductDetails>> {
        Ok(None)
    }
}

/// One scraper per configured retailer, keyed by retailer name.
pub fn build_scrapers(retailers: &[Retailer]) -> Result<FxHashMap<String, Arc<dyn RetailerScraper>>> {
    let mut scrapers: FxHashMap<String, Arc<dyn RetailerScraper>> = FxHashMap::default();
    for retailer in retailers {
        let scraper: Arc<dyn RetailerScraper> = match &retailer.kind {
            RetailerKind::Amazon { base_url } => {
                Arc::new(amazon::AmazonScraper::new(&retailer.name, base_url)?)
            }
            RetailerKind::Generic(generic) => {
                Arc::new(generic::GenericScraper::new(&retailer.name, generic)?)
            }
        };
        scrapers.insert(retailer.name.clone(), scraper);
    }
    Ok(scrapers)
}

#[derive(Debug, Clone)]
pub enum Extract {
    Text,
    /// Attribute names, tried in order.
    Attrs(Vec<String>),
}

impl Extract {
    pub fn attrs(names: &[&str]) -> Self {
        Extract::Attrs(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Ordered CSS selectors; the first one yielding a non-empty value wins.
#[derive(Debug, Clone)]
pub struct SelectorCascade {
    selectors: Vec<Selector>,
    extract: Extract,
}

impl SelectorCascade {
    pub fn new<S: AsRef<str>>(selectors: &[S], extract: Extract) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| {
                Selector::parse(s.as_ref()).map_err(|e| {
                    ScrapeError::Selector(format!("'{}': {}", s.as_ref(), e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { selectors, extract })
    }

    pub fn first_value(&self, scope: ElementRef) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .find_map(|element| self.value_of(&element))
        })
    }

    pub fn first_in_document(&self, document: &Html) -> Option<String> {
        self.first_value(document.root_element())
    }

    fn value_of(&self, element: &ElementRef) -> Option<String> {
        let value = match &self.extract {
            Extract::Text => element_text(element),
            Extract::Attrs(names) => names
                .iter()
                .filter_map(|name| element.value().attr(name))
                .map(str::trim)
                .find(|v| !v.is_empty())?
                .to_string(),
        };

        (!value.is_empty()).then_some(value)
    }
}
