use super::{Extract, ProductDetails, RetailerScraper, SelectorCascade};
use crate::domain::{PriceQuote, PriceStrategy, RawListing};
use crate::error::{Result, ScrapeError};
use crate::utils::{detect_currency, element_text, parse_price};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub(crate) mod price;
mod selectors;

static BYLINE_STORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^visit the (.+?) store$").unwrap());
static BYLINE_BRAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^brand:\s*(.+)$").unwrap());
static PAGE_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

pub struct AmazonScraper {
    name: String,
    base_url: String,
    card_title: SelectorCascade,
    card_image: SelectorCascade,
    card_brand: SelectorCascade,
    product_title: SelectorCascade,
    product_image: SelectorCascade,
    product_brand: SelectorCascade,
}

impl AmazonScraper {
    pub fn new(name: impl Into<String>, base_url: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            card_title: SelectorCascade::new(selectors::search::TITLE, Extract::Text)?,
            card_image: SelectorCascade::new(selectors::search::IMAGE, Extract::attrs(&["src"]))?,
            card_brand: SelectorCascade::new(selectors::search::BRAND, Extract::Text)?,
            product_title: SelectorCascade::new(selectors::product::TITLE, Extract::Text)?,
            product_image: SelectorCascade::new(
                selectors::product::IMAGE,
                Extract::attrs(selectors::product::IMAGE_ATTRS),
            )?,
            product_brand: SelectorCascade::new(selectors::product::BRAND, Extract::Text)?,
        })
    }

    pub fn product_url(&self, asin: &str) -> String {
        format!("{}/dp/{}", self.base_url, asin)
    }

    fn ensure_not_blocked(document: &Html, url: &str) -> Result<()> {
        let captcha = document.select(&selectors::errors::CAPTCHA).next().is_some();
        let robot_title = document
            .select(&PAGE_TITLE)
            .next()
            .map(|t| element_text(&t).to_lowercase().contains("robot check"))
            .unwrap_or(false);

        if captcha || robot_title {
            return Err(ScrapeError::RobotCheck(url.to_string()));
        }
        Ok(())
    }

    fn card_price(card: &ElementRef) -> Option<PriceQuote> {
        let current_text = card
            .select(&selectors::search::PRICE_CURRENT)
            .next()
            .map(|e| element_text(&e))?;
        let current = parse_price(&current_text)?;

        let list = card
            .select(&selectors::search::PRICE_LIST)
            .next()
            .and_then(|e| parse_price(&element_text(&e)))
            .filter(|&list| list > current);

        Some(PriceQuote {
            current,
            list,
            currency: detect_currency(&current_text).to_string(),
            strategy: PriceStrategy::Listing,
        })
    }

    fn parse_card(&self, card: ElementRef) -> Option<RawListing> {
        let asin = card
            .value()
            .attr(selectors::search::ASIN_ATTR)
            .map(str::trim)
            .filter(|a| !a.is_empty())?;

        if card.select(&selectors::search::SPONSORED).next().is_some() {
            debug!("Skipping sponsored result {}", asin);
            return None;
        }

        let title = self.card_title.first_value(card)?;

        Some(RawListing {
            title,
            url: self.product_url(asin),
            image_url: self.card_image.first_value(card),
            brand: self.card_brand.first_value(card),
            price: Self::card_price(&card),
            retailer: self.name.clone(),
        })
    }
}

/// Strips the "Visit the X Store" / "Brand: X" wrappers from a byline.
pub fn clean_byline(byline: &str) -> String {
    let byline = byline.trim();
    if let Some(caps) = BYLINE_STORE.captures(byline) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = BYLINE_BRAND.captures(byline) {
        return caps[1].trim().to_string();
    }
    byline.to_string()
}

impl RetailerScraper for AmazonScraper {
    fn name(&self) -> &str {
        &self.name
    }

    fn search_url(&self, term: &str) -> String {
        let query: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        format!("{}/s?k={}", self.base_url, query)
    }

    fn has_product_pages(&self) -> bool {
        true
    }

    fn parse_search_results(&self, html: &str, max_results: usize) -> Result<Vec<RawListing>> {
        let document = Html::parse_document(html);
        Self::ensure_not_blocked(&document, &self.base_url)?;

        let listings: Vec<RawListing> = document
            .select(&selectors::search::RESULT)
            .filter_map(|card| self.parse_card(card))
            .take(max_results)
            .collect();

        debug!("Parsed {} Amazon search results", listings.len());
        Ok(listings)
    }

    fn parse_product_page(&self, html: &str, url: &str) -> Result<Option<ProductDetails>> {
        let document = Html::parse_document(html);
        Self::ensure_not_blocked(&document, url)?;

        let details = ProductDetails {
            title: self.product_title.first_in_document(&document),
            brand: self
                .product_brand
                .first_in_document(&document)
                .map(|b| clean_byline(&b))
                .filter(|b| !b.is_empty()),
            image_url: self.product_image.first_in_document(&document),
            price: price::extract_price(&document),
        };

        Ok(Some(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_HTML: &str = r#"<html><head><title>Amazon.com : rtx 4070</title></head><body>
        <div data-component-type="s-search-result" data-asin="B0BZB7DS7Q">
            <img class="s-image" src="https://m.media-amazon.com/images/I/71.jpg">
            <h2><a class="a-link-normal" href="/MSI-GeForce/dp/B0BZB7DS7Q/ref=sr_1_1"><span>MSI Gaming GeForce RTX 4070 12GB GDDR6X</span></a></h2>
            <span class="a-price"><span class="a-offscreen">$549.99</span></span>
            <span class="a-price a-text-price" data-a-strike="true"><span class="a-offscreen">$599.99</span></span>
        </div>
        <div data-component-type="s-search-result" data-asin="B0SPONSOR1">
            <span class="puis-sponsored-label-text">Sponsored</span>
            <h2><a><span>Sponsored GPU</span></a></h2>
        </div>
        <div data-component-type="s-search-result" data-asin="">
            <h2><a><span>Placeholder widget</span></a></h2>
        </div>
        <div data-component-type="s-search-result" data-asin="B0C7XYZ123">
            <h2><a><span>ASUS Dual GeForce RTX 4070 OC</span></a></h2>
        </div>
    </body></html>"#;

    fn scraper() -> AmazonScraper {
        AmazonScraper::new("amazon", "https://www.amazon.com/").unwrap()
    }

    #[test]
    fn test_search_url_encodes_term() {
        assert_eq!(
            scraper().search_url("RTX 4070 Ti"),
            "https://www.amazon.com/s?k=RTX+4070+Ti"
        );
    }

    #[test]
    fn test_parse_search_results() {
        let listings = scraper().parse_search_results(SEARCH_HTML, 10).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.title, "MSI Gaming GeForce RTX 4070 12GB GDDR6X");
        assert_eq!(first.url, "https://www.amazon.com/dp/B0BZB7DS7Q");
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/71.jpg")
        );
        let price = first.price.as_ref().unwrap();
        assert_eq!(price.current, 549.99);
        assert_eq!(price.list, Some(599.99));
        assert_eq!(price.strategy, PriceStrategy::Listing);

        assert!(listings[1].price.is_none());
    }

    #[test]
    fn test_parse_search_results_respects_max() {
        let listings = scraper().parse_search_results(SEARCH_HTML, 1).unwrap();
        assert_eq!(listings.len(), 1);
    }

    #[test]
    fn test_robot_check_is_error() {
        let html = r#"<html><head><title>Robot Check</title></head><body>
            <form action="/errors/validateCaptcha"><input id="captchacharacters"></form>
        </body></html>"#;

        assert!(matches!(
            scraper().parse_search_results(html, 10),
            Err(ScrapeError::RobotCheck(_))
        ));
        assert!(matches!(
            scraper().parse_product_page(html, "https://www.amazon.com/dp/B0X"),
            Err(ScrapeError::RobotCheck(_))
        ));
    }

    #[test]
    fn test_parse_product_page() {
        let html = r#"<html><body>
            <span id="productTitle">  Corsair RM850x (2021) Fully Modular 80 PLUS Gold 850W  </span>
            <a id="bylineInfo" href="/stores/Corsair">Visit the Corsair Store</a>
            <div id="imgTagWrapperId"><img id="landingImage" data-old-hires="https://m.media-amazon.com/images/I/hires.jpg" src="https://m.media-amazon.com/images/I/small.jpg"></div>
            <div id="corePrice_feature_div">
                <span class="a-price"><span class="a-offscreen">$129.99</span></span>
            </div>
        </body></html>"#;

        let details = scraper()
            .parse_product_page(html, "https://www.amazon.com/dp/B08R5JQHNQ")
            .unwrap()
            .unwrap();

        assert_eq!(
            details.title.as_deref(),
            Some("Corsair RM850x (2021) Fully Modular 80 PLUS Gold 850W")
        );
        assert_eq!(details.brand.as_deref(), Some("Corsair"));
        assert_eq!(
            details.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/hires.jpg")
        );
        assert_eq!(details.price.unwrap().current, 129.99);
    }

    #[test]
    fn test_clean_byline() {
        assert_eq!(clean_byline("Visit the ASUS Store"), "ASUS");
        assert_eq!(clean_byline("Brand: G.SKILL"), "G.SKILL");
        assert_eq!(clean_byline(" Noctua "), "Noctua");
    }
}
