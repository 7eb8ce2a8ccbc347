use crate::config::{ScraperConfig, AMAZON};
use crate::domain::{Category, RawListing};
use crate::error::{Result, ScrapeError};
use crate::infrastructure::{PageFetcher, RetailerScraper};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// One search term against one retailer.
#[derive(Debug, Clone)]
pub struct SearchJob {
    pub category: Category,
    pub retailer: String,
    pub term: String,
}

#[derive(Debug, Default)]
pub struct ScrapeOutput {
    pub listings: Vec<(Category, RawListing)>,
    pub terms_scraped: usize,
    pub skipped_pages: usize,
}

#[derive(Default)]
struct TermOutput {
    listings: Vec<RawListing>,
    scraped: bool,
    skipped_pages: usize,
}

pub struct ScrapingService {
    fetcher: Arc<dyn PageFetcher>,
    scrapers: FxHashMap<String, Arc<dyn RetailerScraper>>,
    config: ScraperConfig,
}

impl ScrapingService {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        scrapers: FxHashMap<String, Arc<dyn RetailerScraper>>,
        config: &ScraperConfig,
    ) -> Self {
        info!("Created new Scraping service");
        Self {
            fetcher,
            scrapers,
            config: config.clone(),
        }
    }

    /// Expands the configured searches into jobs, optionally for one category.
    pub fn jobs(&self, category: Option<Category>) -> Vec<SearchJob> {
        self.config
            .searches
            .iter()
            .filter(|search| category.map_or(true, |c| c == search.category))
            .flat_map(|search| {
                search.terms.iter().map(move |term| SearchJob {
                    category: search.category,
                    retailer: search.retailer.clone(),
                    term: term.clone(),
                })
            })
            .collect()
    }

    async fn pause(&self) {
        if self.config.request_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }
    }

    /// Runs all jobs over `workers` concurrent searches. Failed pages are
    /// logged, counted and skipped.
    pub async fn scrape_all(&self, jobs: &[SearchJob]) -> Result<ScrapeOutput> {
        let pb = ProgressBar::new(jobs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .map_err(|e| ScrapeError::Other(e.to_string()))?,
        );

        let results: Vec<(Category, TermOutput)> = stream::iter(jobs)
            .map(|job| {
                let pb = &pb;
                async move {
                    let output = self.scrape_term(job).await;
                    pb.set_message(job.term.clone());
                    pb.inc(1);
                    (job.category, output)
                }
            })
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;

        pb.finish_with_message("done");

        let mut output = ScrapeOutput::default();
        for (category, term) in results {
            if term.scraped {
                output.terms_scraped += 1;
            }
            output.skipped_pages += term.skipped_pages;
            output
                .listings
                .extend(term.listings.into_iter().map(|l| (category, l)));
        }

        info!(
            "Scraped {} of {} terms, {} listings, {} pages skipped",
            output.terms_scraped,
            jobs.len(),
            output.listings.len(),
            output.skipped_pages
        );
        Ok(output)
    }

    async fn scrape_term(&self, job: &SearchJob) -> TermOutput {
        let mut output = TermOutput::default();

        let Some(scraper) = self.scrapers.get(&job.retailer) else {
            warn!("No scraper for retailer '{}', skipping '{}'", job.retailer, job.term);
            output.skipped_pages += 1;
            return output;
        };

        let url = scraper.search_url(&job.term);
        info!("Searching {} for '{}'", scraper.name(), job.term);

        let listings = match self.fetch_listings(scraper.as_ref(), &url).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!("Skipping search page {}: {}", url, e);
                output.skipped_pages += 1;
                return output;
            }
        };
        output.scraped = true;
        self.pause().await;

        if !(self.config.visit_product_pages && scraper.has_product_pages()) {
            output.listings = listings;
            return output;
        }

        for mut listing in listings {
            if let Err(e) = self.refine_listing(scraper.as_ref(), &mut listing).await {
                warn!("Skipping product page {}: {}", listing.url, e);
                output.skipped_pages += 1;
            }
            // The card data is still usable when the product page fails
            output.listings.push(listing);
            self.pause().await;
        }

        output
    }

    async fn fetch_listings(&self, scraper: &dyn RetailerScraper, url: &str) -> Result<Vec<RawListing>> {
        let html = self.fetcher.fetch(url).await?;
        scraper.parse_search_results(&html, self.config.max_results_per_term)
    }

    /// Visits the listing's product page. A price quote found there replaces
    /// the card price; a missing one keeps it.
    async fn refine_listing(&self, scraper: &dyn RetailerScraper, listing: &mut RawListing) -> Result<()> {
        let html = self.fetcher.fetch(&listing.url).await?;
        let Some(details) = scraper.parse_product_page(&html, &listing.url)? else {
            return Ok(());
        };

        if details.price.is_some() {
            listing.price = details.price;
        }
        if listing.brand.is_none() {
            listing.brand = details.brand;
        }
        if details.image_url.is_some() {
            listing.image_url = details.image_url;
        }
        Ok(())
    }

    /// Scrapes a single Amazon product page into a listing.
    pub async fn scrape_product(&self, url: &str) -> Result<RawListing> {
        let scraper = self
            .scrapers
            .get(AMAZON)
            .ok_or_else(|| ScrapeError::Config("no amazon retailer configured".to_string()))?;

        let html = self.fetcher.fetch(url).await?;
        let details = scraper
            .parse_product_page(&html, url)?
            .ok_or_else(|| ScrapeError::Parse(format!("no product details on {}", url)))?;
        let title = details
            .title
            .ok_or_else(|| ScrapeError::Parse(format!("no product title on {}", url)))?;

        Ok(RawListing {
            title,
            url: url.to_string(),
            image_url: details.image_url,
            brand: details.brand,
            price: details.price,
            retailer: scraper.name().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Search;
    use crate::infrastructure::scrapers::amazon::AmazonScraper;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves canned pages by URL and records every request.
    pub(crate) struct FakeFetcher {
        pages: FxHashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub(crate) fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    pub(crate) const SEARCH_PAGE: &str = r#"<html><body>
        <div data-component-type="s-search-result" data-asin="B000000001">
            <h2><a><span>MSI GeForce RTX 4070 12GB</span></a></h2>
            <span class="a-price"><span class="a-offscreen">$599.99</span></span>
        </div>
        <div data-component-type="s-search-result" data-asin="B000000002">
            <h2><a><span>Sapphire Radeon RX 7800 XT 16GB</span></a></h2>
            <span class="a-price"><span class="a-offscreen">$499.99</span></span>
        </div>
    </body></html>"#;

    pub(crate) const PRODUCT_PAGE: &str = r#"<html><body>
        <span id="productTitle">MSI GeForce RTX 4070 12GB GDDR6X</span>
        <a id="bylineInfo">Visit the MSI Store</a>
        <div id="corePriceDisplay_desktop_feature_div">
            <span class="a-price priceToPay"><span class="a-offscreen">$549.99</span></span>
            <div><span class="a-size-small">List Price:</span>
            <span class="a-price a-text-price" data-a-strike="true"><span class="a-offscreen">$599.99</span></span></div>
        </div>
    </body></html>"#;

    pub(crate) fn config(visit_product_pages: bool) -> ScraperConfig {
        ScraperConfig {
            request_delay_ms: 0,
            workers: 2,
            visit_product_pages,
            searches: vec![
                Search {
                    category: Category::Gpu,
                    retailer: AMAZON.to_string(),
                    terms: vec!["rtx 4070".to_string(), "broken".to_string()],
                },
                Search {
                    category: Category::Psu,
                    retailer: AMAZON.to_string(),
                    terms: vec!["850w".to_string()],
                },
            ],
            ..ScraperConfig::default()
        }
    }

    pub(crate) fn amazon_scrapers() -> FxHashMap<String, Arc<dyn RetailerScraper>> {
        let mut scrapers: FxHashMap<String, Arc<dyn RetailerScraper>> = FxHashMap::default();
        scrapers.insert(
            AMAZON.to_string(),
            Arc::new(AmazonScraper::new(AMAZON, "https://www.amazon.com").unwrap()),
        );
        scrapers
    }

    #[test]
    fn test_jobs_filter_by_category() {
        let service = ScrapingService::new(
            Arc::new(FakeFetcher::new(&[])),
            amazon_scrapers(),
            &config(false),
        );

        assert_eq!(service.jobs(None).len(), 3);
        let psu = service.jobs(Some(Category::Psu));
        assert_eq!(psu.len(), 1);
        assert_eq!(psu[0].term, "850w");
        assert!(service.jobs(Some(Category::Ram)).is_empty());
    }

    #[tokio::test]
    async fn test_scrape_all_skips_failed_pages() {
        let fetcher = Arc::new(FakeFetcher::new(&[
            ("https://www.amazon.com/s?k=rtx+4070", SEARCH_PAGE),
            ("https://www.amazon.com/s?k=850w", "<html><body></body></html>"),
        ]));
        let service = ScrapingService::new(fetcher.clone(), amazon_scrapers(), &config(false));

        let jobs = service.jobs(None);
        let output = service.scrape_all(&jobs).await.unwrap();

        assert_eq!(output.terms_scraped, 2);
        assert_eq!(output.skipped_pages, 1);
        assert_eq!(output.listings.len(), 2);
        assert!(output.listings.iter().all(|(c, _)| *c == Category::Gpu));
        // No product pages without visit_product_pages
        assert_eq!(fetcher.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_product_pages_refine_card_price() {
        let fetcher = Arc::new(FakeFetcher::new(&[
            ("https://www.amazon.com/s?k=rtx+4070", SEARCH_PAGE),
            ("https://www.amazon.com/dp/B000000001", PRODUCT_PAGE),
        ]));
        let service = ScrapingService::new(fetcher.clone(), amazon_scrapers(), &config(true));

        let jobs = service.jobs(Some(Category::Gpu));
        let output = service.scrape_all(&jobs).await.unwrap();

        assert_eq!(output.listings.len(), 2);
        // One failed search page and one missing product page
        assert_eq!(output.skipped_pages, 2);

        let refined = output
            .listings
            .iter()
            .map(|(_, l)| l)
            .find(|l| l.url.ends_with("B000000001"))
            .unwrap();
        let price = refined.price.as_ref().unwrap();
        assert_eq!(price.current, 549.99);
        assert_eq!(price.list, Some(599.99));
        assert_eq!(refined.brand.as_deref(), Some("MSI"));

        // The listing whose product page failed keeps its card price
        let kept = output
            .listings
            .iter()
            .map(|(_, l)| l)
            .find(|l| l.url.ends_with("B000000002"))
            .unwrap();
        assert_eq!(kept.price.as_ref().unwrap().current, 499.99);
    }

    #[tokio::test]
    async fn test_scrape_product() {
        let fetcher = Arc::new(FakeFetcher::new(&[(
            "https://www.amazon.com/dp/B000000001",
            PRODUCT_PAGE,
        )]));
        let service = ScrapingService::new(fetcher, amazon_scrapers(), &config(true));

        let listing = service
            .scrape_product("https://www.amazon.com/dp/B000000001")
            .await
            .unwrap();
        assert_eq!(listing.title, "MSI GeForce RTX 4070 12GB GDDR6X");
        assert_eq!(listing.price.unwrap().current, 549.99);

        assert!(service
            .scrape_product("https://www.amazon.com/dp/B0MISSING00")
            .await
            .is_err());
    }
}
