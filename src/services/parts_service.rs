use crate::config::ScraperConfig;
use crate::domain::storage::ProductStore;
use crate::domain::{Category, RunSummary};
use crate::error::Result;
use crate::services::{
    catalog::{CatalogService, UpsertCounts},
    normalize::normalize_all,
    scraping::ScrapingService,
};
use std::sync::Arc;
use tracing::info;

/// Drives a scrape run: scrape, normalize, upsert, record the summary.
pub struct PartsService {
    scraper_config: ScraperConfig,
    store: Arc<dyn ProductStore>,
    scraping: ScrapingService,
    catalog: CatalogService,
}

impl PartsService {
    pub fn new(
        scraper_config: &ScraperConfig,
        store: Arc<dyn ProductStore>,
        scraping: ScrapingService,
        catalog: CatalogService,
    ) -> Self {
        Self {
            scraper_config: scraper_config.clone(),
            store,
            scraping,
            catalog,
        }
    }

    pub async fn scrape(&self, category: Option<Category>, dry_run: bool) -> Result<RunSummary> {
        info!("Starting scrape run (dry run: {})", dry_run);
        let mut summary = RunSummary::start(dry_run);

        let jobs = self.scraping.jobs(category);
        info!("{} search terms to scrape", jobs.len());

        let scraped = self.scraping.scrape_all(&jobs).await?;
        summary.terms_scraped = scraped.terms_scraped;
        summary.skipped_pages = scraped.skipped_pages;
        summary.listings_found = scraped.listings.len();
        info!("Scraping completed: {} listings", scraped.listings.len());

        let products = normalize_all(&scraped.listings, self.scraper_config.require_price);
        summary.products_normalized = products.len();
        info!("Normalization completed: {} products", products.len());

        let counts = self.catalog.upsert_all(products, dry_run)?;
        self.finish(summary, counts)
    }

    /// Scrapes one product page and upserts it into its collection.
    pub async fn scrape_product(
        &self,
        url: &str,
        category: Category,
        dry_run: bool,
    ) -> Result<RunSummary> {
        info!("Scraping single product {}", url);
        let mut summary = RunSummary::start(dry_run);

        let listing = self.scraping.scrape_product(url).await?;
        summary.listings_found = 1;

        let products = normalize_all(&[(category, listing)], self.scraper_config.require_price);
        summary.products_normalized = products.len();

        let counts = self.catalog.upsert_all(products, dry_run)?;
        self.finish(summary, counts)
    }

    fn finish(&self, mut summary: RunSummary, counts: UpsertCounts) -> Result<RunSummary> {
        summary.inserted = counts.inserted;
        summary.updated = counts.updated;
        summary.unchanged = counts.unchanged;
        summary.finish();

        info!(
            "Run finished: {} terms, {} listings, {} products, {} inserted, {} updated, {} unchanged, {} pages skipped",
            summary.terms_scraped,
            summary.listings_found,
            summary.products_normalized,
            summary.inserted,
            summary.updated,
            summary.unchanged,
            summary.skipped_pages
        );

        if !summary.dry_run {
            self.store.save_run_summary(&summary)?;
        }
        Ok(summary)
    }
}
