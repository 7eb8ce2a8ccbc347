use crate::config::cli::{Commands, FetcherKind};
use crate::config::Config;
use crate::domain::storage::ProductStore;
use crate::error::Result;
use crate::infrastructure::{build_scrapers, ChromeFetcher, FileSystemStore, HttpFetcher, PageFetcher};
use crate::services::{
    catalog::CatalogService,
    maintenance::{MaintenanceService, PurgeTarget},
    parts_service::PartsService,
    scraping::ScrapingService,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn, Level};

mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod utils;

fn init_logging(log_level: &str) {
    let level = Level::from_str(log_level).unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}', using info", log_level);
        Level::INFO
    });
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn build_fetcher(kind: FetcherKind, workers: usize) -> Result<Arc<dyn PageFetcher>> {
    let fetcher: Arc<dyn PageFetcher> = match kind {
        FetcherKind::Http => Arc::new(HttpFetcher::new()?),
        FetcherKind::Chrome => Arc::new(ChromeFetcher::launch(workers)?),
    };
    Ok(fetcher)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::new()?;
    init_logging(&config.args.log_level);
    config.ensure_directories()?;

    let store: Arc<dyn ProductStore> = Arc::new(FileSystemStore::new(&config.args.data_dir));

    match &config.args.command {
        Commands::Scrape { category, dry_run } => {
            let parts = parts_service(&config, store)?;
            parts.scrape(*category, *dry_run).await?;
        }
        Commands::Product {
            url,
            category,
            dry_run,
        } => {
            let parts = parts_service(&config, store)?;
            parts.scrape_product(url, *category, *dry_run).await?;
        }
        Commands::Purge {
            collection,
            all,
            invalid_only,
        } => {
            let target = match collection {
                Some(name) if !*all => PurgeTarget::Collection(name.clone()),
                _ => PurgeTarget::All,
            };
            let report = MaintenanceService::new(store).purge(&target, *invalid_only)?;
            info!(
                "Purge completed: {} collections dropped, {} records removed",
                report.collections_dropped, report.records_removed
            );
        }
        Commands::Stats => {
            let stats = MaintenanceService::new(store).stats()?;
            if stats.is_empty() {
                warn!("No collections in {:?}", config.args.data_dir);
            }
            for collection in stats {
                println!(
                    "{:<16} {:>6} documents {:>4} invalid prices",
                    collection.name, collection.documents, collection.invalid_prices
                );
            }
        }
    }

    Ok(())
}

fn parts_service(config: &Config, store: Arc<dyn ProductStore>) -> Result<PartsService> {
    let fetcher = build_fetcher(config.args.fetcher, config.scraper_config.workers)?;
    let scrapers = build_scrapers(&config.scraper_config.retailers)?;

    let scraping = ScrapingService::new(fetcher, scrapers, &config.scraper_config);
    let catalog = CatalogService::new(store.clone());
    Ok(PartsService::new(
        &config.scraper_config,
        store,
        scraping,
        catalog,
    ))
}
