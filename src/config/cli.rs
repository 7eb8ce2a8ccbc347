use crate::domain::Category;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Path to scraper configuration file
    #[arg(long, env = "PARTSCOUT_CONFIG", default_value = "scraper_config.json")]
    pub config_file: PathBuf,

    /// Directory holding the product collections and run summaries
    #[arg(long, env = "PARTSCOUT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// How pages are loaded
    #[arg(long, value_enum, default_value_t = FetcherKind::Chrome)]
    pub fetcher: FetcherKind,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetcherKind {
    /// Plain HTTP GET, no JavaScript
    Http,
    /// Headless Chrome
    Chrome,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every configured search and upsert the results
    Scrape {
        /// Only run searches for this category
        #[arg(long, value_enum)]
        category: Option<Category>,

        /// Normalize but do not write to the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Scrape a single Amazon product page
    Product {
        #[arg(long)]
        url: String,

        #[arg(long, value_enum)]
        category: Category,

        #[arg(long)]
        dry_run: bool,
    },
    /// Delete collections, or only records with an invalid price
    Purge {
        /// Collection to purge
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        collection: Option<String>,

        /// Purge every collection
        #[arg(long)]
        all: bool,

        /// Keep records whose prices are valid
        #[arg(long)]
        invalid_only: bool,
    },
    /// Print document counts per collection
    Stats,
}
