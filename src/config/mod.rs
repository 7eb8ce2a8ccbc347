use crate::config::cli::{Args, Commands};
use crate::domain::Category;
use crate::error::{Result, ScrapeError};
use clap::Parser;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub(crate) mod cli;

pub const AMAZON: &str = "amazon";

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
    pub category: Category,
    #[serde(default = "default_retailer")]
    pub retailer: String,
    pub terms: Vec<String>,
}

/// Selector cascades for a retailer whose result pages are parsed purely
/// from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GenericRetailer {
    /// Search URL with a `{query}` placeholder.
    pub search_url: String,
    pub card_selector: String,
    pub title_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub link_selectors: Vec<String>,
    #[serde(default)]
    pub image_selectors: Vec<String>,
    #[serde(default)]
    pub brand_selectors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RetailerKind {
    Amazon { base_url: String },
    Generic(GenericRetailer),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retailer {
    pub name: String,
    #[serde(flatten)]
    pub kind: RetailerKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_max_results")]
    pub max_results_per_term: usize,
    #[serde(default = "default_true")]
    pub visit_product_pages: bool,
    /// Drop listings that end up without a usable price.
    #[serde(default)]
    pub require_price: bool,
    #[serde(default)]
    pub searches: Vec<Search>,
    #[serde(default = "default_retailers")]
    pub retailers: Vec<Retailer>,
}

fn default_retailer() -> String {
    AMAZON.to_string()
}

fn default_delay_ms() -> u64 {
    1500
}

fn default_workers() -> usize {
    2
}

fn default_max_results() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_retailers() -> Vec<Retailer> {
    vec![Retailer {
        name: AMAZON.to_string(),
        kind: RetailerKind::Amazon {
            base_url: "https://www.amazon.com".to_string(),
        },
    }]
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_delay_ms(),
            workers: default_workers(),
            max_results_per_term: default_max_results(),
            visit_product_pages: true,
            require_price: false,
            searches: Vec::new(),
            retailers: default_retailers(),
        }
    }
}

impl ScraperConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: ScraperConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ScrapeError::Config("workers must be at least 1".to_string()));
        }

        for retailer in &self.retailers {
            if let RetailerKind::Generic(generic) = &retailer.kind {
                if !generic.search_url.contains("{query}") {
                    return Err(ScrapeError::Config(format!(
                        "search_url of retailer '{}' has no {{query}} placeholder",
                        retailer.name
                    )));
                }
            }
        }

        for search in &self.searches {
            if self.retailer(&search.retailer).is_none() {
                return Err(ScrapeError::Config(format!(
                    "search for {} references unknown retailer '{}'",
                    search.category, search.retailer
                )));
            }
        }

        Ok(())
    }

    pub fn retailer(&self, name: &str) -> Option<&Retailer> {
        self.retailers.iter().find(|r| r.name == name)
    }
}

pub struct Config {
    pub args: Args,
    pub scraper_config: ScraperConfig,
}

impl Config {
    pub fn new() -> Result<Self> {
        let args = Args::parse();

        // Purge and stats never touch the retailers
        let scraper_config = match args.command {
            Commands::Scrape { .. } | Commands::Product { .. } => {
                info!("Loading scraper config from {:?}", args.config_file);
                ScraperConfig::from_file(&args.config_file)?
            }
            _ => ScraperConfig::default(),
        };

        Ok(Self {
            args,
            scraper_config,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        if !self.args.data_dir.exists() {
            std::fs::create_dir_all(&self.args.data_dir)?;
        }

        info!("Data dir exists");
        Ok(())
    }
}
