use crate::domain::storage::ProductStore;
use crate::domain::Product;
use crate::error::Result;
use crate::services::normalize::chip_vendor;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Names at least this similar count as the same product.
const NAME_SIMILARITY: f64 = 0.95;
const PRICE_TOLERANCE: f64 = 0.01;

static AMAZON_ASIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:dp|gp/product|gp/aw/d)/([A-Z0-9]{10})(?:[/?]|$)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl UpsertCounts {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Source URL with query and fragment removed. Amazon URLs are reduced to
/// `/dp/<ASIN>` so that slugged and tracking variants collapse together.
pub fn canonical_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        let end = raw.find(['?', '#']).unwrap_or(raw.len());
        return raw[..end].trim().trim_end_matches('/').to_string();
    };

    url.set_query(None);
    url.set_fragment(None);

    let is_amazon = url.host_str().map_or(false, |h| h.contains("amazon."));
    if is_amazon {
        if let Some(asin) = AMAZON_ASIN.captures(url.path()).map(|c| c[1].to_string()) {
            url.set_path(&format!("/dp/{}", asin));
        }
    }

    url.as_str().trim_end_matches('/').to_string()
}

fn normalized_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn same_price(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() <= PRICE_TOLERANCE,
        (None, None) => true,
        _ => false,
    }
}

/// Collection a product is stored in, by category and chip vendor.
pub fn collection_for(product: &Product) -> String {
    product
        .category
        .collection(chip_vendor(product.category, &product.name))
}

/// One collection loaded into memory for a batch of upserts.
pub struct Collection {
    name: String,
    products: Vec<Product>,
    by_url: FxHashMap<String, usize>,
    next_id: u64,
    dirty: bool,
}

impl Collection {
    pub fn new(name: impl Into<String>, products: Vec<Product>) -> Self {
        let by_url = products
            .iter()
            .enumerate()
            .map(|(i, p)| (canonical_url(&p.source_url), i))
            .collect();
        let next_id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;

        Self {
            name: name.into(),
            products,
            by_url,
            next_id,
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn find_match(&self, product: &Product, url: &str) -> Option<usize> {
        if let Some(&index) = self.by_url.get(url) {
            return Some(index);
        }

        let name = normalized_name(&product.name);
        self.products.iter().position(|existing| {
            if !same_price(existing.base_price, product.base_price) {
                return false;
            }
            let existing_name = normalized_name(&existing.name);
            existing_name == name
                || strsim::normalized_levenshtein(&existing_name, &name) >= NAME_SIMILARITY
        })
    }

    pub fn upsert(&mut self, mut product: Product) -> UpsertOutcome {
        let url = canonical_url(&product.source_url);

        if let Some(index) = self.find_match(&product, &url) {
            let existing = &mut self.products[index];
            let image_url = product.image_url.take().or_else(|| existing.image_url.clone());

            let changed = existing.base_price != product.base_price
                || existing.sale_price != product.sale_price
                || existing.currency != product.currency
                || existing.image_url != image_url
                || existing.specs != product.specs;

            if !changed {
                debug!("Unchanged {} in {}", existing.id, self.name);
                return UpsertOutcome::Unchanged;
            }

            existing.base_price = product.base_price;
            existing.sale_price = product.sale_price;
            existing.currency = product.currency;
            existing.image_url = image_url;
            existing.specs = product.specs;
            existing.updated_at = product.updated_at;
            debug!("Updated {} in {}", existing.id, self.name);

            self.by_url.entry(url).or_insert(index);
            self.dirty = true;
            return UpsertOutcome::Updated;
        }

        product.id = self.next_id;
        product.source_url = url.clone();
        self.next_id += 1;
        debug!("Inserted {} into {}", product.id, self.name);

        self.by_url.insert(url, self.products.len());
        self.products.push(product);
        self.dirty = true;
        UpsertOutcome::Inserted
    }
}

pub struct CatalogService {
    store: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        info!("Created new Catalog service");
        Self { store }
    }

    /// Upserts a batch, loading and saving each collection once. With
    /// `dry_run` the outcomes are computed but nothing is written.
    pub fn upsert_all(&self, products: Vec<Product>, dry_run: bool) -> Result<UpsertCounts> {
        let mut grouped: FxHashMap<String, Vec<Product>> = FxHashMap::default();
        for product in products {
            grouped.entry(collection_for(&product)).or_default().push(product);
        }

        let mut names: Vec<String> = grouped.keys().cloned().collect();
        names.sort();

        let mut counts = UpsertCounts::default();
        for name in names {
            let batch = grouped.remove(&name).unwrap_or_default();
            let existing = self.store.load_collection(&name)?;
            let mut collection = Collection::new(name, existing);

            let mut collection_counts = UpsertCounts::default();
            for product in batch {
                collection_counts.record(collection.upsert(product));
            }

            info!(
                "{}: {} inserted, {} updated, {} unchanged",
                collection.name(),
                collection_counts.inserted,
                collection_counts.updated,
                collection_counts.unchanged
            );

            if collection.is_dirty() && !dry_run {
                self.store
                    .save_collection(collection.name(), collection.products())?;
            }

            counts.inserted += collection_counts.inserted;
            counts.updated += collection_counts.updated;
            counts.unchanged += collection_counts.unchanged;
        }

        Ok(counts)
    }
}
