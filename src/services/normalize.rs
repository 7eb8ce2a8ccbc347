use crate::domain::{Category, ChipVendor, Product, RawListing};
use crate::error::{Result, ScrapeError};
use crate::services::specs::extract_specs;
use crate::utils::collapse_whitespace;
use chrono::Utc;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

const LONG_TITLE_CHARS: usize = 120;

/// Board partners and component makers, checked before the chip vendors so
/// that "ASUS GeForce RTX 4070" is attributed to ASUS.
const BRANDS: &[(&str, &str)] = &[
    (r"asus|rog strix|tuf gaming", "ASUS"),
    (r"msi", "MSI"),
    (r"gigabyte|aorus", "Gigabyte"),
    (r"evga", "EVGA"),
    (r"zotac", "Zotac"),
    (r"sapphire", "Sapphire"),
    (r"powercolor", "PowerColor"),
    (r"xfx", "XFX"),
    (r"asrock", "ASRock"),
    (r"pny", "PNY"),
    (r"palit", "Palit"),
    (r"gainward", "Gainward"),
    (r"inno3d", "Inno3D"),
    (r"corsair", "Corsair"),
    (r"g\.?\s?skill", "G.Skill"),
    (r"kingston|fury beast", "Kingston"),
    (r"crucial", "Crucial"),
    (r"team\s?group|t-force", "TeamGroup"),
    (r"patriot", "Patriot"),
    (r"seasonic", "Seasonic"),
    (r"be quiet!?", "be quiet!"),
    (r"noctua", "Noctua"),
    (r"cooler master", "Cooler Master"),
    (r"nzxt", "NZXT"),
    (r"arctic", "Arctic"),
    (r"deepcool", "Deepcool"),
    (r"thermaltake", "Thermaltake"),
    (r"lian li", "Lian Li"),
    (r"ekwb|ek-", "EKWB"),
    (r"super flower", "Super Flower"),
    (r"fsp", "FSP"),
    (r"silverstone", "SilverStone"),
    (r"biostar", "Biostar"),
];

const CHIP_BRANDS: &[(&str, &str)] = &[
    (r"intel", "Intel"),
    (r"amd", "AMD"),
    (r"nvidia", "NVIDIA"),
];

struct BrandPattern {
    regex: Regex,
    name: &'static str,
}

fn compile_brands(table: &[(&str, &'static str)]) -> Vec<BrandPattern> {
    table
        .iter()
        .map(|(pattern, name)| BrandPattern {
            // `be quiet!` ends in a non-word char, so only the start is anchored
            regex: Regex::new(&format!(r"(?i)\b(?:{})(?:\b|$|\s)", pattern)).unwrap(),
            name: *name,
        })
        .collect()
}

static BRAND_PATTERNS: Lazy<Vec<BrandPattern>> = Lazy::new(|| compile_brands(BRANDS));
static CHIP_BRAND_PATTERNS: Lazy<Vec<BrandPattern>> = Lazy::new(|| compile_brands(CHIP_BRANDS));

static TRADEMARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[®™©]|\((?i:r|tm)\)").unwrap());
static LONG_TITLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*|\s+-\s+").unwrap());

static NVIDIA_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(nvidia|geforce|rtx|gtx|quadro)\b").unwrap());
static AMD_GPU_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(amd|radeon|rx\s?\d{3,4})\b").unwrap());
static INTEL_GPU_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(intel|arc\s?[ab]\d{3})\b").unwrap());
static AMD_CPU_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(amd|ryzen|threadripper|athlon|epyc)\b").unwrap());
static INTEL_CPU_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(intel|core\s?i[3579]|i[3579]-\d{4,5}|core\s?ultra|xeon|pentium|celeron)\b")
        .unwrap()
});

/// Cleans an Amazon-style product title for display and matching.
pub fn clean_title(raw: &str) -> String {
    // Before NFKC, which would turn ™ into "TM"
    let stripped = TRADEMARKS.replace_all(raw, "");
    let nfkc: String = stripped.nfkc().collect();
    let mut title = collapse_whitespace(&nfkc);

    if title.chars().count() > LONG_TITLE_CHARS {
        let cut = LONG_TITLE_SEPARATOR
            .find_iter(&title)
            .map(|m| m.start())
            .find(|&start| title[..start].chars().count() >= LONG_TITLE_CHARS);
        if let Some(cut) = cut {
            title.truncate(cut);
        }
    }

    title
        .trim_end_matches(|c: char| c.is_whitespace() || ",;:|-/".contains(c))
        .to_string()
}

fn earliest_match(patterns: &[BrandPattern], text: &str) -> Option<&'static str> {
    patterns
        .iter()
        .filter_map(|p| p.regex.find(text).map(|m| (m.start(), p.name)))
        .min_by_key(|(start, _)| *start)
        .map(|(_, name)| name)
}

/// The brand hint (Amazon byline, retailer brand field) wins when present.
/// Known spellings of the hint are mapped to their canonical form.
pub fn detect_manufacturer(title: &str, brand_hint: Option<&str>) -> Option<String> {
    if let Some(hint) = brand_hint.map(str::trim).filter(|h| !h.is_empty()) {
        let canonical = earliest_match(&BRAND_PATTERNS, hint)
            .or_else(|| earliest_match(&CHIP_BRAND_PATTERNS, hint));
        return Some(canonical.map(str::to_string).unwrap_or_else(|| hint.to_string()));
    }

    earliest_match(&BRAND_PATTERNS, title)
        .or_else(|| earliest_match(&CHIP_BRAND_PATTERNS, title))
        .map(str::to_string)
}

/// Chip vendor used to pick the GPU/CPU collection. Other categories have none.
pub fn chip_vendor(category: Category, title: &str) -> Option<ChipVendor> {
    match category {
        Category::Gpu => {
            if NVIDIA_MARKERS.is_match(title) {
                Some(ChipVendor::Nvidia)
            } else if AMD_GPU_MARKERS.is_match(title) {
                Some(ChipVendor::Amd)
            } else if INTEL_GPU_MARKERS.is_match(title) {
                Some(ChipVendor::Intel)
            } else {
                None
            }
        }
        Category::Cpu => {
            if AMD_CPU_MARKERS.is_match(title) {
                Some(ChipVendor::Amd)
            } else if INTEL_CPU_MARKERS.is_match(title) {
                Some(ChipVendor::Intel)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn valid_price(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Turns a raw listing into a product ready for upsert.
///
/// A quote with a list price above the current price becomes
/// `base_price = list, sale_price = current`; otherwise the current price is
/// the base price. Unusable prices are dropped rather than stored.
pub fn normalize_listing(listing: &RawListing, category: Category) -> Result<Product> {
    let name = clean_title(&listing.title);
    if name.is_empty() {
        return Err(ScrapeError::Parse(format!(
            "empty title for listing {}",
            listing.url
        )));
    }

    let (base_price, sale_price, currency) = match &listing.price {
        Some(quote) => {
            let current = valid_price(quote.current);
            let list = quote.list.and_then(valid_price);
            match (current, list) {
                (Some(current), Some(list)) if list > current => {
                    (Some(list), Some(current), quote.currency.clone())
                }
                (current, _) => (current, None, quote.currency.clone()),
            }
        }
        None => (None, None, "USD".to_string()),
    };

    let now = Utc::now();
    Ok(Product {
        id: 0,
        manufacturer: detect_manufacturer(&name, listing.brand.as_deref()),
        specs: extract_specs(category, &name),
        name,
        category,
        base_price,
        sale_price,
        currency,
        source_url: listing.url.clone(),
        image_url: listing.image_url.clone(),
        retailer: listing.retailer.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Normalizes a batch in parallel, dropping listings that fail.
///
/// With `require_price`, listings without a usable price are dropped too.
pub fn normalize_all(listings: &[(Category, RawListing)], require_price: bool) -> Vec<Product> {
    let products: Vec<Product> = listings
        .par_iter()
        .filter_map(|(category, listing)| match normalize_listing(listing, *category) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!("Skipping listing: {}", e);
                None
            }
        })
        .filter(|product| !require_price || product.base_price.is_some())
        .collect();

    info!(
        "Normalized {} of {} listings",
        products.len(),
        listings.len()
    );
    products
}
