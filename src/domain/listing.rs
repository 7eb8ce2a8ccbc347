use serde::{Deserialize, Serialize};

/// Which selector strategy produced a price. Lower variants are tried first
/// and win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceStrategy {
    PriceToPay,
    CorePrice,
    LegacyBlock,
    SplitPrice,
    AnyOffscreen,
    /// Price read off a search result card or a configured selector cascade.
    Listing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub current: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<f64>,
    pub currency: String,
    pub strategy: PriceStrategy,
}

/// A listing as read off a retailer page, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub price: Option<PriceQuote>,
    pub retailer: String,
}
