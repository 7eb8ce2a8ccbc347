use super::{Product, RunSummary};
use crate::error::Result;

/// Document persistence for the catalog. Each collection is a flat list of
/// products; there is no schema beyond the record type.
pub trait ProductStore: Send + Sync {
    fn load_collection(&self, name: &str) -> Result<Vec<Product>>;
    fn save_collection(&self, name: &str, products: &[Product]) -> Result<()>;
    fn list_collections(&self) -> Result<Vec<String>>;
    /// Returns whether the collection existed.
    fn drop_collection(&self, name: &str) -> Result<bool>;
    fn save_run_summary(&self, summary: &RunSummary) -> Result<()>;
}

pub struct StorageKeys;

impl StorageKeys {
    pub const COLLECTIONS_DIR: &'static str = "collections";
    pub const RUNS_DIR: &'static str = "runs";
}
