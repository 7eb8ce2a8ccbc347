mod fetchers;
pub(crate) mod scrapers;
mod storage;

pub use fetchers::{chrome::ChromeFetcher, http::HttpFetcher, PageFetcher};
pub use scrapers::{build_scrapers, RetailerScraper};
pub use storage::fs_store::FileSystemStore;
