mod category;
mod listing;
mod product;
mod run;
pub(crate) mod storage;

pub use category::{Category, ChipVendor};
pub use listing::{PriceQuote, PriceStrategy, RawListing};
pub use product::{
    CoolerKind, CoolerSpecs, CpuSpecs, GpuSpecs, MotherboardSpecs, Product, PsuSpecs, RamSpecs,
    Specs,
};
pub use run::RunSummary;
