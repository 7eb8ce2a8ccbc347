use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gpu,
    Cpu,
    Ram,
    Psu,
    Cooler,
    Motherboard,
}

/// Silicon vendor behind a GPU or CPU, used to split those categories into
/// separate collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipVendor {
    Nvidia,
    Amd,
    Intel,
}

impl ChipVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChipVendor::Nvidia => "nvidia",
            ChipVendor::Amd => "amd",
            ChipVendor::Intel => "intel",
        }
    }
}

fn is_vendor_collection(name: &str, prefix: &str) -> bool {
    matches!(
        name.strip_prefix(prefix),
        Some("nvidia" | "amd" | "intel" | "other")
    )
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gpu => "gpu",
            Category::Cpu => "cpu",
            Category::Ram => "ram",
            Category::Psu => "psu",
            Category::Cooler => "cooler",
            Category::Motherboard => "motherboard",
        }
    }

    /// Name of the collection a product of this category is stored in.
    ///
    /// GPUs and CPUs are split per chip vendor (`gpus_nvidia`, `cpus_amd`, ...),
    /// falling back to `<prefix>_other` when the vendor is unknown.
    pub fn collection(&self, vendor: Option<ChipVendor>) -> String {
        match self {
            Category::Gpu | Category::Cpu => {
                let prefix = if *self == Category::Gpu { "gpus" } else { "cpus" };
                let suffix = vendor.map(|v| v.as_str()).unwrap_or("other");
                format!("{}_{}", prefix, suffix)
            }
            Category::Ram => "rams".to_string(),
            Category::Psu => "psus".to_string(),
            Category::Cooler => "coolers".to_string(),
            Category::Motherboard => "motherboards".to_string(),
        }
    }

    /// Inverse of [`Category::collection`], used by purge and stats.
    pub fn from_collection(name: &str) -> Option<Category> {
        match name {
            n if is_vendor_collection(n, "gpus_") => Some(Category::Gpu),
            n if is_vendor_collection(n, "cpus_") => Some(Category::Cpu),
            "rams" => Some(Category::Ram),
            "psus" => Some(Category::Psu),
            "coolers" => Some(Category::Cooler),
            "motherboards" => Some(Category::Motherboard),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
