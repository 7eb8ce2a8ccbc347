use super::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Assigned by the catalog on insert; zero until then.
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<f64>,
    pub currency: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub retailer: String,
    pub specs: Specs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A price, if present, must be a positive finite number, and a sale price
    /// only makes sense below the base price.
    pub fn has_valid_price(&self) -> bool {
        let positive = |p: Option<f64>| p.map_or(true, |v| v.is_finite() && v > 0.0);

        if !positive(self.base_price) || !positive(self.sale_price) {
            return false;
        }

        match (self.base_price, self.sale_price) {
            (Some(base), Some(sale)) => sale < base,
            (None, Some(_)) => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Specs {
    Gpu(GpuSpecs),
    Cpu(CpuSpecs),
    Ram(RamSpecs),
    Psu(PsuSpecs),
    Cooler(CoolerSpecs),
    Motherboard(MotherboardSpecs),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuSpecs {
    pub vram_gb: Option<u32>,
    pub memory_type: Option<String>,
    pub chipset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSpecs {
    pub socket: Option<String>,
    pub cores: Option<u32>,
    pub threads: Option<u32>,
    pub base_clock_ghz: Option<f64>,
    pub boost_clock_ghz: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RamSpecs {
    pub capacity_gb: Option<u32>,
    pub modules: Option<u32>,
    pub ddr: Option<String>,
    pub speed_mts: Option<u32>,
    pub cas_latency: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PsuSpecs {
    pub wattage: Option<u32>,
    pub certification: Option<String>,
    pub modular: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoolerKind {
    Air,
    Liquid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoolerSpecs {
    pub kind: Option<CoolerKind>,
    pub radiator_mm: Option<u32>,
    #[serde(default)]
    pub sockets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotherboardSpecs {
    pub socket: Option<String>,
    pub chipset: Option<String>,
    pub form_factor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(base: Option<f64>, sale: Option<f64>) -> Product {
        Product {
            id: 0,
            name: "Corsair RM850x".to_string(),
            manufacturer: Some("Corsair".to_string()),
            category: Category::Psu,
            base_price: base,
            sale_price: sale,
            currency: "USD".to_string(),
            source_url: "https://www.amazon.com/dp/B08R5JQHNQ".to_string(),
            image_url: None,
            retailer: "amazon".to_string(),
            specs: Specs::Psu(PsuSpecs::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_invariant() {
        assert!(product(Some(129.99), None).has_valid_price());
        assert!(product(Some(149.99), Some(129.99)).has_valid_price());
        assert!(product(None, None).has_valid_price());
        assert!(!product(Some(0.0), None).has_valid_price());
        assert!(!product(Some(-5.0), None).has_valid_price());
        assert!(!product(Some(99.0), Some(120.0)).has_valid_price());
        assert!(!product(None, Some(10.0)).has_valid_price());
        assert!(!product(Some(f64::NAN), None).has_valid_price());
    }

    #[test]
    fn test_specs_serialize_with_kind_tag() {
        let specs = Specs::Gpu(GpuSpecs {
            vram_gb: Some(12),
            memory_type: Some("GDDR6X".to_string()),
            chipset: Some("RTX 4070".to_string()),
        });
        let json = serde_json::to_value(&specs).unwrap();
        assert_eq!(json["kind"], "gpu");
        assert_eq!(json["vram_gb"], 12);

        let back: Specs = serde_json::from_value(json).unwrap();
        assert_eq!(back, specs);
    }
}
