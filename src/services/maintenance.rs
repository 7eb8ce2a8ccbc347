use crate::domain::storage::ProductStore;
use crate::domain::Category;
use crate::error::{Result, ScrapeError};
use std::sync::Arc;
use tracing::{info, warn};

/// What to purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeTarget {
    Collection(String),
    All,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub collections_dropped: usize,
    pub records_removed: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CollectionStats {
    pub name: String,
    pub documents: usize,
    pub invalid_prices: usize,
}

pub struct MaintenanceService {
    store: Arc<dyn ProductStore>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        info!("Created new Maintenance service");
        Self { store }
    }

    fn targets(&self, target: &PurgeTarget) -> Result<Vec<String>> {
        match target {
            PurgeTarget::All => self.store.list_collections(),
            PurgeTarget::Collection(name) => {
                if Category::from_collection(name).is_none() {
                    return Err(ScrapeError::Config(format!(
                        "'{}' is not a catalog collection",
                        name
                    )));
                }
                Ok(vec![name.clone()])
            }
        }
    }

    /// Drops whole collections, or with `invalid_only` rewrites them keeping
    /// only records whose prices are positive and consistent.
    pub fn purge(&self, target: &PurgeTarget, invalid_only: bool) -> Result<PurgeReport> {
        let mut report = PurgeReport::default();

        for name in self.targets(target)? {
            if !invalid_only {
                if self.store.drop_collection(&name)? {
                    info!("Dropped collection {}", name);
                    report.collections_dropped += 1;
                } else {
                    warn!("Collection {} does not exist", name);
                }
                continue;
            }

            let mut products = self.store.load_collection(&name)?;
            let before = products.len();
            products.retain(|p| p.has_valid_price());
            let removed = before - products.len();

            if removed > 0 {
                self.store.save_collection(&name, &products)?;
            }
            info!("Removed {} invalid records from {}", removed, name);
            report.records_removed += removed;
        }

        Ok(report)
    }

    pub fn stats(&self) -> Result<Vec<CollectionStats>> {
        self.store
            .list_collections()?
            .into_iter()
            .map(|name| -> Result<CollectionStats> {
                let products = self.store.load_collection(&name)?;
                Ok(CollectionStats {
                    documents: products.len(),
                    invalid_prices: products.iter().filter(|p| !p.has_valid_price()).count(),
                    name,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoolerSpecs, Product, Specs};
    use crate::infrastructure::FileSystemStore;
    use chrono::Utc;
    use tempfile::TempDir;

    fn cooler(id: u64, base: Option<f64>, sale: Option<f64>) -> Product {
        Product {
            id,
            name: format!("Cooler {}", id),
            manufacturer: None,
            category: Category::Cooler,
            base_price: base,
            sale_price: sale,
            currency: "USD".to_string(),
            source_url: format!("https://example.com/{}", id),
            image_url: None,
            retailer: "amazon".to_string(),
            specs: Specs::Cooler(CoolerSpecs::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn seeded() -> (TempDir, Arc<dyn ProductStore>) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn ProductStore> = Arc::new(FileSystemStore::new(dir.path()));
        store
            .save_collection(
                "coolers",
                &[
                    cooler(1, Some(34.9), None),
                    cooler(2, Some(0.0), None),
                    cooler(3, Some(50.0), Some(60.0)),
                    cooler(4, None, None),
                ],
            )
            .unwrap();
        store
            .save_collection("psus", &[cooler(5, Some(99.0), None)])
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_purge_invalid_only() {
        let (_dir, store) = seeded();
        let service = MaintenanceService::new(store.clone());

        let report = service
            .purge(&PurgeTarget::Collection("coolers".to_string()), true)
            .unwrap();
        assert_eq!(report.records_removed, 2);
        assert_eq!(report.collections_dropped, 0);

        let ids: Vec<u64> = store
            .load_collection("coolers")
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_purge_all() {
        let (_dir, store) = seeded();
        let service = MaintenanceService::new(store.clone());

        let report = service.purge(&PurgeTarget::All, false).unwrap();
        assert_eq!(report.collections_dropped, 2);
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_purge_rejects_unknown_collection() {
        let (_dir, store) = seeded();
        let service = MaintenanceService::new(store);

        assert!(matches!(
            service.purge(&PurgeTarget::Collection("../etc".to_string()), false),
            Err(ScrapeError::Config(_))
        ));
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = seeded();
        let stats = MaintenanceService::new(store).stats().unwrap();

        assert_eq!(
            stats,
            vec![
                CollectionStats {
                    name: "coolers".to_string(),
                    documents: 4,
                    invalid_prices: 2,
                },
                CollectionStats {
                    name: "psus".to_string(),
                    documents: 1,
                    invalid_prices: 0,
                },
            ]
        );
    }
}
