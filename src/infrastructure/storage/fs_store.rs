use crate::domain::storage::{ProductStore, StorageKeys};
use crate::domain::{Product, RunSummary};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores every collection as one pretty-printed JSON array under
/// `<data_dir>/collections/<name>.json`.
#[derive(Clone)]
pub struct FileSystemStore {
    data_dir: PathBuf,
}

impl FileSystemStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn collections_dir(&self) -> PathBuf {
        self.data_dir.join(StorageKeys::COLLECTIONS_DIR)
    }

    fn get_path_for_key(&self, key: &str, subdir: &str) -> PathBuf {
        self.data_dir.join(subdir).join(format!("{}.json", key))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn write_json_file<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        subdir: &str,
        data: &T,
    ) -> Result<()> {
        self.ensure_dir(&self.data_dir.join(subdir))?;

        let path = self.get_path_for_key(key, subdir);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(data)?;

        // Readers only ever see a complete file.
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn read_json_file<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        subdir: &str,
    ) -> Result<Option<T>> {
        let path = self.get_path_for_key(key, subdir);
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(Some(serde_json::from_str(&content)?))
        } else {
            Ok(None)
        }
    }
}

impl ProductStore for FileSystemStore {
    fn load_collection(&self, name: &str) -> Result<Vec<Product>> {
        Ok(self
            .read_json_file(name, StorageKeys::COLLECTIONS_DIR)?
            .unwrap_or_default())
    }

    fn save_collection(&self, name: &str, products: &[Product]) -> Result<()> {
        self.write_json_file(name, StorageKeys::COLLECTIONS_DIR, products)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let dir = self.collections_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn drop_collection(&self, name: &str) -> Result<bool> {
        let path = self.get_path_for_key(name, StorageKeys::COLLECTIONS_DIR);
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn save_run_summary(&self, summary: &RunSummary) -> Result<()> {
        let key = format!("run_{}", summary.started_at.timestamp());
        self.write_json_file(&key, StorageKeys::RUNS_DIR, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, RamSpecs, Specs};
    use chrono::Utc;
    use tempfile::TempDir;

    fn ram(id: u64, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            manufacturer: Some("G.Skill".to_string()),
            category: Category::Ram,
            base_price: Some(89.99),
            sale_price: None,
            currency: "USD".to_string(),
            source_url: format!("https://www.amazon.com/dp/B0{:08}", id),
            image_url: None,
            retailer: "amazon".to_string(),
            specs: Specs::Ram(RamSpecs::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());

        assert!(store.load_collection("rams").unwrap().is_empty());
        assert!(store.list_collections().unwrap().is_empty());
        assert!(!store.drop_collection("rams").unwrap());
    }

    #[test]
    fn test_save_load_list_drop() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());

        store
            .save_collection("rams", &[ram(1, "Trident Z5 32GB"), ram(2, "Ripjaws V 16GB")])
            .unwrap();
        store.save_collection("psus", &[]).unwrap();

        let loaded = store.load_collection("rams").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].name, "Ripjaws V 16GB");

        assert_eq!(store.list_collections().unwrap(), vec!["psus", "rams"]);

        assert!(store.drop_collection("rams").unwrap());
        assert_eq!(store.list_collections().unwrap(), vec!["psus"]);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());
        store.save_collection("rams", &[ram(1, "Vengeance 32GB")]).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path().join(StorageKeys::COLLECTIONS_DIR))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_run_summary_written() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path());
        let mut summary = RunSummary::start(false);
        summary.finish();
        store.save_run_summary(&summary).unwrap();

        let runs: Vec<_> = fs::read_dir(dir.path().join(StorageKeys::RUNS_DIR))
            .unwrap()
            .collect();
        assert_eq!(runs.len(), 1);
    }
}
