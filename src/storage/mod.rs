//! Single-slot dataset storage
//!
//! Holds at most one [`DatasetRecord`] as a JSON file. Every save replaces the
//! file wholesale; clear removes it. Writes land in a temporary sibling first
//! and are renamed over the slot, and all operations share one async lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::DatasetRecord;
use crate::types::{AppError, AppResult};

const DATASET_FILE: &str = "current_dataset.json";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Clone)]
pub struct DatasetStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DatasetStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(DATASET_FILE),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    /// Overwrite the slot with `record`.
    pub async fn save(&self, record: &DatasetRecord) -> AppResult<()> {
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec(record)
            .map_err(|e| AppError::StorageFailure(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!(rows = record.rows, "Saved dataset to {:?}", self.path);
        Ok(())
    }

    /// `Ok(None)` when nothing has been uploaded (or it was cleared).
    pub async fn load(&self) -> AppResult<Option<DatasetRecord>> {
        let _guard = self.lock.lock().await;

        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No dataset file at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_slice(&content).map_err(|e| {
            AppError::StorageFailure(format!("stored dataset is corrupt: {}", e))
        })?;
        Ok(Some(record))
    }

    /// Remove the slot. Succeeds whether or not a dataset existed.
    pub async fn clear(&self) -> AppResult<()> {
        let _guard = self.lock.lock().await;

        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Cleared dataset at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, Row};
    use tempfile::TempDir;

    fn sample_record(filename: &str) -> DatasetRecord {
        DatasetRecord {
            success: true,
            message: "File uploaded successfully".to_string(),
            filename: filename.to_string(),
            rows: 1,
            columns: vec!["Year".to_string(), "Police Station".to_string()],
            data: vec![Row::new(vec![
                ("Year".to_string(), CellValue::Integer(2023)),
                ("Police Station".to_string(), CellValue::empty()),
            ])],
        }
    }

    #[tokio::test]
    async fn test_dataset_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::new(temp_dir.path().join("nested"));

        assert!(store.load().await.unwrap().is_none());

        let record = sample_record("crimes.csv");
        store.save(&record).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::new(temp_dir.path());

        store.save(&sample_record("first.csv")).await.unwrap();
        store.save(&sample_record("second.xlsx")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.filename, "second.xlsx");
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::new(temp_dir.path());

        store.save(&sample_record("crimes.csv")).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::new(temp_dir.path());
        std::fs::write(store.path(), b"{not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }
}
