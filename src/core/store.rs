use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::target::{MonitoredTarget, TargetUpdate};
use crate::error::{PagesentryError, Result};

/// Persistence boundary for monitored targets.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All records eligible for scheduling (URL source, monitoring enabled)
    async fn list_monitored_targets(&self) -> Result<Vec<MonitoredTarget>>;

    /// Merge partial fields into the stored record; `None` when the id is
    /// unknown
    async fn update_target(
        &self,
        id: &str,
        update: TargetUpdate,
    ) -> Result<Option<MonitoredTarget>>;
}

/// In-process store used by tests and the manual trigger path.
#[derive(Default)]
pub struct MemoryStore {
    targets: Mutex<BTreeMap<String, MonitoredTarget>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, target: MonitoredTarget) {
        self.targets
            .lock()
            .expect("target map lock poisoned")
            .insert(target.id.clone(), target);
    }

    pub fn get(&self, id: &str) -> Option<MonitoredTarget> {
        self.targets
            .lock()
            .expect("target map lock poisoned")
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_monitored_targets(&self) -> Result<Vec<MonitoredTarget>> {
        let targets = self.targets.lock().expect("target map lock poisoned");
        Ok(targets
            .values()
            .filter(|t| t.is_schedulable())
            .cloned()
            .collect())
    }

    async fn update_target(
        &self,
        id: &str,
        update: TargetUpdate,
    ) -> Result<Option<MonitoredTarget>> {
        let mut targets = self.targets.lock().expect("target map lock poisoned");
        match targets.get_mut(id) {
            Some(target) => {
                update.apply(target);
                Ok(Some(target.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Flat-file JSON store backing the CLI daemon. Real deployments
/// substitute their own `DataStore` implementation behind the trait.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes load-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn insert(&self, target: MonitoredTarget) -> Result<()> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        let mut targets = self.load_all()?;
        targets.retain(|t| t.id != target.id);
        targets.push(target);
        self.save_all(&targets)
    }

    fn load_all(&self) -> Result<Vec<MonitoredTarget>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| PagesentryError::Persistence(format!("read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| PagesentryError::Persistence(format!("parse {}: {}", self.path.display(), e)))
    }

    fn save_all(&self, targets: &[MonitoredTarget]) -> Result<()> {
        let content = serde_json::to_string_pretty(targets)
            .map_err(|e| PagesentryError::Persistence(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| PagesentryError::Persistence(format!("write {}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl DataStore for JsonFileStore {
    async fn list_monitored_targets(&self) -> Result<Vec<MonitoredTarget>> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|t| t.is_schedulable())
            .collect())
    }

    async fn update_target(
        &self,
        id: &str,
        update: TargetUpdate,
    ) -> Result<Option<MonitoredTarget>> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        let mut targets = self.load_all()?;
        let Some(target) = targets.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        update.apply(target);
        let updated = target.clone();
        self.save_all(&targets)?;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::{SourceType, TargetStatus};

    #[tokio::test]
    async fn test_memory_store_lists_only_schedulable_targets() {
        let store = MemoryStore::new();
        store.insert(MonitoredTarget::new("url-target", "https://example.com/a"));

        let mut disabled = MonitoredTarget::new("disabled", "https://example.com/b");
        disabled.monitoring_enabled = false;
        store.insert(disabled);

        let mut pdf = MonitoredTarget::new("pdf-upload", "https://example.com/c.pdf");
        pdf.source_type = SourceType::Pdf;
        store.insert(pdf);

        let listed = store.list_monitored_targets().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "url-target");
    }

    #[tokio::test]
    async fn test_memory_store_update_unknown_id_is_none() {
        let store = MemoryStore::new();
        let result = store
            .update_target("missing", TargetUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_json_store_round_trip_and_partial_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("targets.json"));

        let mut target = MonitoredTarget::new("t1", "https://example.com/terms");
        target.stable_count = 3;
        store.insert(target).unwrap();

        let update = TargetUpdate {
            stable_count: Some(4),
            status: Some(TargetStatus::NeedsReview),
            ..Default::default()
        };
        let updated = store.update_target("t1", update).await.unwrap().unwrap();
        assert_eq!(updated.stable_count, 4);
        assert_eq!(updated.status, TargetStatus::NeedsReview);

        // Reload from disk through a fresh store instance
        let reopened = JsonFileStore::new(dir.path().join("targets.json"));
        let listed = reopened.list_monitored_targets().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stable_count, 4);
        assert_eq!(listed[0].source_url, "https://example.com/terms");
    }

    #[tokio::test]
    async fn test_json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nothing-here.json"));
        assert!(store.list_monitored_targets().await.unwrap().is_empty());
        assert!(store
            .update_target("t1", TargetUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}
