//! Per-device "already submitted" flag.
//!
//! This is the equivalent of a browser's local storage: it lives with the
//! device, not with the data. Clearing it or switching devices allows another
//! submission, and nothing at the data layer prevents that.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use dashmap::DashMap;
use moka::sync::Cache;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// String key/value store scoped to one device.
pub trait DeviceStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage key guarding repeat submissions of `form_id`.
pub fn submission_key(form_id: Uuid) -> String {
    format!("submitted_{}", form_id)
}

pub struct SubmissionGuard<'a> {
    storage: &'a dyn DeviceStorage,
}

impl<'a> SubmissionGuard<'a> {
    pub fn new(storage: &'a dyn DeviceStorage) -> Self {
        Self { storage }
    }

    pub fn has_submitted(&self, form_id: Uuid) -> bool {
        self.storage.get_item(&submission_key(form_id)).is_some()
    }

    pub fn mark_submitted(&self, form_id: Uuid) -> Result<(), StorageError> {
        self.storage.set_item(&submission_key(form_id), "true")
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equivalent of clearing site data.
    pub fn clear(&self) {
        self.items.clear();
    }
}

impl DeviceStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|v| v.value().clone())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// JSON object on disk, for clients that run as a single device.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => serde_json::from_str(&contents)?,
            Ok(_) => BTreeMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "Opened device storage");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(items)?)?;
        Ok(())
    }
}

impl DeviceStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        if items.remove(key).is_some() {
            self.persist(&items)?;
        }
        Ok(())
    }
}

/// Devices remembered at once before the least useful are evicted.
pub const DEFAULT_DEVICE_CAPACITY: u64 = 10_000;
/// A device that has not been seen for this long is forgotten.
pub const DEFAULT_DEVICE_IDLE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// In-memory storage per device identifier, bounded in size and idle time.
/// Reads never create an entry; only a write does.
#[derive(Clone)]
pub struct DeviceRegistry {
    devices: Cache<String, Arc<MemoryStorage>>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_DEVICE_CAPACITY, DEFAULT_DEVICE_IDLE)
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_devices: u64, time_to_idle: Duration) -> Self {
        Self {
            devices: Cache::builder()
                .max_capacity(max_devices)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// Handle for `device_id`. Creating it allocates nothing.
    pub fn device(&self, device_id: &str) -> RegisteredDevice {
        RegisteredDevice {
            devices: self.devices.clone(),
            device_id: device_id.to_string(),
        }
    }

    pub fn device_count(&self) -> u64 {
        self.devices.run_pending_tasks();
        self.devices.entry_count()
    }
}

/// One device's view of a [`DeviceRegistry`].
pub struct RegisteredDevice {
    devices: Cache<String, Arc<MemoryStorage>>,
    device_id: String,
}

impl DeviceStorage for RegisteredDevice {
    fn get_item(&self, key: &str) -> Option<String> {
        self.devices.get(&self.device_id)?.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.devices
            .get_with(self.device_id.clone(), || Arc::new(MemoryStorage::new()))
            .set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match self.devices.get(&self.device_id) {
            Some(storage) => storage.remove_item(key),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_local_storage_convention() {
        let id = Uuid::nil();
        assert_eq!(
            submission_key(id),
            "submitted_00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn guard_is_scoped_to_storage() {
        let form = Uuid::new_v4();
        let phone = MemoryStorage::new();
        let laptop = MemoryStorage::new();

        SubmissionGuard::new(&phone).mark_submitted(form).unwrap();

        assert!(SubmissionGuard::new(&phone).has_submitted(form));
        assert!(!SubmissionGuard::new(&laptop).has_submitted(form));
        assert!(!SubmissionGuard::new(&phone).has_submitted(Uuid::new_v4()));

        phone.clear();
        assert!(!SubmissionGuard::new(&phone).has_submitted(form));
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device").join("storage.json");
        let form = Uuid::new_v4();

        {
            let storage = FileStorage::open(&path).unwrap();
            SubmissionGuard::new(&storage).mark_submitted(form).unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get_item(&submission_key(form)).as_deref(),
            Some("true")
        );
        reopened.remove_item(&submission_key(form)).unwrap();
        assert!(!SubmissionGuard::new(&reopened).has_submitted(form));
    }

    #[test]
    fn registry_reuses_device_storage() {
        let registry = DeviceRegistry::new();
        let form = Uuid::new_v4();
        SubmissionGuard::new(&registry.device("device-a"))
            .mark_submitted(form)
            .unwrap();

        assert!(SubmissionGuard::new(&registry.device("device-a")).has_submitted(form));
        assert!(!SubmissionGuard::new(&registry.device("device-b")).has_submitted(form));
    }

    #[test]
    fn reads_do_not_register_devices() {
        let registry = DeviceRegistry::new();
        let form = Uuid::new_v4();

        for i in 0..100 {
            let device = registry.device(&format!("reader-{i}"));
            assert!(!SubmissionGuard::new(&device).has_submitted(form));
            device.remove_item(&submission_key(form)).unwrap();
        }
        assert_eq!(registry.device_count(), 0);

        SubmissionGuard::new(&registry.device("writer"))
            .mark_submitted(form)
            .unwrap();
        assert_eq!(registry.device_count(), 1);
    }

    #[test]
    fn registry_is_bounded() {
        let registry = DeviceRegistry::with_limits(10, DEFAULT_DEVICE_IDLE);
        let form = Uuid::new_v4();
        for i in 0..200 {
            SubmissionGuard::new(&registry.device(&format!("device-{i}")))
                .mark_submitted(form)
                .unwrap();
        }
        assert!(registry.device_count() <= 10);
    }
}
