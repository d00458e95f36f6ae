//! In-memory object store.
//!
//! Provides [`MemoryStore`] for tests and for deployments that do not need
//! artifacts to outlive the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::location::ObjectLocation;
use crate::store::{
    ArtifactMetadata, ObjectStore, ProbeStatus, StorageError, StorageErrorKind, StoredObject,
    is_expired,
};

const BACKEND: &str = "Memory";

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    content_type: String,
    created_at: DateTime<Utc>,
}

/// Object store backed by a hash map.
///
/// Use the builder methods to seed objects or inject failures.
///
/// # Example
///
/// ```ignore
/// use archdoc_storage::{MemoryStore, ObjectLocation, StorageErrorKind};
///
/// let store = MemoryStore::new()
///     .with_object(ObjectLocation::new("b", "diagrams/a.png"), png, "image/png")
///     .with_put_failure(StorageErrorKind::Unavailable);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectLocation, Entry>>,
    retention: Option<TimeDelta>,
    put_failure: RwLock<Option<StorageErrorKind>>,
    credentials_valid: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            retention: None,
            put_failure: RwLock::new(None),
            credentials_valid: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    /// Create a new empty store without expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire objects older than `retention`.
    #[must_use]
    pub fn with_retention(mut self, retention: TimeDelta) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Seed an object created now.
    #[must_use]
    pub fn with_object(
        self,
        location: ObjectLocation,
        bytes: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> Self {
        self.with_object_at(location, bytes, content_type, Utc::now())
    }

    /// Seed an object with an explicit creation time.
    #[must_use]
    pub fn with_object_at(
        self,
        location: ObjectLocation,
        bytes: impl Into<Vec<u8>>,
        content_type: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        self.write_objects().insert(
            location,
            Entry {
                bytes: bytes.into(),
                content_type: content_type.to_owned(),
                created_at,
            },
        );
        self
    }

    /// Make every `put` fail with the given kind.
    #[must_use]
    pub fn with_put_failure(self, kind: StorageErrorKind) -> Self {
        *self
            .put_failure
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(kind);
        self
    }

    /// Toggle whether `probe` reports valid credentials.
    pub fn set_credentials_valid(&self, valid: bool) {
        self.credentials_valid.store(valid, Ordering::SeqCst);
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.read_objects()
            .values()
            .filter(|entry| self.is_live(entry, now))
            .count()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locations of all live objects.
    pub fn locations(&self) -> Vec<ObjectLocation> {
        let now = Utc::now();
        self.read_objects()
            .iter()
            .filter(|(_, entry)| self.is_live(entry, now))
            .map(|(location, _)| location.clone())
            .collect()
    }

    fn is_live(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        self.retention
            .is_none_or(|retention| !is_expired(entry.created_at, retention, now))
    }

    /// Drop every expired entry.
    fn evict_expired(objects: &mut HashMap<ObjectLocation, Entry>, retention: TimeDelta) {
        let now = Utc::now();
        objects.retain(|_, entry| !is_expired(entry.created_at, retention, now));
    }

    fn read_objects(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<ObjectLocation, Entry>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_objects(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<ObjectLocation, Entry>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, location: &ObjectLocation) -> Result<Entry, StorageError> {
        let entry = self
            .read_objects()
            .get(location)
            .cloned()
            .ok_or_else(|| StorageError::not_found(location).with_backend(BACKEND))?;

        let now = Utc::now();
        if !self.is_live(&entry, now) {
            let mut objects = self.write_objects();
            // A concurrent put may have replaced it.
            if objects.get(location).is_some_and(|e| !self.is_live(e, now)) {
                objects.remove(location);
            }
            return Err(StorageError::not_found(location).with_backend(BACKEND));
        }

        Ok(entry)
    }
}

fn metadata(location: &ObjectLocation, entry: &Entry) -> ArtifactMetadata {
    ArtifactMetadata {
        location: location.clone(),
        content_type: entry.content_type.clone(),
        size_bytes: entry.bytes.len() as u64,
        last_modified: entry.created_at,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn put(
        &self,
        location: &ObjectLocation,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let failure = *self
            .put_failure
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(kind) = failure {
            return Err(StorageError::new(kind)
                .with_location(location)
                .with_backend(BACKEND)
                .with_source("injected failure"));
        }

        let mut objects = self.write_objects();
        if let Some(retention) = self.retention {
            Self::evict_expired(&mut objects, retention);
        }
        objects.insert(
            location.clone(),
            Entry {
                bytes,
                content_type: content_type.to_owned(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        let entry = self.lookup(location)?;
        Ok(StoredObject {
            metadata: metadata(location, &entry),
            bytes: entry.bytes,
        })
    }

    async fn head(&self, location: &ObjectLocation) -> Result<ArtifactMetadata, StorageError> {
        let entry = self.lookup(location)?;
        Ok(metadata(location, &entry))
    }

    async fn probe(&self, _bucket: &str) -> ProbeStatus {
        let valid = self.credentials_valid.load(Ordering::SeqCst);
        ProbeStatus {
            credentials_valid: valid,
            bucket_reachable: valid,
        }
    }
}
