//! Filesystem object store.
//!
//! Stores each object at `root/bucket/key` with a JSON sidecar
//! (`<key>.meta.json`) holding the content type and creation time.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::location::ObjectLocation;
use crate::store::{
    ArtifactMetadata, ObjectStore, ProbeStatus, StorageError, StorageErrorKind, StoredObject,
    is_expired,
};

const BACKEND: &str = "Fs";

/// Suffix appended to object paths for the metadata sidecar.
const META_SUFFIX: &str = ".meta.json";

/// Sidecar contents.
#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    created_at: DateTime<Utc>,
}

/// Object store rooted at a local directory.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    retention: Option<TimeDelta>,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retention: None,
        }
    }

    /// Expire objects older than `retention`.
    #[must_use]
    pub fn with_retention(mut self, retention: TimeDelta) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location to its object path, rejecting traversal.
    fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf, StorageError> {
        let bucket = Path::new(location.bucket());
        let key = Path::new(location.key());
        let safe = |p: &Path| p.components().all(|c| matches!(c, Component::Normal(_)));

        if !safe(bucket) || bucket.components().count() != 1 || !safe(key) {
            return Err(StorageError::new(StorageErrorKind::InvalidLocation)
                .with_location(location)
                .with_backend(BACKEND));
        }

        Ok(self.root.join(bucket).join(key))
    }

    fn error(err: std::io::Error, location: &ObjectLocation) -> StorageError {
        StorageError::io(err, location).with_backend(BACKEND)
    }

    async fn read_metadata(
        &self,
        location: &ObjectLocation,
    ) -> Result<(PathBuf, ArtifactMetadata), StorageError> {
        let path = self.object_path(location)?;
        let sidecar_raw = fs::read(sidecar_path(&path))
            .await
            .map_err(|e| Self::error(e, location))?;
        let sidecar: Sidecar = serde_json::from_slice(&sidecar_raw).map_err(|e| {
            StorageError::new(StorageErrorKind::Other)
                .with_location(location)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        if let Some(retention) = self.retention
            && is_expired(sidecar.created_at, retention, Utc::now())
        {
            return Err(StorageError::not_found(location).with_backend(BACKEND));
        }

        let size_bytes = fs::metadata(&path)
            .await
            .map_err(|e| Self::error(e, location))?
            .len();

        Ok((
            path,
            ArtifactMetadata {
                location: location.clone(),
                content_type: sidecar.content_type,
                size_bytes,
                last_modified: sidecar.created_at,
            },
        ))
    }
}

fn sidecar_path(object_path: &Path) -> PathBuf {
    let mut name = object_path.as_os_str().to_owned();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

/// Write through a temporary file so readers never see partial content.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

async fn write_sidecar(
    path: &Path,
    content_type: &str,
    location: &ObjectLocation,
) -> Result<(), StorageError> {
    let sidecar = Sidecar {
        content_type: content_type.to_owned(),
        created_at: Utc::now(),
    };
    let sidecar_json = serde_json::to_vec(&sidecar).map_err(|e| {
        StorageError::new(StorageErrorKind::Other)
            .with_location(location)
            .with_backend(BACKEND)
            .with_source(e)
    })?;
    write_atomic(&sidecar_path(path), &sidecar_json)
        .await
        .map_err(|e| FsStore::error(e, location))
}

#[async_trait]
impl ObjectStore for FsStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn put(
        &self,
        location: &ObjectLocation,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(location)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::error(e, location))?;
        }

        write_atomic(&path, &bytes)
            .await
            .map_err(|e| Self::error(e, location))?;

        // Objects without a sidecar are unreadable.
        if let Err(err) = write_sidecar(&path, content_type, location).await {
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove object after sidecar error");
            }
            return Err(err);
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        let (path, metadata) = self.read_metadata(location).await?;
        let bytes = fs::read(&path)
            .await
            .map_err(|e| Self::error(e, location))?;
        Ok(StoredObject { metadata, bytes })
    }

    async fn head(&self, location: &ObjectLocation) -> Result<ArtifactMetadata, StorageError> {
        self.read_metadata(location)
            .await
            .map(|(_, metadata)| metadata)
    }

    async fn probe(&self, bucket: &str) -> ProbeStatus {
        let bucket_dir = self.root.join(bucket);
        let bucket_reachable = fs::create_dir_all(&bucket_dir).await.is_ok();
        ProbeStatus {
            credentials_valid: true,
            bucket_reachable,
        }
    }
}
