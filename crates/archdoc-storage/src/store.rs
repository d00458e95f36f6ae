//! Object store trait and error types.
//!
//! Provides the core [`ObjectStore`] trait for persisting rendered artifacts,
//! along with [`StorageError`] for unified error handling across backends.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::location::ObjectLocation;

/// Storage metadata of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    /// Where the artifact lives.
    pub location: ObjectLocation,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Creation time; artifacts are never modified in place.
    pub last_modified: DateTime<Utc>,
}

/// Artifact bytes together with their metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub metadata: ArtifactMetadata,
    pub bytes: Vec<u8>,
}

/// Result of probing a bucket for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStatus {
    /// The backend accepted our credentials.
    pub credentials_valid: bool,
    /// The bucket exists and is accessible.
    pub bucket_reachable: bool,
}

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Object or bucket does not exist.
    NotFound,
    /// Credentials missing or not authorized.
    PermissionDenied,
    /// Bucket or key is not acceptable to the backend.
    InvalidLocation,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Location context (if applicable).
    pub location: Option<ObjectLocation>,
    /// Backend identifier (e.g., "S3", "Fs", "Memory").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            location: None,
            backend: None,
            source: None,
        }
    }

    /// Attach location context.
    #[must_use]
    pub fn with_location(mut self, location: &ObjectLocation) -> Self {
        self.location = Some(location.clone());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Create a not found error for a location.
    #[must_use]
    pub fn not_found(location: &ObjectLocation) -> Self {
        Self::new(StorageErrorKind::NotFound).with_location(location)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, location: &ObjectLocation) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        Self::new(kind).with_location(location).with_source(err)
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Whether the error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind == StorageErrorKind::Timeout
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "[Backend] Kind: message (location: s3://bucket/key)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidLocation => "Invalid location",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(location) = &self.location {
            write!(f, " (location: {location})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Whether an artifact created at `last_modified` has outlived `retention`.
#[must_use]
pub fn is_expired(last_modified: DateTime<Utc>, retention: TimeDelta, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_modified) >= retention
}

/// Object store holding rendered artifacts.
///
/// Keys are always generated by the caller's pipeline, never supplied by the
/// requester. Stored objects are immutable: `put` is only ever called with a
/// fresh key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend identifier for logs and errors.
    fn backend(&self) -> &'static str;

    /// Store `bytes` at `location` with the given content type.
    async fn put(
        &self,
        location: &ObjectLocation,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Read an object and its metadata.
    ///
    /// Returns a [`StorageErrorKind::NotFound`] error if nothing is stored there.
    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError>;

    /// Read object metadata without the body.
    async fn head(&self, location: &ObjectLocation) -> Result<ArtifactMetadata, StorageError>;

    /// Check credentials and bucket access.
    async fn probe(&self, bucket: &str) -> ProbeStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_full_context() {
        let location = ObjectLocation::new("bucket", "documentation/a.pdf");
        let err = StorageError::not_found(&location).with_backend("Memory");
        assert_eq!(
            err.to_string(),
            "[Memory] Not found (location: s3://bucket/documentation/a.pdf)"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_io_error_mapping() {
        let location = ObjectLocation::new("bucket", "key");
        let timeout = StorageError::io(
            std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"),
            &location,
        );
        assert!(timeout.is_timeout());
        assert!(std::error::Error::source(&timeout).is_some());

        let denied = StorageError::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
            &location,
        );
        assert_eq!(denied.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_is_expired() {
        let created = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let retention = TimeDelta::days(7);

        assert!(!is_expired(created, retention, created + TimeDelta::days(6)));
        assert!(is_expired(created, retention, created + TimeDelta::days(7)));
    }
}
