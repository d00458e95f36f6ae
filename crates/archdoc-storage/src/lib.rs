//! Object storage abstraction for archdoc.
//!
//! Rendered artifacts (diagram images, PDF documents) live in an object store
//! addressed by bucket and key. This crate provides:
//!
//! - [`ObjectStore`] trait with `put()`, `get()`, `head()` and `probe()`
//! - [`ObjectLocation`] and [`ArtifactReference`] (`s3://bucket/key` locators)
//! - [`StorageError`] with a backend-independent [`StorageErrorKind`]
//! - [`FsStore`] for local development
//! - [`MemoryStore`] for tests and throwaway deployments
//!
//! The S3 backend lives in `archdoc-storage-s3`.
//!
//! # Example
//!
//! ```ignore
//! use archdoc_storage::{MemoryStore, ObjectLocation, ObjectStore};
//!
//! let store = MemoryStore::new();
//! let location = ObjectLocation::new("bucket", "diagrams/abc.png");
//! store.put(&location, png_bytes, "image/png").await?;
//! let meta = store.head(&location).await?;
//! ```

mod fs;
mod location;
mod memory;
mod store;

pub use fs::FsStore;
pub use location::{ArtifactReference, ObjectLocation, ReferenceError};
pub use memory::MemoryStore;
pub use store::{
    ArtifactMetadata, ObjectStore, ProbeStatus, StorageError, StorageErrorKind, StoredObject,
    is_expired,
};
