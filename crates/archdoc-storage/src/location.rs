//! Object locations and artifact references.
//!
//! An [`ObjectLocation`] is a bucket plus key. An [`ArtifactReference`] is the
//! opaque `s3://bucket/key` string handed to callers; it resolves to exactly
//! one location.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// URI scheme used for artifact references.
const SCHEME: &str = "s3://";

/// Bucket and key of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    bucket: String,
    key: String,
}

impl ObjectLocation {
    /// Create a location from bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key within the bucket.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.bucket, self.key)
    }
}

/// Error returned when a reference string cannot be parsed.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("reference must start with s3://: {0}")]
    UnsupportedScheme(String),
    #[error("reference has no bucket: {0}")]
    MissingBucket(String),
    #[error("reference has no key: {0}")]
    MissingKey(String),
}

/// Opaque locator for a stored artifact, rendered as `s3://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    location: ObjectLocation,
}

impl ArtifactReference {
    /// Parse a reference string.
    ///
    /// Surrounding whitespace is ignored. Leading slashes on the key are
    /// stripped, so `s3://bucket//key` and `s3://bucket/key` are equal.
    pub fn parse(value: &str) -> Result<Self, ReferenceError> {
        let trimmed = value.trim();
        let rest = trimmed
            .strip_prefix(SCHEME)
            .ok_or_else(|| ReferenceError::UnsupportedScheme(trimmed.to_owned()))?;

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(ReferenceError::MissingBucket(trimmed.to_owned()));
        }
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(ReferenceError::MissingKey(trimmed.to_owned()));
        }

        Ok(Self {
            location: ObjectLocation::new(bucket, key),
        })
    }

    /// Location this reference resolves to.
    #[must_use]
    pub fn location(&self) -> &ObjectLocation {
        &self.location
    }
}

impl From<ObjectLocation> for ArtifactReference {
    fn from(location: ObjectLocation) -> Self {
        Self { location }
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.location.fmt(f)
    }
}

impl FromStr for ArtifactReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ArtifactReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArtifactReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
