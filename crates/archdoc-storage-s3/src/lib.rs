//! S3 object store backend for archdoc.
//!
//! Implements [`ObjectStore`] over Amazon S3 or any S3-compatible endpoint
//! (`LocalStack`, `MinIO`). Credentials come from the default AWS provider
//! chain (environment, profile, instance or task role).

use std::error::Error;

use archdoc_storage::{
    ArtifactMetadata, ObjectLocation, ObjectStore, ProbeStatus, StorageError, StorageErrorKind,
    StoredObject,
};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use chrono::{DateTime, Utc};

const BACKEND: &str = "S3";

/// Region that rejects an explicit location constraint on bucket creation.
const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the S3 backend.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// AWS region.
    pub region: String,
    /// S3-compatible endpoint URL.
    pub endpoint: Option<String>,
}

/// Object store backed by S3.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    region: String,
}

impl S3Store {
    /// Build a client from the default credential chain.
    pub async fn connect(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Custom endpoints (LocalStack, MinIO) require path-style
        // addressing (endpoint/bucket/key) instead of the default
        // virtual-hosted-style (bucket.endpoint/key).
        let client = if config.endpoint.is_some() {
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&sdk_config)
        };

        Self {
            client,
            region: config.region.clone(),
        }
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn from_client(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Create `bucket` if it does not exist.
    ///
    /// Returns `true` when the bucket was created.
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(false),
            Err(err) if classify(&err) == StorageErrorKind::NotFound => {}
            Err(err) => return Err(bucket_error(&err, bucket)),
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(|e| bucket_error(&e, bucket))?;

        tracing::info!(bucket, region = %self.region, "Created bucket");
        Ok(true)
    }
}

/// Map an SDK error to a storage error kind.
fn classify<E>(err: &SdkError<E, HttpResponse>) -> StorageErrorKind {
    match err {
        SdkError::TimeoutError(_) => StorageErrorKind::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => StorageErrorKind::Timeout,
        SdkError::DispatchFailure(_) => StorageErrorKind::Unavailable,
        SdkError::ServiceError(_) | SdkError::ResponseError(_) => {
            match err.raw_response().map(|r| r.status().as_u16()) {
                Some(404) => StorageErrorKind::NotFound,
                Some(401 | 403) => StorageErrorKind::PermissionDenied,
                Some(400) => StorageErrorKind::InvalidLocation,
                Some(500..=599) => StorageErrorKind::Unavailable,
                _ => StorageErrorKind::Other,
            }
        }
        _ => StorageErrorKind::Other,
    }
}

fn object_error<E>(err: &SdkError<E, HttpResponse>, location: &ObjectLocation) -> StorageError
where
    E: Error + 'static,
{
    StorageError::new(classify(err))
        .with_location(location)
        .with_backend(BACKEND)
        .with_source(error_chain(err))
}

fn bucket_error<E>(err: &SdkError<E, HttpResponse>, bucket: &str) -> StorageError
where
    E: Error + 'static,
{
    StorageError::new(classify(err))
        .with_backend(BACKEND)
        .with_source(format!("bucket {bucket}: {}", error_chain(err)))
}

/// Walk the error source chain and join all messages.
fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}

/// Convert an S3 timestamp, falling back to now when absent.
fn to_chrono(value: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    value
        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or_else(Utc::now)
}

fn content_type_or_default(value: Option<&str>) -> String {
    value.unwrap_or("application/octet-stream").to_owned()
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn put(
        &self,
        location: &ObjectLocation,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(location.bucket())
            .key(location.key())
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| object_error(&e, location))?;

        tracing::debug!(uri = %location, bytes = size, "Uploaded");
        Ok(())
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| object_error(&e, location))?;

        let content_type = content_type_or_default(output.content_type());
        let last_modified = to_chrono(output.last_modified());

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::Unavailable)
                    .with_location(location)
                    .with_backend(BACKEND)
                    .with_source(e)
            })?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            metadata: ArtifactMetadata {
                location: location.clone(),
                content_type,
                size_bytes: bytes.len() as u64,
                last_modified,
            },
            bytes,
        })
    }

    async fn head(&self, location: &ObjectLocation) -> Result<ArtifactMetadata, StorageError> {
        let output = self
            .client
            .head_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| object_error(&e, location))?;

        Ok(ArtifactMetadata {
            location: location.clone(),
            content_type: content_type_or_default(output.content_type()),
            size_bytes: output
                .content_length()
                .and_then(|len| u64::try_from(len).ok())
                .unwrap_or(0),
            last_modified: to_chrono(output.last_modified()),
        })
    }

    async fn probe(&self, bucket: &str) -> ProbeStatus {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => ProbeStatus {
                credentials_valid: true,
                bucket_reachable: true,
            },
            Err(err) => {
                let kind = classify(&err);
                tracing::warn!(bucket, error = %error_chain(&err), "Bucket probe failed");
                ProbeStatus {
                    credentials_valid: kind == StorageErrorKind::NotFound,
                    bucket_reachable: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("service error")]
    struct FakeServiceError;

    #[test]
    fn test_classify_timeout() {
        let err: SdkError<FakeServiceError, HttpResponse> = SdkError::timeout_error("slow");
        assert_eq!(classify(&err), StorageErrorKind::Timeout);
    }

    #[test]
    fn test_classify_construction_failure() {
        let err: SdkError<FakeServiceError, HttpResponse> =
            SdkError::construction_failure("bad request");
        assert_eq!(classify(&err), StorageErrorKind::Other);
    }

    #[test]
    fn test_object_error_carries_context() {
        let err: SdkError<FakeServiceError, HttpResponse> = SdkError::timeout_error("slow");
        let location = ObjectLocation::new("bucket", "diagrams/a.png");

        let storage_err = object_error(&err, &location);

        assert!(storage_err.is_timeout());
        assert_eq!(storage_err.backend, Some("S3"));
        assert_eq!(storage_err.location, Some(location));
    }

    #[test]
    fn test_to_chrono_converts_seconds() {
        let dt = aws_sdk_s3::primitives::DateTime::from_secs(1_735_689_600);
        assert_eq!(to_chrono(Some(&dt)).to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_content_type_default() {
        assert_eq!(content_type_or_default(None), "application/octet-stream");
        assert_eq!(content_type_or_default(Some("image/png")), "image/png");
    }

    #[test]
    fn test_error_chain_single() {
        let err = std::io::Error::other("connection reset");
        assert_eq!(error_chain(&err), "connection reset");
    }

    /// Store whose endpoint refuses connections.
    fn unreachable_store() -> S3Store {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(DEFAULT_REGION))
            .endpoint_url("http://127.0.0.1:1")
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                "test", "test", None, None, "static",
            ))
            .retry_config(aws_sdk_s3::config::retry::RetryConfig::disabled())
            .force_path_style(true)
            .build();
        S3Store::from_client(Client::from_conf(config), DEFAULT_REGION)
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let store = unreachable_store();
        let location = ObjectLocation::new("bucket", "diagrams/a.png");

        let err = store.head(&location).await.unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::Unavailable);
        assert_eq!(err.backend, Some("S3"));
        assert_eq!(err.location, Some(location));
    }

    #[tokio::test]
    async fn test_probe_unreachable_endpoint() {
        let status = unreachable_store().probe("bucket").await;

        assert_eq!(
            status,
            ProbeStatus {
                credentials_valid: false,
                bucket_reachable: false,
            }
        );
    }
}
