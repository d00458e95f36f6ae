//! Liveness reporting.

use archdoc_storage::ObjectStore;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Overall health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Health of one service and its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// RFC 3339 UTC.
    pub timestamp: String,
    pub credentials_valid: bool,
    pub bucket_configured: bool,
    pub bucket_reachable: bool,
    pub s3_bucket: String,
    pub service: String,
    pub version: String,
}

/// Probe `bucket` and build a report.
pub async fn check_health(
    store: &dyn ObjectStore,
    bucket: &str,
    service: &str,
    version: &str,
) -> HealthReport {
    let bucket_configured = !bucket.trim().is_empty();
    let probe = if bucket_configured {
        store.probe(bucket).await
    } else {
        archdoc_storage::ProbeStatus {
            credentials_valid: false,
            bucket_reachable: false,
        }
    };

    let healthy = bucket_configured && probe.credentials_valid && probe.bucket_reachable;
    if !healthy {
        tracing::warn!(
            service,
            bucket,
            backend = store.backend(),
            credentials_valid = probe.credentials_valid,
            bucket_reachable = probe.bucket_reachable,
            "Service degraded"
        );
    }

    HealthReport {
        status: if healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        credentials_valid: probe.credentials_valid,
        bucket_configured,
        bucket_reachable: probe.bucket_reachable,
        s3_bucket: bucket.to_owned(),
        service: service.to_owned(),
        version: version.to_owned(),
    }
}

impl HealthReport {
    /// Report for a process with no service enabled.
    #[must_use]
    pub fn unconfigured(service: &str, version: &str) -> Self {
        Self {
            status: HealthStatus::Degraded,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            credentials_valid: false,
            bucket_configured: false,
            bucket_reachable: false,
            s3_bucket: String::new(),
            service: service.to_owned(),
            version: version.to_owned(),
        }
    }

    /// Fold several reports into one: healthy only if all are.
    #[must_use]
    pub fn combine(service: &str, reports: Vec<HealthReport>) -> Option<HealthReport> {
        let mut iter = reports.into_iter();
        let mut combined = iter.next()?;
        combined.service = service.to_owned();
        for report in iter {
            if report.status == HealthStatus::Degraded {
                combined.status = HealthStatus::Degraded;
            }
            combined.credentials_valid &= report.credentials_valid;
            combined.bucket_configured &= report.bucket_configured;
            combined.bucket_reachable &= report.bucket_reachable;
            combined.s3_bucket = format!("{},{}", combined.s3_bucket, report.s3_bucket);
        }
        Some(combined)
    }
}
