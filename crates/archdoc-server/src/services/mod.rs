//! Generation pipelines.
//!
//! Each service owns its collaborators (object store, renderer, bucket) and
//! runs one linear request, render, store pipeline per call.

mod diagram;
mod document;
mod health;

pub use diagram::{DiagramRequest, DiagramService};
pub use document::{ArtifactDetail, DocumentRequest, DocumentService};
pub use health::{HealthReport, HealthStatus, check_health};

use crate::error::GenerationError;

/// Run a blocking render call on the blocking pool.
async fn run_blocking<T, E, F>(f: F) -> Result<T, GenerationError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<GenerationError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GenerationError::Render(format!("renderer task failed: {e}")))?
        .map_err(Into::into)
}
