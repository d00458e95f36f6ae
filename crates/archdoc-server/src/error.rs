//! Error types for the generation pipelines.
//!
//! Each variant maps to one HTTP status. Messages for infrastructure
//! failures are generic; the full context is logged where the error occurs.

use archdoc_storage::StorageError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Generation pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The request is malformed or missing required data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The rendering engine could not produce output for this input.
    #[error("Render failed: {0}")]
    Render(String),

    /// The object store rejected or failed the operation.
    #[error("Storage failure: {0}")]
    Storage(#[source] StorageError),

    /// The artifact, route or service does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator did not answer in time.
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),
}

impl GenerationError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::Render(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Storage(_) => "Storage is currently unavailable".to_owned(),
            Self::UpstreamTimeout(_) => "An upstream service timed out".to_owned(),
        }
    }

    /// Error body returned by every endpoint.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        json!({
            "status": "ERROR",
            "s3_uri": "",
            "error_message": self.public_message(),
        })
    }
}

impl From<StorageError> for GenerationError {
    fn from(err: StorageError) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(err.to_string())
        } else {
            Self::Storage(err)
        }
    }
}

impl From<archdoc_diagrams::RenderError> for GenerationError {
    fn from(err: archdoc_diagrams::RenderError) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(err.to_string())
        } else {
            Self::Render(err.to_string())
        }
    }
}

impl From<archdoc_renderer::RenderError> for GenerationError {
    fn from(err: archdoc_renderer::RenderError) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(err.to_string())
        } else {
            Self::Render(err.to_string())
        }
    }
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
