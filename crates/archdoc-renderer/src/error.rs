//! Document rendering errors.

use std::time::Duration;

/// Error raised while converting a page to PDF.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The converter rejected the page.
    #[error("PDF engine returned HTTP {status}: {message}")]
    Engine { status: u16, message: String },
    /// Transport failure talking to the converter.
    #[error("HTTP error: {0}")]
    Http(String),
    /// The converter did not answer in time.
    #[error("PDF conversion timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The converter answered with something that is not a PDF.
    #[error("invalid PDF output: {0}")]
    InvalidOutput(String),
}

impl RenderError {
    /// Whether the error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
