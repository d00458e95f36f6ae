//! Diagram requests and the renderer seam.

use crate::error::RenderError;
use crate::format::DiagramFormat;

/// What to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSpec {
    /// Free text used as the diagram title. May be empty.
    pub description: String,
    /// Component names in flow order.
    pub services: Vec<String>,
    pub format: DiagramFormat,
}

impl DiagramSpec {
    /// Create a spec with the default format.
    pub fn new(description: impl Into<String>, services: Vec<String>) -> Self {
        Self {
            description: description.into(),
            services,
            format: DiagramFormat::default(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: DiagramFormat) -> Self {
        self.format = format;
        self
    }
}

/// Turns a [`DiagramSpec`] into image bytes.
///
/// Implementations block; async callers should run them on a blocking pool.
pub trait DiagramRenderer: Send + Sync {
    /// Render the diagram in `spec.format`.
    fn render(&self, spec: &DiagramSpec) -> Result<Vec<u8>, RenderError>;
}
