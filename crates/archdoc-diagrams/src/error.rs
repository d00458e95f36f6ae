//! Diagram rendering errors.

use std::time::Duration;

/// Error raised while compiling or rendering a diagram.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A service name is not in the component catalog.
    #[error("unknown component: {0}")]
    UnknownComponent(String),
    /// The diagram lists no components.
    #[error("diagram has no components")]
    EmptyDiagram,
    /// The rendering engine rejected the source.
    #[error("rendering engine returned HTTP {status}: {message}")]
    Engine { status: u16, message: String },
    /// Transport failure talking to the engine.
    #[error("HTTP error: {0}")]
    Http(String),
    /// The engine did not answer in time.
    #[error("rendering timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The engine answered with something that is not the requested format.
    #[error("invalid {0} output")]
    InvalidOutput(&'static str),
}

impl RenderError {
    /// Whether the error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
