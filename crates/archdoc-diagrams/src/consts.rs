//! Internal constants for diagram rendering.

use std::time::Duration;

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a rendered diagram body (32 MiB).
pub const MAX_RESPONSE_BYTES: u64 = 32 * 1024 * 1024;

/// PNG file signature.
pub const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Kroki endpoint for DOT sources.
pub const GRAPHVIZ_ENDPOINT: &str = "graphviz";
