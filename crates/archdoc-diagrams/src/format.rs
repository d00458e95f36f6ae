//! Output formats for rendered diagrams.

use std::fmt;

/// Output format of a rendered diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    /// Raster image (default).
    #[default]
    Png,
    /// Vector image.
    Svg,
    /// Graphviz DOT source, returned without rendering.
    Dot,
}

impl DiagramFormat {
    /// Parse a format name, ignoring case and surrounding whitespace.
    ///
    /// Accepts `png`, `svg`, and `dot` (also spelled `graphviz` or `gv`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            "dot" | "gv" | "graphviz" => Some(Self::Dot),
            _ => None,
        }
    }

    /// File extension used in object keys.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Dot => "dot",
        }
    }

    /// MIME type recorded with the stored object.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Dot => "text/vnd.graphviz",
        }
    }

    /// Kroki output segment, or `None` when no rendering is needed.
    #[must_use]
    pub fn kroki_format(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("png"),
            Self::Svg => Some("svg"),
            Self::Dot => None,
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
