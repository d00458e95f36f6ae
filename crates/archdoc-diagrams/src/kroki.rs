//! Kroki-backed diagram renderer.
//!
//! Compiles the diagram to DOT and POSTs it to `{server_url}/graphviz/{format}`.
//! The DOT format is returned as-is without a network round trip.

use std::time::Duration;

use ureq::Agent;

use crate::consts::{DEFAULT_TIMEOUT, GRAPHVIZ_ENDPOINT, MAX_RESPONSE_BYTES, PNG_SIGNATURE};
use crate::diagram::{DiagramRenderer, DiagramSpec};
use crate::dot::compile_dot;
use crate::error::RenderError;
use crate::format::DiagramFormat;

/// Create HTTP agent with the specified timeout.
///
/// Status codes are returned as responses so error bodies can be reported.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Renderer that delegates Graphviz layout to a Kroki server.
#[derive(Debug)]
pub struct KrokiRenderer {
    agent: Agent,
    server_url: String,
    timeout: Duration,
}

impl KrokiRenderer {
    /// Create a renderer for the given Kroki base URL.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_timeout(server_url, DEFAULT_TIMEOUT)
    }

    /// Create a renderer with an explicit request timeout.
    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            agent: create_agent(timeout),
            server_url,
            timeout,
        }
    }

    /// Base URL of the Kroki server.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn map_transport(&self, err: ureq::Error) -> RenderError {
        match err {
            ureq::Error::Timeout(_) => RenderError::Timeout(self.timeout),
            other => RenderError::Http(other.to_string()),
        }
    }

    /// POST DOT source and return the response body.
    fn send(&self, source: &str, format: &'static str) -> Result<Vec<u8>, RenderError> {
        let url = format!("{}/{GRAPHVIZ_ENDPOINT}/{format}", self.server_url);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| self.map_transport(e))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let message = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RenderError::Engine {
                status,
                message: message.trim().to_owned(),
            });
        }

        body.with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_vec()
            .map_err(|e| self.map_transport(e))
    }
}

impl DiagramRenderer for KrokiRenderer {
    fn render(&self, spec: &DiagramSpec) -> Result<Vec<u8>, RenderError> {
        let dot = compile_dot(spec)?;

        let Some(format) = spec.format.kroki_format() else {
            return Ok(dot.into_bytes());
        };

        tracing::debug!(
            url = %self.server_url,
            format,
            nodes = spec.services.len(),
            "Rendering diagram"
        );
        let data = self.send(&dot, format)?;
        validate_output(spec.format, &data)?;
        Ok(data)
    }
}

/// Check that the body looks like the requested format.
fn validate_output(format: DiagramFormat, data: &[u8]) -> Result<(), RenderError> {
    let valid = match format {
        DiagramFormat::Png => data.starts_with(PNG_SIGNATURE),
        DiagramFormat::Svg => String::from_utf8_lossy(&data[..data.len().min(1024)]).contains("<svg"),
        DiagramFormat::Dot => true,
    };
    if valid {
        Ok(())
    } else {
        Err(RenderError::InvalidOutput(format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(services: &[&str]) -> DiagramSpec {
        DiagramSpec::new(
            "Test",
            services.iter().map(|s| (*s).to_owned()).collect(),
        )
    }

    #[test]
    fn test_dot_format_skips_network() {
        // Unroutable URL: any request would fail.
        let renderer = KrokiRenderer::new("http://127.0.0.1:1");
        let output = renderer
            .render(&spec(&["Lambda", "DynamoDB"]).with_format(DiagramFormat::Dot))
            .unwrap();

        let dot = String::from_utf8(output).unwrap();
        assert!(dot.starts_with("digraph architecture {"));
        assert!(dot.contains("n0 -> n1;"));
    }

    #[test]
    fn test_unknown_component_fails_before_request() {
        let renderer = KrokiRenderer::new("http://127.0.0.1:1");
        let err = renderer.render(&spec(&["Mainframe"])).unwrap_err();
        assert!(matches!(err, RenderError::UnknownComponent(_)));
    }

    #[test]
    fn test_unreachable_server_is_http_error() {
        let renderer = KrokiRenderer::with_timeout("http://127.0.0.1:1", Duration::from_secs(5));
        let err = renderer.render(&spec(&["EC2"])).unwrap_err();
        assert!(matches!(err, RenderError::Http(_) | RenderError::Timeout(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let renderer = KrokiRenderer::new("https://kroki.io/");
        assert_eq!(renderer.server_url(), "https://kroki.io");
    }

    #[test]
    fn test_validate_png_signature() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&[0, 0, 0, 13]);
        assert!(validate_output(DiagramFormat::Png, &png).is_ok());

        let err = validate_output(DiagramFormat::Png, b"<html>error</html>").unwrap_err();
        assert!(matches!(err, RenderError::InvalidOutput("png")));
    }

    #[test]
    fn test_validate_svg() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert!(validate_output(DiagramFormat::Svg, svg).is_ok());
        assert!(validate_output(DiagramFormat::Svg, b"not svg").is_err());
    }
}
