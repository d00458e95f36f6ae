//! Gotenberg-backed PDF renderer.
//!
//! Sends the page as `index.html` in a multipart form to Chromium's HTML
//! route. Paper size and margins come from the page's `@page` rule.

use std::fmt::Write;
use std::time::Duration;

use ureq::Agent;

use crate::DocumentRenderer;
use crate::error::RenderError;

/// Default HTTP timeout for conversions (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Upper bound on a returned PDF (64 MiB).
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

const CONVERT_ROUTE: &str = "forms/chromium/convert/html";

/// Form fields sent with every conversion.
const FORM_FIELDS: &[(&str, &str)] = &[
    ("preferCssPageSize", "true"),
    ("printBackground", "true"),
    ("paperWidth", "8.27"),
    ("paperHeight", "11.7"),
];

/// Renderer that prints pages through a Gotenberg server.
#[derive(Debug)]
pub struct GotenbergRenderer {
    agent: Agent,
    url: String,
    timeout: Duration,
}

impl GotenbergRenderer {
    /// Create a renderer for the given Gotenberg base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a renderer with an explicit request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            url: url.into().trim_end_matches('/').to_owned(),
            timeout,
        }
    }

    /// Base URL of the Gotenberg server.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_transport(&self, err: ureq::Error) -> RenderError {
        match err {
            ureq::Error::Timeout(_) => RenderError::Timeout(self.timeout),
            other => RenderError::Http(other.to_string()),
        }
    }
}

impl DocumentRenderer for GotenbergRenderer {
    fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let boundary = pick_boundary(html);
        let body = multipart_body(&boundary, html);
        let url = format!("{}/{CONVERT_ROUTE}", self.url);

        tracing::debug!(url = %url, bytes = body.len(), "Converting page to PDF");

        let response = self
            .agent
            .post(&url)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .send(body.as_slice())
            .map_err(|e| self.map_transport(e))?;

        let status = response.status().as_u16();
        let mut response_body = response.into_body();

        if status >= 400 {
            let message = response_body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RenderError::Engine {
                status,
                message: message.trim().to_owned(),
            });
        }

        let pdf = response_body
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_vec()
            .map_err(|e| self.map_transport(e))?;

        if !pdf.starts_with(PDF_MAGIC) {
            return Err(RenderError::InvalidOutput(format!(
                "missing PDF header in {} byte response",
                pdf.len()
            )));
        }
        Ok(pdf)
    }
}

/// Choose a multipart boundary that does not occur in the page.
fn pick_boundary(html: &str) -> String {
    let mut boundary = String::from("archdoc-form-boundary");
    let mut n = 0u32;
    while html.contains(&boundary) {
        n += 1;
        boundary = format!("archdoc-form-boundary-{n}");
    }
    boundary
}

/// Build a `multipart/form-data` body with the page and conversion options.
fn multipart_body(boundary: &str, html: &str) -> Vec<u8> {
    let mut body = String::with_capacity(html.len() + 512);

    for (name, value) in FORM_FIELDS {
        let _ = write!(
            body,
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        );
    }

    let _ = write!(
        body,
        "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"index.html\"\r\n\
         Content-Type: text/html; charset=utf-8\r\n\r\n"
    );
    body.push_str(html);
    let _ = write!(body, "\r\n--{boundary}--\r\n");

    body.into_bytes()
}
