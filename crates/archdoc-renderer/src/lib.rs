//! Document rendering for archdoc.
//!
//! Converts Markdown documentation into a print-ready PDF:
//!
//! 1. [`markdown_to_html`] turns Markdown into an [`HtmlFragment`] with
//!    heading ids, a table of contents and the document title
//! 2. [`render_page`] wraps the fragment in the page template, optionally
//!    embedding an architecture diagram
//! 3. a [`DocumentRenderer`] such as [`GotenbergRenderer`] prints the page
//!
//! # Example
//!
//! ```ignore
//! use archdoc_renderer::{DocumentRenderer, GotenbergRenderer, PageData, markdown_to_html, render_page};
//!
//! let fragment = markdown_to_html("# Title\n\nBody text.");
//! let page = render_page(&PageData {
//!     title: "Documentation",
//!     generated_on: chrono::Utc::now().date_naive(),
//!     content_html: &fragment.html,
//!     toc: &fragment.toc,
//!     diagram: None,
//! });
//! let pdf = GotenbergRenderer::new("http://localhost:3000").render(&page)?;
//! ```

mod error;
mod gotenberg;
mod markdown;
mod template;

pub use error::RenderError;
pub use gotenberg::{DEFAULT_TIMEOUT, GotenbergRenderer, PDF_MAGIC};
pub use markdown::{HtmlFragment, TocEntry, markdown_to_html, slugify};
pub use template::{PageData, render_page, sniff_image_type};

/// Prints an HTML page to PDF bytes.
///
/// Implementations block; async callers should run them on a blocking pool.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}
