//! HTML page template for PDF generation.
//!
//! Produces a self-contained page: header with title and generation date,
//! optional table of contents, the converted content, an optional embedded
//! architecture diagram, and a footer. Print styles (A4, 2cm margins, page
//! counters) are inlined so the converter needs no other assets.

use std::fmt::Write;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chrono::NaiveDate;

use crate::markdown::TocEntry;

/// All data needed to render a document page.
pub struct PageData<'a> {
    pub title: &'a str,
    pub generated_on: NaiveDate,
    pub content_html: &'a str,
    pub toc: &'a [TocEntry],
    /// Diagram image bytes to embed, if any.
    pub diagram: Option<&'a [u8]>,
}

const STYLES: &str = r#"@page {
    size: A4;
    margin: 2cm;
    @top-center { content: string(doc-title); font-size: 9pt; color: #666; }
    @bottom-center { content: "Page " counter(page) " of " counter(pages); font-size: 9pt; color: #666; }
}
body { font-family: Arial, Helvetica, sans-serif; font-size: 12pt; line-height: 1.5; color: #222; }
h1 { font-size: 24pt; color: #2c3e50; border-bottom: 1px solid #eee; padding-bottom: 10px; }
h2 { font-size: 20pt; color: #2c3e50; margin-top: 20px; }
h3 { font-size: 16pt; color: #2c3e50; }
h1, h2, h3 { page-break-after: avoid; }
pre { background-color: #f8f8f8; border: 1px solid #ddd; border-radius: 3px; padding: 10px; white-space: pre-wrap; font-family: "Courier New", monospace; font-size: 11pt; }
code { font-family: "Courier New", monospace; background-color: #f8f8f8; padding: 2px 4px; border-radius: 3px; font-size: 11pt; }
pre code { padding: 0; background: none; }
table { border-collapse: collapse; width: 100%; margin: 20px 0; page-break-inside: avoid; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }
img { max-width: 100%; height: auto; }
blockquote { border-left: 4px solid #ddd; margin-left: 0; padding-left: 16px; color: #555; }
.architecture-diagram { display: block; margin: 20px auto; max-width: 90%; border: 1px solid #ddd; }
.architecture-diagram-section { page-break-inside: avoid; }
.table-of-contents { background-color: #f9f9f9; border: 1px solid #ddd; padding: 10px 20px; margin: 20px 0; border-radius: 5px; }
.table-of-contents ul { list-style-type: none; padding-left: 0; }
.table-of-contents li.nested { padding-left: 20px; }
.table-of-contents a { text-decoration: none; color: #3498db; }
.header { border-bottom: 1px solid #eee; padding-bottom: 10px; margin-bottom: 20px; }
.document-title { margin-top: 0; border-bottom: none; string-set: doc-title content(); }
.document-info { font-size: 0.9em; color: #666; margin-bottom: 30px; }
.document-content { margin-bottom: 30px; }
.footer { margin-top: 40px; border-top: 1px solid #eee; padding-top: 10px; text-align: center; font-size: 0.8em; color: #666; }
"#;

/// Render a complete HTML page ready for PDF conversion.
pub fn render_page(page: &PageData<'_>) -> String {
    let diagram_len = page.diagram.map_or(0, |d| d.len() * 4 / 3 + 64);
    let mut html = String::with_capacity(page.content_html.len() + STYLES.len() + diagram_len + 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(page.title));
    html.push_str("<style>\n");
    html.push_str(STYLES);
    html.push_str("</style>\n</head>\n<body>\n");

    // Header
    html.push_str("<div class=\"header\">\n");
    let _ = writeln!(
        html,
        "<h1 class=\"document-title\">{}</h1>",
        escape(page.title)
    );
    let _ = writeln!(
        html,
        "<div class=\"document-info\"><p>Generated on: {}</p></div>",
        page.generated_on.format("%Y-%m-%d")
    );
    html.push_str("</div>\n");

    render_toc(&mut html, page.toc);

    html.push_str("<div class=\"document-content\">\n");
    html.push_str(page.content_html);
    html.push_str("\n</div>\n");

    if let Some(diagram) = page.diagram {
        render_diagram(&mut html, diagram);
    }

    html.push_str("<div class=\"footer\">\n<p>Generated by archdoc</p>\n</div>\n");
    html.push_str("</body>\n</html>\n");
    html
}

fn render_toc(html: &mut String, toc: &[TocEntry]) {
    if toc.is_empty() {
        return;
    }
    html.push_str("<div class=\"table-of-contents\">\n<h2>Contents</h2>\n<ul>\n");
    for entry in toc {
        let class = if entry.level >= 3 { " class=\"nested\"" } else { "" };
        let _ = writeln!(
            html,
            "<li{class}><a href=\"#{}\">{}</a></li>",
            escape(&entry.id),
            escape(&entry.title),
        );
    }
    html.push_str("</ul>\n</div>\n");
}

fn render_diagram(html: &mut String, image: &[u8]) {
    html.push_str("<div class=\"architecture-diagram-section\">\n<h2>Architecture Diagram</h2>\n");
    let _ = writeln!(
        html,
        "<img src=\"data:{};base64,{}\" alt=\"Architecture Diagram\" class=\"architecture-diagram\">",
        sniff_image_type(image),
        BASE64_STANDARD.encode(image)
    );
    html.push_str("</div>\n");
}

/// Detect an image MIME type from its leading bytes, defaulting to PNG.
#[must_use]
pub fn sniff_image_type(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }
    let head = String::from_utf8_lossy(&data[..data.len().min(1024)]);
    let head = head.trim_start();
    if (head.starts_with("<svg") || head.starts_with("<?xml")) && head.contains("<svg") {
        return "image/svg+xml";
    }
    "image/png"
}

/// Escape HTML special characters.
fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>(content: &'a str, toc: &'a [TocEntry], diagram: Option<&'a [u8]>) -> PageData<'a> {
        PageData {
            title: "Documentation",
            generated_on: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            content_html: content,
            toc,
            diagram,
        }
    }

    #[test]
    fn test_render_page_structure() {
        let html = render_page(&page("<p>Hello world</p>", &[], None));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Documentation</title>"));
        assert!(html.contains("<p>Hello world</p>"));
        assert!(html.contains("Generated on: 2025-03-14"));
        assert!(html.contains("size: A4;"));
        assert!(html.contains("margin: 2cm;"));
        assert!(html.contains("counter(pages)"));
        assert!(!html.contains("Architecture Diagram"));
        assert!(!html.contains("table-of-contents\">"));
    }

    #[test]
    fn test_render_page_embeds_diagram() {
        let png = b"\x89PNG\r\n\x1a\nrest";
        let html = render_page(&page("<p>x</p>", &[], Some(png)));

        assert!(html.contains("<h2>Architecture Diagram</h2>"));
        let expected = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png));
        assert!(html.contains(&expected));
    }

    #[test]
    fn test_render_page_toc() {
        let toc = [
            TocEntry {
                level: 2,
                title: "Overview".to_owned(),
                id: "overview".to_owned(),
            },
            TocEntry {
                level: 3,
                title: "A & B".to_owned(),
                id: "a-b".to_owned(),
            },
        ];
        let html = render_page(&page("", &toc, None));

        assert!(html.contains("<li><a href=\"#overview\">Overview</a></li>"));
        assert!(html.contains("<li class=\"nested\"><a href=\"#a-b\">A &amp; B</a></li>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut data = page("", &[], None);
        data.title = "<R&D>";
        let html = render_page(&data);
        assert!(html.contains("<title>&lt;R&amp;D&gt;</title>"));
    }

    #[test]
    fn test_sniff_image_type() {
        assert_eq!(sniff_image_type(b"\x89PNG\r\n\x1a\n...."), "image/png");
        assert_eq!(sniff_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_image_type(b"GIF89a..."), "image/gif");
        assert_eq!(
            sniff_image_type(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"x\"/>"),
            "image/svg+xml"
        );
        assert_eq!(sniff_image_type(b"  <svg></svg>"), "image/svg+xml");
        assert_eq!(sniff_image_type(b"unknown"), "image/png");
        assert_eq!(sniff_image_type(b""), "image/png");
    }
}
