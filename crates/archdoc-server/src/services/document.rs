//! PDF documentation pipeline and artifact lookup.

use std::sync::Arc;

use archdoc_renderer::{DocumentRenderer, PageData, markdown_to_html, render_page};
use archdoc_storage::{ArtifactReference, ObjectLocation, ObjectStore};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::run_blocking;
use crate::error::GenerationError;

/// Key prefix for stored documents.
const KEY_PREFIX: &str = "documentation";

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Largest diagram embedded into a document (5 MiB).
const MAX_DIAGRAM_BYTES: u64 = 5 * 1024 * 1024;

/// Status reported for artifacts that resolve.
const STATUS_AVAILABLE: &str = "AVAILABLE";

/// Only non-empty images within [`MAX_DIAGRAM_BYTES`] are embedded.
fn check_embeddable(content_type: &str, size_bytes: u64) -> Result<(), &'static str> {
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err("not an image");
    }
    if size_bytes == 0 {
        return Err("empty object");
    }
    if size_bytes > MAX_DIAGRAM_BYTES {
        return Err("too large");
    }
    Ok(())
}

/// Input of a document generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRequest {
    /// Markdown source.
    pub documentation: String,
    /// Reference of a stored diagram to embed.
    pub link_to_architecture: Option<String>,
}

/// Storage metadata of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDetail {
    pub s3_uri: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// UTC, formatted `%Y-%m-%d %H:%M:%S`.
    pub last_modified: String,
    pub status: &'static str,
}

/// Renders Markdown documentation to PDF and stores it.
pub struct DocumentService {
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn DocumentRenderer>,
    bucket: String,
    title: String,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        renderer: Arc<dyn DocumentRenderer>,
        bucket: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            store,
            renderer,
            bucket: bucket.into(),
            title: title.into(),
        }
    }

    /// Target bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object store used for artifacts.
    #[must_use]
    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// Render the documentation to PDF and store it under a fresh key.
    ///
    /// The diagram embed is best-effort: a reference that is malformed,
    /// missing, unreadable, not an image or larger than 5 MiB is
    /// logged and the document is produced without it.
    pub async fn generate(
        &self,
        request: DocumentRequest,
    ) -> Result<ArtifactReference, GenerationError> {
        if request.documentation.trim().is_empty() {
            return Err(GenerationError::InvalidInput(
                "documentation must not be empty".to_owned(),
            ));
        }

        let request_id = Uuid::new_v4();
        tracing::info!(
            %request_id,
            chars = request.documentation.len(),
            link = request.link_to_architecture.as_deref().unwrap_or(""),
            "Generating PDF documentation"
        );

        let diagram = match request.link_to_architecture.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() => self.fetch_diagram(request_id, link).await,
            _ => None,
        };

        let fragment = markdown_to_html(&request.documentation);
        tracing::debug!(
            %request_id,
            heading = fragment.title.as_deref().unwrap_or(""),
            sections = fragment.toc.len(),
            "Converted Markdown"
        );
        let html = render_page(&PageData {
            title: &self.title,
            generated_on: Utc::now().date_naive(),
            content_html: &fragment.html,
            toc: &fragment.toc,
            diagram: diagram.as_deref(),
        });

        let renderer = Arc::clone(&self.renderer);
        let pdf = run_blocking(move || renderer.render(&html))
            .await
            .inspect_err(|e| {
                tracing::warn!(%request_id, error = %e, "PDF rendering failed");
            })?;

        let location = ObjectLocation::new(&self.bucket, format!("{KEY_PREFIX}/{request_id}.pdf"));
        let size = pdf.len();
        self.store
            .put(&location, pdf, PDF_CONTENT_TYPE)
            .await
            .map_err(|e| {
                tracing::error!(%request_id, s3_uri = %location, error = %e, "Failed to store PDF");
                GenerationError::from(e)
            })?;

        tracing::info!(%request_id, s3_uri = %location, bytes = size, "PDF stored");
        Ok(ArtifactReference::from(location))
    }

    /// Fetch the diagram to embed, or `None` if it cannot be used.
    async fn fetch_diagram(&self, request_id: Uuid, link: &str) -> Option<Vec<u8>> {
        let reference = match ArtifactReference::parse(link) {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!(%request_id, link, error = %e, "Ignoring malformed diagram reference");
                return None;
            }
        };

        let metadata = match self.store.head(reference.location()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(%request_id, s3_uri = %reference, error = %e, "Diagram unavailable, skipping embed");
                return None;
            }
        };
        if let Err(reason) = check_embeddable(&metadata.content_type, metadata.size_bytes) {
            tracing::warn!(
                %request_id,
                s3_uri = %reference,
                content_type = %metadata.content_type,
                bytes = metadata.size_bytes,
                reason,
                "Diagram not embeddable, skipping embed"
            );
            return None;
        }

        match self.store.get(reference.location()).await {
            Ok(object) => {
                let size = u64::try_from(object.bytes.len()).unwrap_or(u64::MAX);
                match check_embeddable(&object.metadata.content_type, size) {
                    Ok(()) => {
                        tracing::debug!(%request_id, s3_uri = %reference, bytes = size, "Embedding diagram");
                        Some(object.bytes)
                    }
                    Err(reason) => {
                        tracing::warn!(%request_id, s3_uri = %reference, reason, "Diagram not embeddable, skipping embed");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%request_id, s3_uri = %reference, error = %e, "Diagram unavailable, skipping embed");
                None
            }
        }
    }

    /// Look up storage metadata without re-rendering.
    pub async fn detail(&self, s3_uri: &str) -> Result<ArtifactDetail, GenerationError> {
        let reference = ArtifactReference::parse(s3_uri)
            .map_err(|e| GenerationError::InvalidInput(e.to_string()))?;

        let metadata = self.store.head(reference.location()).await.map_err(|e| {
            if e.is_not_found() {
                GenerationError::NotFound(format!("Artifact not found: {reference}"))
            } else {
                tracing::error!(s3_uri = %reference, error = %e, "Failed to read PDF metadata");
                GenerationError::from(e)
            }
        })?;

        Ok(ArtifactDetail {
            s3_uri: reference.to_string(),
            content_type: metadata.content_type,
            size_bytes: metadata.size_bytes,
            last_modified: metadata.last_modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            status: STATUS_AVAILABLE,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use archdoc_renderer::RenderError;
    use archdoc_storage::{MemoryStore, StorageErrorKind};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Renderer that records the page and returns a minimal PDF.
    #[derive(Default)]
    struct RecordingRenderer {
        pages: Mutex<Vec<String>>,
    }

    impl RecordingRenderer {
        fn last_page(&self) -> String {
            self.pages.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    impl DocumentRenderer for RecordingRenderer {
        fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
            self.pages.lock().unwrap().push(html.to_owned());
            Ok(b"%PDF-1.7\n%%EOF\n".to_vec())
        }
    }

    struct FailingRenderer;

    impl DocumentRenderer for FailingRenderer {
        fn render(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Engine {
                status: 500,
                message: "chromium crashed".to_owned(),
            })
        }
    }

    fn service(store: Arc<MemoryStore>, renderer: Arc<RecordingRenderer>) -> DocumentService {
        DocumentService::new(store, renderer, "pdf-documentation-output", "Documentation")
    }

    fn request(markdown: &str, link: Option<&str>) -> DocumentRequest {
        DocumentRequest {
            documentation: markdown.to_owned(),
            link_to_architecture: link.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn test_generate_then_detail() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(Arc::clone(&store), Arc::default());

        let reference = svc
            .generate(request("# Title\n\nBody text.", None))
            .await
            .unwrap();

        assert!(reference.location().key().starts_with("documentation/"));
        assert!(reference.location().key().ends_with(".pdf"));

        let detail = svc.detail(&reference.to_string()).await.unwrap();
        assert_eq!(detail.status, "AVAILABLE");
        assert_eq!(detail.content_type, "application/pdf");
        assert_eq!(detail.s3_uri, reference.to_string());
        assert_eq!(detail.size_bytes, 15);
    }

    #[tokio::test]
    async fn test_embeds_existing_diagram() {
        let diagram = ObjectLocation::new("minigrammer-output", "diagrams/d.png");
        let store = Arc::new(MemoryStore::new().with_object(
            diagram.clone(),
            b"\x89PNG\r\n\x1a\nimg".to_vec(),
            "image/png",
        ));
        let renderer = Arc::new(RecordingRenderer::default());
        let svc = service(Arc::clone(&store), Arc::clone(&renderer));

        svc.generate(request("# Doc", Some(&diagram.to_string())))
            .await
            .unwrap();

        let page = renderer.last_page();
        assert!(page.contains("<h2>Architecture Diagram</h2>"));
        assert!(page.contains("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_non_image_link_is_skipped() {
        let previous = ObjectLocation::new("pdf-documentation-output", "documentation/prev.pdf");
        let store = Arc::new(MemoryStore::new().with_object(
            previous.clone(),
            b"%PDF-1.7\n%%EOF\n".to_vec(),
            "application/pdf",
        ));
        let renderer = Arc::new(RecordingRenderer::default());
        let svc = service(Arc::clone(&store), Arc::clone(&renderer));

        svc.generate(request("# Doc", Some(&previous.to_string())))
            .await
            .unwrap();

        let page = renderer.last_page();
        assert!(!page.contains("Architecture Diagram"));
        assert!(!page.contains("data:image/"));
    }

    #[tokio::test]
    async fn test_oversized_diagram_is_skipped() {
        let diagram = ObjectLocation::new("minigrammer-output", "diagrams/huge.png");
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.resize(usize::try_from(MAX_DIAGRAM_BYTES).unwrap() + 1, 0);
        let store = Arc::new(MemoryStore::new().with_object(diagram.clone(), png, "image/png"));
        let renderer = Arc::new(RecordingRenderer::default());
        let svc = service(Arc::clone(&store), Arc::clone(&renderer));

        svc.generate(request("# Doc", Some(&diagram.to_string())))
            .await
            .unwrap();

        assert!(!renderer.last_page().contains("Architecture Diagram"));
    }

    #[test]
    fn test_check_embeddable() {
        assert_eq!(check_embeddable("image/png", 10), Ok(()));
        assert_eq!(check_embeddable("image/svg+xml", 10), Ok(()));
        assert_eq!(check_embeddable("application/pdf", 10), Err("not an image"));
        assert_eq!(check_embeddable("image/png", 0), Err("empty object"));
        assert_eq!(check_embeddable("image/png", MAX_DIAGRAM_BYTES + 1), Err("too large"));
    }

    #[tokio::test]
    async fn test_missing_diagram_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let renderer = Arc::new(RecordingRenderer::default());
        let svc = service(Arc::clone(&store), Arc::clone(&renderer));

        let reference = svc
            .generate(request(
                "# Doc\n\nText.",
                Some("s3://minigrammer-output/diagrams/missing.png"),
            ))
            .await
            .unwrap();

        assert!(!renderer.last_page().contains("Architecture Diagram"));
        assert_eq!(svc.detail(&reference.to_string()).await.unwrap().status, "AVAILABLE");
    }

    #[tokio::test]
    async fn test_malformed_diagram_link_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(Arc::clone(&store), Arc::default());

        let result = svc
            .generate(request("Some *notes*", Some("not a reference")))
            .await;

        assert!(result.is_ok());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_documentation_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let err = service(Arc::clone(&store), Arc::default())
            .generate(request("  \n", None))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::InvalidInput(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_render_failure_is_distinct_from_storage() {
        let store = Arc::new(MemoryStore::new());
        let svc = DocumentService::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::new(FailingRenderer),
            "docs",
            "Documentation",
        );
        let err = svc.generate(request("# Doc", None)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Render(_)));
        assert!(store.is_empty());

        let failing_store =
            Arc::new(MemoryStore::new().with_put_failure(StorageErrorKind::PermissionDenied));
        let err = service(failing_store, Arc::default())
            .generate(request("# Doc", None))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Storage(_)));
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let svc = service(Arc::new(MemoryStore::new()), Arc::default());

        let err = svc
            .detail("s3://pdf-documentation-output/documentation/nope.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_detail_rejects_malformed_reference() {
        let svc = service(Arc::new(MemoryStore::new()), Arc::default());

        let err = svc.detail("documentation/x.pdf").await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_detail_formats_timestamp() {
        let location = ObjectLocation::new("docs", "documentation/a.pdf");
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 5).unwrap();
        let store = Arc::new(MemoryStore::new().with_object_at(
            location.clone(),
            b"%PDF-1.4".to_vec(),
            "application/pdf",
            created,
        ));
        let svc = service(store, Arc::default());

        let detail = svc.detail(&location.to_string()).await.unwrap();

        assert_eq!(
            detail,
            ArtifactDetail {
                s3_uri: "s3://docs/documentation/a.pdf".to_owned(),
                content_type: "application/pdf".to_owned(),
                size_bytes: 8,
                last_modified: "2025-06-01 08:30:05".to_owned(),
                status: "AVAILABLE",
            }
        );
    }
}
