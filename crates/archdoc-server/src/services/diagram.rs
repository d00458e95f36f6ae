//! Diagram generation pipeline.

use std::sync::Arc;

use archdoc_diagrams::{DiagramFormat, DiagramRenderer, DiagramSpec};
use archdoc_storage::{ArtifactReference, ObjectLocation, ObjectStore};
use uuid::Uuid;

use super::run_blocking;
use crate::error::GenerationError;

/// Key prefix for stored diagrams.
const KEY_PREFIX: &str = "diagrams";

/// Input of a diagram generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRequest {
    pub description: String,
    pub services: Vec<String>,
    pub format: DiagramFormat,
}

/// Renders diagrams and stores them in the diagram bucket.
pub struct DiagramService {
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn DiagramRenderer>,
    bucket: String,
}

impl DiagramService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        renderer: Arc<dyn DiagramRenderer>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            renderer,
            bucket: bucket.into(),
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

    /// Render a diagram and store it under a fresh key.
    ///
    /// Unknown component names surface as [`GenerationError::Render`].
    pub async fn generate(
        &self,
        request: DiagramRequest,
    ) -> Result<ArtifactReference, GenerationError> {
        if request.services.iter().all(|s| s.trim().is_empty()) {
            return Err(GenerationError::InvalidInput(
                "services must contain at least one component".to_owned(),
            ));
        }

        let request_id = Uuid::new_v4();
        let format = request.format;
        let services = request.services.join(", ");
        tracing::info!(%request_id, services = %services, %format, "Generating diagram");

        let spec = DiagramSpec {
            description: request.description,
            services: request.services,
            format,
        };
        let renderer = Arc::clone(&self.renderer);
        let bytes = run_blocking(move || renderer.render(&spec))
            .await
            .inspect_err(|e| {
                tracing::warn!(%request_id, services = %services, error = %e, "Diagram rendering failed");
            })?;

        let location = ObjectLocation::new(
            &self.bucket,
            format!("{KEY_PREFIX}/{request_id}.{}", format.extension()),
        );
        let size = bytes.len();
        self.store
            .put(&location, bytes, format.content_type())
            .await
            .map_err(|e| {
                tracing::error!(%request_id, s3_uri = %location, error = %e, "Failed to store diagram");
                GenerationError::from(e)
            })?;

        tracing::info!(%request_id, s3_uri = %location, bytes = size, "Diagram stored");
        Ok(ArtifactReference::from(location))
    }
}

#[cfg(test)]
mod tests {
    use archdoc_diagrams::RenderError;
    use archdoc_storage::{MemoryStore, StorageErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image";

    /// Renderer that compiles DOT for validation and returns fixed bytes.
    struct StubRenderer;

    impl DiagramRenderer for StubRenderer {
        fn render(&self, spec: &DiagramSpec) -> Result<Vec<u8>, RenderError> {
            archdoc_diagrams::compile_dot(spec)?;
            Ok(PNG.to_vec())
        }
    }

    fn service(store: Arc<MemoryStore>) -> DiagramService {
        DiagramService::new(store, Arc::new(StubRenderer), "minigrammer-output")
    }

    fn request(services: &[&str]) -> DiagramRequest {
        DiagramRequest {
            description: "three-tier web app".to_owned(),
            services: services.iter().map(|s| (*s).to_owned()).collect(),
            format: DiagramFormat::Png,
        }
    }

    #[tokio::test]
    async fn test_generate_stores_png() {
        let store = Arc::new(MemoryStore::new());
        let reference = service(Arc::clone(&store))
            .generate(request(&["ELB", "EC2", "RDS"]))
            .await
            .unwrap();

        let location = reference.location();
        assert_eq!(location.bucket(), "minigrammer-output");
        assert!(location.key().starts_with("diagrams/"));
        assert!(location.key().ends_with(".png"));

        let object = store.get(location).await.unwrap();
        assert_eq!(object.metadata.content_type, "image/png");
        assert!(!object.bytes.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_each_call_gets_fresh_key() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(Arc::clone(&store));

        let a = svc.generate(request(&["S3"])).await.unwrap();
        let b = svc.generate(request(&["S3"])).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_services_is_invalid_input() {
        let store = Arc::new(MemoryStore::new());
        let err = service(Arc::clone(&store))
            .generate(request(&[]))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::InvalidInput(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_component_is_render_failure() {
        let store = Arc::new(MemoryStore::new());
        let err = service(Arc::clone(&store))
            .generate(request(&["EC2", "Mainframe"]))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Render(msg) if msg.contains("Mainframe")));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_distinct() {
        let store = Arc::new(MemoryStore::new().with_put_failure(StorageErrorKind::Unavailable));
        let err = service(store).generate(request(&["EC2"])).await.unwrap_err();

        assert!(matches!(err, GenerationError::Storage(_)));
    }

    #[tokio::test]
    async fn test_svg_key_and_content_type() {
        let store = Arc::new(MemoryStore::new());
        let mut req = request(&["Lambda"]);
        req.format = DiagramFormat::Svg;

        let reference = service(Arc::clone(&store)).generate(req).await.unwrap();

        assert!(reference.location().key().ends_with(".svg"));
        let meta = store.head(reference.location()).await.unwrap();
        assert_eq!(meta.content_type, "image/svg+xml");
    }
}
