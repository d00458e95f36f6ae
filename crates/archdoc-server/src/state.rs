//! Application state.
//!
//! Shared state for all request handlers.

use crate::error::GenerationError;
use crate::services::{DiagramService, DocumentService, HealthReport, check_health};

/// Service name reported by the diagram handler.
pub(crate) const DIAGRAM_SERVICE_NAME: &str = "diagram-generator";

/// Service name reported by the document handler.
pub(crate) const DOCUMENT_SERVICE_NAME: &str = "pdf-documentation-generator";

/// Application state shared across all handlers.
pub struct AppState {
    diagrams: Option<DiagramService>,
    documents: Option<DocumentService>,
    version: String,
}

impl AppState {
    /// Create state with no services enabled.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            diagrams: None,
            documents: None,
            version: version.into(),
        }
    }

    /// Enable the diagram handler.
    #[must_use]
    pub fn with_diagrams(mut self, service: DiagramService) -> Self {
        self.diagrams = Some(service);
        self
    }

    /// Enable the document handler.
    #[must_use]
    pub fn with_documents(mut self, service: DocumentService) -> Self {
        self.documents = Some(service);
        self
    }

    /// Application version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn has_diagrams(&self) -> bool {
        self.diagrams.is_some()
    }

    pub(crate) fn has_documents(&self) -> bool {
        self.documents.is_some()
    }

    pub(crate) fn diagrams(&self) -> Result<&DiagramService, GenerationError> {
        self.diagrams
            .as_ref()
            .ok_or_else(|| GenerationError::NotFound("diagram generation is not enabled".to_owned()))
    }

    pub(crate) fn documents(&self) -> Result<&DocumentService, GenerationError> {
        self.documents
            .as_ref()
            .ok_or_else(|| GenerationError::NotFound("document generation is not enabled".to_owned()))
    }

    /// Health of every enabled service, folded into one report.
    pub(crate) async fn health(&self) -> HealthReport {
        let mut reports = Vec::with_capacity(2);
        if let Some(diagrams) = &self.diagrams {
            reports.push(
                check_health(diagrams.store(), diagrams.bucket(), DIAGRAM_SERVICE_NAME, &self.version)
                    .await,
            );
        }
        if let Some(documents) = &self.documents {
            reports.push(
                check_health(documents.store(), documents.bucket(), DOCUMENT_SERVICE_NAME, &self.version)
                    .await,
            );
        }

        let service = match reports.as_slice() {
            [single] => single.service.clone(),
            _ => "archdoc".to_owned(),
        };
        HealthReport::combine(&service, reports)
            .unwrap_or_else(|| HealthReport::unconfigured(&service, &self.version))
    }
}
