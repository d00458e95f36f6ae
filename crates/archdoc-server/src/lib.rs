//! HTTP server for archdoc.
//!
//! Exposes the diagram and document generation pipelines over axum:
//! - `POST /generateDiagram` renders an architecture diagram and stores it
//! - `POST /generatePDFDocumentation` renders Markdown to PDF and stores it
//! - `GET /getPDFDocumentationDetail` reports metadata of a stored document
//! - `GET /health` probes credentials and the configured buckets
//! - `POST /agent` accepts action invocations from an agent orchestrator
//!
//! A process can serve either handler alone or both ([`ServiceKind`]).
//!
//! # Architecture
//!
//! ```text
//! Client / agent ──HTTP──► axum router (archdoc-server)
//!                               │
//!                               ├─► DiagramService ──► KrokiRenderer ──► Kroki
//!                               │          │
//!                               ├─► DocumentService ─► GotenbergRenderer ──► Gotenberg
//!                               │          │
//!                               │          └─► ObjectStore (S3 / fs / memory)
//!                               │
//!                               └─► health ──► ObjectStore::probe
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod schema;
pub mod services;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use archdoc_config::{Config, StorageBackend};
use archdoc_diagrams::KrokiRenderer;
use archdoc_renderer::GotenbergRenderer;
use archdoc_storage::{FsStore, MemoryStore, ObjectStore};
use archdoc_storage_s3::{S3Config, S3Store};
use chrono::TimeDelta;

pub use error::GenerationError;
pub use schema::openapi_schema;
pub use state::AppState;

use services::{DiagramService, DocumentService};

/// Which handlers a process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceKind {
    /// Diagram generation only.
    Diagram,
    /// PDF documentation only.
    Document,
    /// Both handlers on one router.
    #[default]
    All,
}

impl ServiceKind {
    /// Whether the diagram handler is served.
    #[must_use]
    pub fn includes_diagrams(self) -> bool {
        matches!(self, Self::Diagram | Self::All)
    }

    /// Whether the document handler is served.
    #[must_use]
    pub fn includes_documents(self) -> bool {
        matches!(self, Self::Document | Self::All)
    }
}

/// Runtime options not covered by the configuration file.
#[derive(Clone, Debug, Default)]
pub struct ServeOptions {
    /// Handlers to serve.
    pub kind: ServiceKind,
    /// Create missing S3 buckets before serving.
    pub create_buckets: bool,
    /// Application version reported by `/health`.
    pub version: String,
}

/// Build the object store selected by the configuration.
async fn build_store(
    config: &Config,
    options: &ServeOptions,
) -> Result<Arc<dyn ObjectStore>, Box<dyn std::error::Error>> {
    let retention = TimeDelta::days(i64::from(config.storage.retention_days));
    if !config.storage.backend.expires_objects() {
        tracing::warn!(
            retention_days = config.storage.retention_days,
            "Objects are not expired by archdoc; configure a bucket lifecycle rule to enforce retention"
        );
    }

    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::S3 => {
            let store = S3Store::connect(&S3Config {
                region: config.storage.region.clone(),
                endpoint: config.storage.endpoint.clone(),
            })
            .await;
            if options.create_buckets {
                for bucket in buckets(config, options.kind) {
                    store.ensure_bucket(bucket).await?;
                }
            }
            Arc::new(store)
        }
        StorageBackend::Fs => {
            tracing::info!(root = %config.storage.root.display(), "Using filesystem object store");
            Arc::new(FsStore::new(config.storage.root.clone()).with_retention(retention))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; artifacts are lost on restart");
            Arc::new(MemoryStore::new().with_retention(retention))
        }
    };
    Ok(store)
}

/// Buckets used by the handlers of `kind`.
fn buckets(config: &Config, kind: ServiceKind) -> Vec<&str> {
    let mut buckets = Vec::with_capacity(2);
    if kind.includes_diagrams() {
        buckets.push(config.diagrams.bucket.as_str());
    }
    if kind.includes_documents() {
        buckets.push(config.documents.bucket.as_str());
    }
    buckets
}

/// Assemble application state from configuration.
fn build_state(config: &Config, options: &ServeOptions, store: &Arc<dyn ObjectStore>) -> AppState {
    let mut state = AppState::new(options.version.clone());

    if options.kind.includes_diagrams() {
        let renderer = KrokiRenderer::with_timeout(
            config.diagrams.kroki_url.clone(),
            Duration::from_secs(config.diagrams.timeout_secs),
        );
        tracing::info!(
            bucket = %config.diagrams.bucket,
            kroki_url = %renderer.server_url(),
            "Diagram generation enabled"
        );
        state = state.with_diagrams(DiagramService::new(
            Arc::clone(store),
            Arc::new(renderer),
            config.diagrams.bucket.clone(),
        ));
    }

    if options.kind.includes_documents() {
        let renderer = GotenbergRenderer::with_timeout(
            config.documents.gotenberg_url.clone(),
            Duration::from_secs(config.documents.timeout_secs),
        );
        tracing::info!(
            bucket = %config.documents.bucket,
            gotenberg_url = %renderer.url(),
            "Document generation enabled"
        );
        state = state.with_documents(DocumentService::new(
            Arc::clone(store),
            Arc::new(renderer),
            config.documents.bucket.clone(),
            config.documents.title.clone(),
        ));
    }

    state
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the store cannot be prepared or the server fails to
/// start.
pub async fn run_server(
    config: &Config,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = build_store(config, &options).await?;
    let state = Arc::new(build_state(config, &options, &store));

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.server.host, config.server.port))?;
    tracing::info!(address = %addr, backend = store.backend(), service = ?options.kind, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
