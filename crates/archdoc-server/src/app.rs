//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Largest accepted request body (10 MiB).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Create the application router.
///
/// Routes of a handler are only mounted when its service is enabled;
/// `/health` and `/agent` are always present.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/agent", post(handlers::agent::invoke));

    if state.has_diagrams() {
        router = router.route(
            "/generateDiagram",
            post(handlers::diagrams::generate_diagram),
        );
    }

    if state.has_documents() {
        router = router
            .route(
                "/generatePDFDocumentation",
                post(handlers::documents::generate_pdf),
            )
            .route(
                "/getPDFDocumentationDetail",
                get(handlers::documents::get_detail),
            );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(security::cache_control_layer())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use archdoc_diagrams::{DiagramRenderer, DiagramSpec};
    use archdoc_renderer::DocumentRenderer;
    use archdoc_storage::{MemoryStore, ObjectStore, StorageErrorKind};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::services::{DiagramService, DocumentService};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image";
    const PDF: &[u8] = b"%PDF-1.7\n%%EOF\n";

    struct StubDiagrams;

    impl DiagramRenderer for StubDiagrams {
        fn render(&self, spec: &DiagramSpec) -> Result<Vec<u8>, archdoc_diagrams::RenderError> {
            archdoc_diagrams::compile_dot(spec)?;
            Ok(PNG.to_vec())
        }
    }

    struct StubDocuments;

    impl DocumentRenderer for StubDocuments {
        fn render(&self, _html: &str) -> Result<Vec<u8>, archdoc_renderer::RenderError> {
            Ok(PDF.to_vec())
        }
    }

    fn state_with(store: &Arc<MemoryStore>) -> Arc<AppState> {
        let store: Arc<dyn ObjectStore> = Arc::<MemoryStore>::clone(store);
        Arc::new(
            AppState::new("0.1.0")
                .with_diagrams(DiagramService::new(
                    Arc::clone(&store),
                    Arc::new(StubDiagrams),
                    "minigrammer-output",
                ))
                .with_documents(DocumentService::new(
                    store,
                    Arc::new(StubDocuments),
                    "pdf-documentation-output",
                    "Documentation",
                )),
        )
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_diagram_stores_png() {
        let store = Arc::new(MemoryStore::new());
        let router = create_router(state_with(&store));

        let (status, _, body) = send(
            router,
            post_json(
                "/generateDiagram",
                &json!({"description": "Web App", "services": ["ELB", "EC2", "RDS"]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SUCCESS");
        let s3_uri = body["s3_uri"].as_str().unwrap();
        assert!(s3_uri.starts_with("s3://minigrammer-output/diagrams/"));
        assert!(s3_uri.ends_with(".png"));

        let location = store.locations().pop().unwrap();
        let stored = store.get(&location).await.unwrap();
        assert_eq!(stored.metadata.content_type, "image/png");
        assert_eq!(stored.bytes, PNG);
    }

    #[tokio::test]
    async fn test_generate_pdf_then_detail() {
        let store = Arc::new(MemoryStore::new());
        let state = state_with(&store);

        let request = Request::builder()
            .method("POST")
            .uri("/generatePDFDocumentation")
            .header("content-type", "text/markdown")
            .body(Body::from("# Title\n\nBody text."))
            .unwrap();
        let (status, _, body) = send(create_router(Arc::clone(&state)), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let s3_uri = body["s3_uri"].as_str().unwrap().to_owned();
        assert!(s3_uri.starts_with("s3://pdf-documentation-output/documentation/"));

        let (status, _, detail) = send(
            create_router(state),
            get_request(&format!("/getPDFDocumentationDetail?s3_uri={s3_uri}")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["status"], "AVAILABLE");
        assert_eq!(detail["content_type"], "application/pdf");
        assert_eq!(detail["size_bytes"], PDF.len());
        assert_eq!(detail["s3_uri"], s3_uri.as_str());
    }

    #[tokio::test]
    async fn test_missing_diagram_link_still_succeeds() {
        let store = Arc::new(MemoryStore::new());
        let router = create_router(state_with(&store));

        let (status, _, body) = send(
            router,
            post_json(
                "/generatePDFDocumentation",
                &json!({
                    "documentation": "# Doc",
                    "link_to_architecture": "s3://minigrammer-output/diagrams/missing.png"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_detail_of_unknown_artifact_is_404() {
        let router = create_router(state_with(&Arc::new(MemoryStore::new())));

        let (status, _, body) = send(
            router,
            get_request(
                "/getPDFDocumentationDetail?s3_uri=s3://pdf-documentation-output/documentation/nope.pdf",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "ERROR");
        assert_eq!(body["s3_uri"], "");
    }

    #[tokio::test]
    async fn test_health_is_repeatable() {
        let state = state_with(&Arc::new(MemoryStore::new()));

        let (first_status, _, first) = send(create_router(Arc::clone(&state)), get_request("/health")).await;
        let (second_status, _, second) = send(create_router(state), get_request("/health")).await;

        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first["status"], "healthy");
        assert_eq!(first["status"], second["status"]);
        assert_eq!(first["credentials_valid"], second["credentials_valid"]);
        assert_eq!(first["service"], "archdoc");
        assert_eq!(
            first["s3_bucket"],
            "minigrammer-output,pdf-documentation-output"
        );
    }

    #[tokio::test]
    async fn test_storage_and_render_failures_are_distinct() {
        let failing = Arc::new(MemoryStore::new().with_put_failure(StorageErrorKind::Unavailable));
        let (status, _, body) = send(
            create_router(state_with(&failing)),
            post_json("/generateDiagram", &json!({"services": ["EC2"]})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_message"], "Storage is currently unavailable");

        let (status, _, body) = send(
            create_router(state_with(&Arc::new(MemoryStore::new()))),
            post_json("/generateDiagram", &json!({"services": ["Mainframe"]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_invalid_input_is_400() {
        let router = create_router(state_with(&Arc::new(MemoryStore::new())));

        let (status, _, body) = send(
            router,
            post_json("/generateDiagram", &json!({"services": []})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_security_headers() {
        let router = create_router(state_with(&Arc::new(MemoryStore::new())));

        let (_, headers, _) = send(router, get_request("/health")).await;

        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_routes_follow_enabled_services() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new("0.1.0").with_diagrams(DiagramService::new(
            store,
            Arc::new(StubDiagrams),
            "minigrammer-output",
        )));

        let (status, _, _) = send(
            create_router(Arc::clone(&state)),
            post_json("/generatePDFDocumentation", &json!({"documentation": "# Doc"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, health) = send(create_router(state), get_request("/health")).await;
        assert_eq!(health["service"], "diagram-generator");
    }

    #[tokio::test]
    async fn test_agent_diagram_action() {
        let store = Arc::new(MemoryStore::new());
        let router = create_router(state_with(&store));

        let event = json!({
            "messageVersion": "1.0",
            "actionGroup": "architecture",
            "apiPath": "/generateDiagram",
            "httpMethod": "POST",
            "parameters": [],
            "requestBody": {
                "content": {
                    "application/json": {
                        "properties": [
                            {"name": "description", "type": "string", "value": "Web App"},
                            {"name": "services", "type": "array", "value": "[ELB, EC2, RDS]"}
                        ]
                    }
                }
            }
        });
        let (status, _, envelope) = send(router, post_json("/agent", &event)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope["messageVersion"], "1.0");
        assert_eq!(envelope["response"]["actionGroup"], "architecture");
        assert_eq!(envelope["response"]["httpStatusCode"], 200);
        let body: Value = serde_json::from_str(
            envelope["response"]["responseBody"]["application/json"]["body"]
                .as_str()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(body["status"], "SUCCESS");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_agent_pdf_action_answers_boolean() {
        let router = create_router(state_with(&Arc::new(MemoryStore::new())));

        let event = json!({
            "actionGroup": "docs",
            "apiPath": "/generatePDFDocumentation",
            "httpMethod": "POST",
            "requestBody": {
                "content": {
                    "application/json": {
                        "properties": [
                            {"name": "documentation", "type": "string", "value": "# Doc\n\nText"}
                        ]
                    }
                }
            }
        });
        let (_, _, ok) = send(router.clone(), post_json("/agent", &event)).await;
        assert_eq!(ok["response"]["httpStatusCode"], 200);
        assert_eq!(ok["response"]["responseBody"]["application/json"]["body"], "true");

        let empty = json!({
            "actionGroup": "docs",
            "apiPath": "/generatePDFDocumentation",
            "httpMethod": "POST"
        });
        let (_, _, failed) = send(router, post_json("/agent", &empty)).await;
        assert_eq!(failed["response"]["httpStatusCode"], 400);
        assert_eq!(failed["response"]["responseBody"]["application/json"]["body"], "false");
    }

    #[tokio::test]
    async fn test_agent_unknown_action_is_404() {
        let router = create_router(state_with(&Arc::new(MemoryStore::new())));

        let event = json!({"apiPath": "/deleteEverything", "httpMethod": "POST"});
        let (status, _, envelope) = send(router, post_json("/agent", &event)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope["response"]["httpStatusCode"], 404);
    }
}
