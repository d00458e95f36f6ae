//! PDF documentation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::services::{ArtifactDetail, DocumentRequest};
use crate::state::AppState;

/// Query parameters of POST /generatePDFDocumentation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateQuery {
    link_to_architecture: Option<String>,
}

/// JSON form of the request body.
#[derive(Debug, Default, Deserialize)]
struct GenerateBody {
    #[serde(default)]
    documentation: String,
    #[serde(default)]
    link_to_architecture: Option<String>,
}

/// Successful generation response.
#[derive(Debug, Serialize)]
pub(crate) struct DocumentResponse {
    success: bool,
    s3_uri: String,
    status: &'static str,
}

/// Query parameters of GET /getPDFDocumentationDetail.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailQuery {
    s3_uri: Option<String>,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}

/// Build the request from either a raw Markdown body or a JSON body.
///
/// A link in the JSON body wins over the query parameter.
fn parse_request(
    headers: &HeaderMap,
    query: GenerateQuery,
    body: &[u8],
) -> Result<DocumentRequest, GenerationError> {
    if is_json(headers) {
        let parsed: GenerateBody = serde_json::from_slice(body)
            .map_err(|e| GenerationError::InvalidInput(format!("invalid JSON body: {e}")))?;
        return Ok(DocumentRequest {
            documentation: parsed.documentation,
            link_to_architecture: parsed.link_to_architecture.or(query.link_to_architecture),
        });
    }

    let documentation = std::str::from_utf8(body)
        .map_err(|_| GenerationError::InvalidInput("documentation must be UTF-8 text".to_owned()))?;
    Ok(DocumentRequest {
        documentation: documentation.to_owned(),
        link_to_architecture: query.link_to_architecture,
    })
}

/// Handle POST /generatePDFDocumentation.
pub(crate) async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenerateQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DocumentResponse>, GenerationError> {
    let request = parse_request(&headers, query, &body)?;
    let reference = state.documents()?.generate(request).await?;

    Ok(Json(DocumentResponse {
        success: true,
        s3_uri: reference.to_string(),
        status: "SUCCESS",
    }))
}

/// Handle GET /getPDFDocumentationDetail.
pub(crate) async fn get_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<ArtifactDetail>, GenerationError> {
    let s3_uri = query
        .s3_uri
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GenerationError::InvalidInput("missing s3_uri parameter".to_owned()))?;

    let detail = state.documents()?.detail(&s3_uri).await?;
    Ok(Json(detail))
}
