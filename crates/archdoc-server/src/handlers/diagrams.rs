//! Diagram generation endpoint.

use std::sync::Arc;

use archdoc_diagrams::DiagramFormat;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::services::DiagramRequest;
use crate::state::AppState;

/// Request body for diagram generation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateDiagramBody {
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) services: Vec<String>,
    #[serde(default)]
    pub(crate) output_format: Option<String>,
}

impl GenerateDiagramBody {
    pub(crate) fn into_request(self) -> Result<DiagramRequest, GenerationError> {
        Ok(DiagramRequest {
            description: self.description,
            services: self.services,
            format: parse_format(self.output_format.as_deref())?,
        })
    }
}

/// Successful diagram response.
#[derive(Debug, Serialize)]
pub(crate) struct DiagramResponse {
    pub(crate) s3_uri: String,
    pub(crate) status: &'static str,
}

/// Parse `output_format`, defaulting to PNG when absent or blank.
fn parse_format(value: Option<&str>) -> Result<DiagramFormat, GenerationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DiagramFormat::default()),
        Some(raw) => DiagramFormat::parse(raw).ok_or_else(|| {
            GenerationError::InvalidInput(format!(
                "unsupported output_format: {raw} (expected png, svg or dot)"
            ))
        }),
    }
}

/// Handle POST /generateDiagram.
pub(crate) async fn generate_diagram(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateDiagramBody>, JsonRejection>,
) -> Result<Json<DiagramResponse>, GenerationError> {
    let Json(body) = body.map_err(|e| GenerationError::InvalidInput(e.body_text()))?;
    let request = body.into_request()?;

    let reference = state.diagrams()?.generate(request).await?;

    Ok(Json(DiagramResponse {
        s3_uri: reference.to_string(),
        status: "SUCCESS",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format(None).unwrap(), DiagramFormat::Png);
        assert_eq!(parse_format(Some(" ")).unwrap(), DiagramFormat::Png);
        assert_eq!(parse_format(Some("SVG")).unwrap(), DiagramFormat::Svg);
        assert!(matches!(
            parse_format(Some("bmp")),
            Err(GenerationError::InvalidInput(_))
        ));
    }
}
