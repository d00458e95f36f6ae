//! Agent action-group endpoint.
//!
//! A managed agent orchestrator invokes actions with an event envelope naming
//! the API path, HTTP method, query parameters and request body properties.
//! Each action is dispatched to the same services as the plain HTTP routes and
//! the result is wrapped in the response envelope the orchestrator expects.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::diagrams::{DiagramResponse, GenerateDiagramBody};
use crate::error::GenerationError;
use crate::services::DocumentRequest;
use crate::state::AppState;

const RESPONSE_VERSION: &str = "1.0";
const JSON_CONTENT: &str = "application/json";

/// Incoming action invocation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AgentEvent {
    #[serde(default)]
    message_version: String,
    #[serde(default)]
    action_group: String,
    api_path: String,
    http_method: String,
    #[serde(default)]
    parameters: Vec<AgentParameter>,
    #[serde(default)]
    request_body: Option<AgentRequestBody>,
}

/// Named, string-encoded value. The declared `type` is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct AgentParameter {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentRequestBody {
    #[serde(default)]
    content: HashMap<String, AgentContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentContent {
    #[serde(default)]
    properties: Vec<AgentParameter>,
}

/// Outgoing envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AgentResponse {
    message_version: &'static str,
    response: AgentResponseInner,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentResponseInner {
    action_group: String,
    api_path: String,
    http_method: String,
    http_status_code: u16,
    response_body: HashMap<&'static str, AgentResponseBody>,
}

#[derive(Debug, Serialize)]
struct AgentResponseBody {
    /// JSON-encoded payload.
    body: String,
}

impl AgentEvent {
    /// Look up a value by name in the query parameters, then the body properties.
    fn arg(&self, name: &str) -> Option<&AgentParameter> {
        self.parameters.iter().find(|p| p.name == name).or_else(|| {
            self.request_body
                .as_ref()
                .and_then(|body| body.content.get(JSON_CONTENT))
                .and_then(|content| content.properties.iter().find(|p| p.name == name))
        })
    }

    fn string_arg(&self, name: &str) -> Option<String> {
        self.arg(name).map(|p| p.value.clone())
    }

    fn required_arg(&self, name: &str) -> Result<String, GenerationError> {
        self.string_arg(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GenerationError::InvalidInput(format!("missing parameter: {name}")))
    }

    fn respond(&self, status: StatusCode, body: &Value) -> AgentResponse {
        AgentResponse {
            message_version: RESPONSE_VERSION,
            response: AgentResponseInner {
                action_group: self.action_group.clone(),
                api_path: self.api_path.clone(),
                http_method: self.http_method.clone(),
                http_status_code: status.as_u16(),
                response_body: HashMap::from([(
                    JSON_CONTENT,
                    AgentResponseBody {
                        body: body.to_string(),
                    },
                )]),
            },
        }
    }
}

/// Decode an array-typed value.
///
/// Accepts a JSON array (`["ELB","EC2"]`) or the unquoted form the
/// orchestrator produces (`[ELB, EC2]`), as well as a bare comma list.
fn parse_list(raw: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
        return items;
    }
    let inner = raw.trim();
    let inner = inner
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(inner);
    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

async fn generate_diagram(state: &AppState, event: &AgentEvent) -> Result<Value, GenerationError> {
    let body = GenerateDiagramBody {
        description: event.string_arg("description").unwrap_or_default(),
        services: event
            .arg("services")
            .map(|p| parse_list(&p.value))
            .unwrap_or_default(),
        output_format: event.string_arg("output_format"),
    };
    let reference = state.diagrams()?.generate(body.into_request()?).await?;
    Ok(json!(DiagramResponse {
        s3_uri: reference.to_string(),
        status: "SUCCESS",
    }))
}

async fn generate_pdf(state: &AppState, event: &AgentEvent) -> Result<Value, GenerationError> {
    let request = DocumentRequest {
        documentation: event.required_arg("documentation")?,
        link_to_architecture: event.string_arg("link_to_architecture"),
    };
    state.documents()?.generate(request).await?;
    Ok(Value::Bool(true))
}

async fn get_detail(state: &AppState, event: &AgentEvent) -> Result<Value, GenerationError> {
    let s3_uri = event.required_arg("s3_uri")?;
    let detail = state.documents()?.detail(&s3_uri).await?;
    Ok(json!(detail))
}

async fn dispatch(state: &AppState, event: &AgentEvent) -> Result<Value, GenerationError> {
    match (event.api_path.as_str(), event.http_method.to_ascii_uppercase().as_str()) {
        ("/generateDiagram", "POST") => generate_diagram(state, event).await,
        ("/generatePDFDocumentation", "POST") => generate_pdf(state, event).await,
        ("/getPDFDocumentationDetail", "GET") => get_detail(state, event).await,
        ("/health", "GET") => Ok(json!(state.health().await)),
        (path, method) => Err(GenerationError::NotFound(format!(
            "no action for {method} {path}"
        ))),
    }
}

/// Handle POST /agent.
pub(crate) async fn invoke(
    State(state): State<Arc<AppState>>,
    event: Result<Json<AgentEvent>, JsonRejection>,
) -> Result<Json<AgentResponse>, GenerationError> {
    let Json(event) = event.map_err(|e| GenerationError::InvalidInput(e.body_text()))?;
    tracing::info!(
        message_version = %event.message_version,
        action_group = %event.action_group,
        api_path = %event.api_path,
        http_method = %event.http_method,
        parameters = event.parameters.len(),
        "Agent action invoked"
    );

    let response = match dispatch(&state, &event).await {
        Ok(body) => event.respond(StatusCode::OK, &body),
        // The PDF action's contract is a bare success flag.
        Err(err) if event.api_path == "/generatePDFDocumentation" => {
            tracing::warn!(api_path = %event.api_path, error = %err, "Agent action failed");
            event.respond(err.status_code(), &Value::Bool(false))
        }
        Err(err) => {
            tracing::warn!(api_path = %event.api_path, error = %err, "Agent action failed");
            event.respond(err.status_code(), &err.body())
        }
    };
    Ok(Json(response))
}
