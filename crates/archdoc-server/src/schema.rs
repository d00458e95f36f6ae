//! Action schema for the agent orchestrator.
//!
//! The orchestrator discovers the available actions from an OpenAPI 3.0
//! document. Paths, parameter names and response shapes here must match what
//! the agent endpoint dispatches.

use serde_json::{Map, Value, json};

use crate::ServiceKind;

const OPENAPI_VERSION: &str = "3.0.3";
const SCHEMA_VERSION: &str = "1.0.0";

fn error_response() -> Value {
    json!({
        "description": "Error details",
        "content": {
            "application/json": {
                "schema": {"$ref": "#/components/schemas/ErrorResponse"}
            }
        }
    })
}

fn diagram_paths() -> Value {
    json!({
        "/generateDiagram": {
            "post": {
                "operationId": "generateDiagram",
                "summary": "Generate an architecture diagram",
                "description": "Render an architecture diagram from a list of AWS service names. \
                                Consecutive services are connected left to right. \
                                The image is stored and its S3 URI returned.",
                "requestBody": {
                    "required": true,
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "required": ["services"],
                                "properties": {
                                    "description": {
                                        "type": "string",
                                        "description": "Diagram title"
                                    },
                                    "services": {
                                        "type": "array",
                                        "items": {"type": "string"},
                                        "description": "AWS service names in flow order, e.g. [\"ELB\", \"EC2\", \"RDS\"]"
                                    },
                                    "output_format": {
                                        "type": "string",
                                        "enum": ["PNG", "SVG", "DOT"],
                                        "description": "Output format: PNG (default), SVG (vector), or DOT (Graphviz source)"
                                    }
                                }
                            }
                        }
                    }
                },
                "responses": {
                    "200": {
                        "description": "S3 URI of the generated diagram",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "s3_uri": {"type": "string"},
                                        "status": {"type": "string", "enum": ["SUCCESS"]}
                                    }
                                }
                            }
                        }
                    },
                    "default": error_response()
                }
            }
        }
    })
}

fn document_paths() -> Value {
    json!({
        "/generatePDFDocumentation": {
            "post": {
                "operationId": "generatePDFDocumentation",
                "summary": "Generate PDF documentation",
                "description": "Generate PDF documentation from Markdown content and optionally \
                                embed an architecture diagram.",
                "parameters": [
                    {
                        "name": "link_to_architecture",
                        "in": "query",
                        "required": false,
                        "description": "S3 URI of an architecture diagram to embed",
                        "schema": {"type": "string"}
                    }
                ],
                "requestBody": {
                    "required": true,
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "required": ["documentation"],
                                "properties": {
                                    "documentation": {
                                        "type": "string",
                                        "description": "Documentation content in Markdown format"
                                    }
                                }
                            }
                        }
                    }
                },
                "responses": {
                    "200": {
                        "description": "Whether the document was generated",
                        "content": {
                            "application/json": {
                                "schema": {"type": "boolean"}
                            }
                        }
                    },
                    "default": error_response()
                }
            }
        },
        "/getPDFDocumentationDetail": {
            "get": {
                "operationId": "getPDFDocumentationDetail",
                "summary": "Describe a generated PDF",
                "description": "Get details about a generated PDF document.",
                "parameters": [
                    {
                        "name": "s3_uri",
                        "in": "query",
                        "required": true,
                        "description": "S3 URI of the PDF documentation",
                        "schema": {"type": "string"}
                    }
                ],
                "responses": {
                    "200": {
                        "description": "Details of the PDF documentation",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "s3_uri": {"type": "string"},
                                        "content_type": {"type": "string"},
                                        "size_bytes": {"type": "integer"},
                                        "last_modified": {"type": "string"},
                                        "status": {"type": "string", "enum": ["AVAILABLE"]}
                                    }
                                }
                            }
                        }
                    },
                    "default": error_response()
                }
            }
        }
    })
}

fn health_path() -> Value {
    json!({
        "/health": {
            "get": {
                "operationId": "health",
                "summary": "Check service health",
                "description": "Check health status of the service and its storage bucket.",
                "responses": {
                    "200": {
                        "description": "Health status of the service",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "status": {"type": "string", "enum": ["healthy", "degraded"]},
                                        "timestamp": {"type": "string", "format": "date-time"},
                                        "credentials_valid": {"type": "boolean"},
                                        "bucket_configured": {"type": "boolean"},
                                        "bucket_reachable": {"type": "boolean"},
                                        "s3_bucket": {"type": "string"},
                                        "service": {"type": "string"},
                                        "version": {"type": "string"}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

fn info(kind: ServiceKind) -> Value {
    let (title, description) = match kind {
        ServiceKind::Diagram => (
            "Architecture Diagram Generator",
            "Generate architecture diagrams from AWS service names. Creates images saved to S3.",
        ),
        ServiceKind::Document => (
            "PDF Documentation Generator",
            "Generate PDF documentation from Markdown content with optional architecture diagram embedding.",
        ),
        ServiceKind::All => (
            "Architecture Documentation Generator",
            "Generate architecture diagrams and PDF documentation saved to S3.",
        ),
    };
    json!({
        "title": title,
        "description": description,
        "version": SCHEMA_VERSION,
    })
}

fn merge_into(paths: &mut Map<String, Value>, more: Value) {
    if let Value::Object(more) = more {
        paths.extend(more);
    }
}

/// Build the OpenAPI document for the actions of `kind`.
#[must_use]
pub fn openapi_schema(kind: ServiceKind) -> Value {
    let mut paths = Map::new();
    if kind.includes_diagrams() {
        merge_into(&mut paths, diagram_paths());
    }
    if kind.includes_documents() {
        merge_into(&mut paths, document_paths());
    }
    merge_into(&mut paths, health_path());

    json!({
        "openapi": OPENAPI_VERSION,
        "info": info(kind),
        "paths": paths,
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "status": {"type": "string", "enum": ["ERROR"]},
                        "s3_uri": {"type": "string"},
                        "error_message": {"type": "string"}
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn path_names(schema: &Value) -> Vec<&str> {
        let mut names: Vec<&str> = schema["paths"]
            .as_object()
            .map(|paths| paths.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_diagram_schema() {
        let schema = openapi_schema(ServiceKind::Diagram);

        assert_eq!(schema["openapi"], "3.0.3");
        assert_eq!(path_names(&schema), vec!["/generateDiagram", "/health"]);
        assert_eq!(
            schema["paths"]["/generateDiagram"]["post"]["operationId"],
            "generateDiagram"
        );
    }

    #[test]
    fn test_document_schema() {
        let schema = openapi_schema(ServiceKind::Document);

        assert_eq!(
            path_names(&schema),
            vec!["/generatePDFDocumentation", "/getPDFDocumentationDetail", "/health"]
        );
        assert_eq!(
            schema["paths"]["/generatePDFDocumentation"]["post"]["responses"]["200"]["content"]
                ["application/json"]["schema"]["type"],
            "boolean"
        );
        assert_eq!(
            schema["paths"]["/getPDFDocumentationDetail"]["get"]["parameters"][0]["name"],
            "s3_uri"
        );
    }

    #[test]
    fn test_all_schema_merges_both() {
        let schema = openapi_schema(ServiceKind::All);
        assert_eq!(path_names(&schema).len(), 4);
        assert_eq!(schema["info"]["title"], "Architecture Documentation Generator");
    }
}
