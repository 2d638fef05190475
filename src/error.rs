// SPDX-License-Identifier: MIT

//! Typed error handling for agentflow-rs
//!
//! Structural rejections (self-loops, duplicate edges, unknown ids) are not
//! errors: graph mutators report them as `false` and move on. Everything
//! here is something the user has to be told about.

use thiserror::Error;

/// Top-level error type used by the binary
#[derive(Debug, Error)]
pub enum FlowError {
    /// Editor precondition and input errors
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Remote catalog/persistence failures
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the graph editor engine
#[derive(Debug, Error)]
pub enum EditorError {
    /// Hand-edited configuration text did not parse
    #[error("Invalid configuration for node '{node}': {reason}")]
    MalformedConfig { node: String, reason: String },

    /// Save or layout attempted on an empty canvas
    #[error("Canvas is empty")]
    EmptyCanvas,

    /// Save attempted without an input node
    #[error("Workflow has no input node")]
    MissingInput,

    /// The chain walk would drop a branch
    #[error("Sequence branches at node '{node}' ({successors} outgoing connections)")]
    BranchingSequence { node: String, successors: usize },

    /// Template applied over existing nodes without confirmation
    #[error("Canvas is not empty; confirm before replacing it")]
    CanvasNotEmpty,

    /// Node record with an unrecognized `type`
    #[error("Unknown node type '{kind}' for node '{node}'")]
    UnknownNodeKind { node: String, kind: String },

    /// Unknown template name
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    /// Persisted document did not have the expected shape
    #[error("Invalid workflow document: {0}")]
    InvalidDocument(String),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the agent/workflow catalog service
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Non-success response, carrying the server's error detail verbatim
    #[error("Catalog API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP transport errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Response body did not decode
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Bad base URL or endpoint path
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    /// Workflow id that cannot stand as a single path segment
    #[error("Invalid workflow id '{0}'")]
    InvalidId(String),

    /// Configuration errors (invalid env values)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    /// Create a malformed-config error
    pub fn malformed_config(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedConfig {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }
}

impl CatalogError {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<&str> for FlowError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for FlowError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_api_error_keeps_raw_detail() {
        let err = CatalogError::api(500, "Workflow not found");
        assert_eq!(
            err.to_string(),
            "Catalog API error (500): Workflow not found"
        );
    }

    #[test]
    fn test_editor_error_converts_into_flow_error() {
        let err: FlowError = EditorError::EmptyCanvas.into();
        assert!(matches!(err, FlowError::Editor(EditorError::EmptyCanvas)));
        assert_eq!(err.to_string(), "Canvas is empty");
    }

    #[test]
    fn test_branching_message_names_node() {
        let err = EditorError::BranchingSequence {
            node: "node-2".to_string(),
            successors: 2,
        };
        assert!(err.to_string().contains("node-2"));
    }
}
