// SPDX-License-Identifier: MIT

//! Request and response bodies of the catalog service

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::editor::document::{DocumentLoader, WorkflowDocument};
use crate::error::EditorError;

/// An agent available for the palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Everything else the service reports (code, timestamps, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Workflow ids are integers on the wire but opaque strings here
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WorkflowId {
    Number(i64),
    Text(String),
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowId::Number(n) => write!(f, "{}", n),
            WorkflowId::Text(s) => f.write_str(s),
        }
    }
}

/// A persisted workflow as fetched by id
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRecord {
    #[serde(default)]
    pub id: Option<WorkflowId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Document object, or the document JSON-encoded in a string
    #[serde(default)]
    pub workflow_definition: Value,
}

impl WorkflowRecord {
    pub fn document(&self) -> Result<WorkflowDocument, EditorError> {
        DocumentLoader::from_definition(self.workflow_definition.clone())
    }
}

/// Body of a create request
#[derive(Debug, Clone, Serialize)]
pub struct NewWorkflow {
    pub name: String,
    pub description: String,
    pub workflow_definition: WorkflowDocument,
    pub category: String,
}

/// Body of an update request
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowUpdate {
    pub name: String,
    pub workflow_definition: WorkflowDocument,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedWorkflow {
    pub workflow_id: WorkflowId,
}

/// Result of a remote execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}
