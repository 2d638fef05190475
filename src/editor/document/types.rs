// SPDX-License-Identifier: MIT

//! Persisted workflow document types
//!
//! Shape: `{agents: [..], sequence: [..], visual: {nodes: [..], connections: [..]}}`.
//! `visual` is absent in legacy documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::graph::{AgentConfig, Connection, Node, NodeConfig, NodeKind, Point};
use crate::error::EditorError;

/// The executable sequence definition plus the visual layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// Agent names in node-creation order
    #[serde(default)]
    pub agents: Vec<String>,
    /// Agent configs in chain order
    #[serde(default)]
    pub sequence: Vec<SequenceStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualBlock>,
}

impl WorkflowDocument {
    /// Agent configs of the sequence, resolving legacy index entries against `agents`
    pub fn resolved_steps(&self) -> Vec<AgentConfig> {
        let steps: Vec<AgentConfig> = self
            .sequence
            .iter()
            .filter_map(|step| match step {
                SequenceStep::Agent(cfg) => Some(cfg.clone()),
                SequenceStep::Index(i) => match self.agents.get(*i) {
                    Some(name) => Some(AgentConfig::new(name.clone())),
                    None => {
                        log::warn!("Sequence index {} is out of range, skipping", i);
                        None
                    }
                },
            })
            .collect();

        if steps.is_empty() && self.sequence.is_empty() {
            self.agents
                .iter()
                .map(|name| AgentConfig::new(name.clone()))
                .collect()
        } else {
            steps
        }
    }
}

/// One entry of `sequence`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SequenceStep {
    /// Older documents list indexes into `agents`
    Index(usize),
    Agent(AgentConfig),
}

/// Full node and connection lists, for lossless reconstruction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualBlock {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Persisted form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub config: Value,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind.as_str().to_string(),
            x: node.position.x,
            y: node.position.y,
            config: node.config.to_value(),
        }
    }
}

impl TryFrom<&NodeRecord> for Node {
    type Error = EditorError;

    fn try_from(record: &NodeRecord) -> Result<Self, Self::Error> {
        let kind = NodeKind::parse(&record.kind).ok_or_else(|| EditorError::UnknownNodeKind {
            node: record.id.clone(),
            kind: record.kind.clone(),
        })?;
        let config = if record.config.is_null() {
            NodeConfig::default_for(kind, None)
        } else {
            NodeConfig::from_value(kind, record.config.clone())
                .map_err(|e| EditorError::malformed_config(&record.id, e.to_string()))?
        };
        Ok(Node {
            id: record.id.clone(),
            kind,
            position: Point::new(record.x, record.y),
            config,
        })
    }
}

/// `workflow_definition` as served: an object, or the same object JSON-encoded in a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DefinitionPayload {
    Encoded(String),
    Document(WorkflowDocument),
}

impl DefinitionPayload {
    pub fn into_document(self) -> Result<WorkflowDocument, EditorError> {
        match self {
            DefinitionPayload::Document(doc) => Ok(doc),
            DefinitionPayload::Encoded(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_document_without_visual() {
        let doc: WorkflowDocument = serde_json::from_value(json!({
            "agents": ["a", "b"],
            "sequence": [{"agent_name": "a"}, {"agent_name": "b"}]
        }))
        .unwrap();
        assert!(doc.visual.is_none());
        let steps = doc.resolved_steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].agent_name, "b");
    }

    #[test]
    fn test_index_steps_resolve_against_agents() {
        let doc: WorkflowDocument = serde_json::from_value(json!({
            "agents": ["fetch", "summarize"],
            "sequence": [1, 0, 7]
        }))
        .unwrap();
        let names: Vec<String> = doc
            .resolved_steps()
            .into_iter()
            .map(|s| s.agent_name)
            .collect();
        assert_eq!(names, vec!["summarize", "fetch"]);
    }

    #[test]
    fn test_empty_sequence_falls_back_to_agents() {
        let doc: WorkflowDocument = serde_json::from_value(json!({
            "agents": ["only"]
        }))
        .unwrap();
        let steps = doc.resolved_steps();
        assert_eq!(steps, vec![AgentConfig::new("only")]);
    }

    #[test]
    fn test_visual_omitted_when_absent() {
        let doc = WorkflowDocument::default();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"agents": [], "sequence": []}));
    }

    #[test]
    fn test_node_record_unknown_type() {
        let record = NodeRecord {
            id: "node-1".to_string(),
            kind: "router".to_string(),
            x: 0.0,
            y: 0.0,
            config: Value::Null,
        };
        let err = Node::try_from(&record).unwrap_err();
        assert!(matches!(err, EditorError::UnknownNodeKind { .. }));
    }

    #[test]
    fn test_node_record_null_config_gets_default() {
        let record: NodeRecord = serde_json::from_value(json!({
            "id": "node-3", "type": "output", "x": 10, "y": 20
        }))
        .unwrap();
        let node = Node::try_from(&record).unwrap();
        assert_eq!(node.config, NodeConfig::default_for(NodeKind::Output, None));
        assert_eq!(node.position, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_double_encoded_definition() {
        let inner = json!({"agents": ["x"], "sequence": [{"agent_name": "x"}]}).to_string();
        let payload: DefinitionPayload = serde_json::from_value(Value::String(inner)).unwrap();
        let doc = payload.into_document().unwrap();
        assert_eq!(doc.agents, vec!["x"]);
    }
}
