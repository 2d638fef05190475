// SPDX-License-Identifier: MIT

//! Persisted document -> graph, plus text/file parsing
//!
//! Documents with a `visual` block are rebuilt verbatim. Legacy documents
//! only carry `sequence`; they become a straight chain that is then laid out.

use std::fs;
use std::path::Path;

use super::types::{DefinitionPayload, WorkflowDocument};
use crate::editor::graph::{AgentConfig, GraphModel, Node, NodeConfig, NodeKind};
use crate::editor::layout::LayoutEngine;
use crate::editor::settings::EditorSettings;
use crate::error::EditorError;

/// What a load did to the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// The document had no `visual` block and was rebuilt as a chain
    pub migrated: bool,
    pub nodes: usize,
    pub connections: usize,
    /// Connections from the document that the graph refused
    pub dropped_connections: usize,
}

/// Replace the contents of `graph` with `doc`.
///
/// Node records are validated before the graph is touched, so a bad
/// document leaves it as it was.
pub fn restore(
    graph: &mut GraphModel,
    doc: &WorkflowDocument,
    settings: &EditorSettings,
) -> Result<LoadReport, EditorError> {
    let Some(visual) = &doc.visual else {
        let steps = doc.resolved_steps();
        build_chain(graph, &steps, settings);
        LayoutEngine::new(settings.spacing.clone()).apply(graph)?;
        log::info!("Migrated legacy document with {} steps", steps.len());
        return Ok(LoadReport {
            migrated: true,
            nodes: graph.len(),
            connections: graph.connections().len(),
            dropped_connections: 0,
        });
    };

    let nodes = visual
        .nodes
        .iter()
        .map(Node::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    graph.clear();
    for node in nodes {
        let id = node.id.clone();
        if !graph.insert_node(node) {
            log::warn!("Skipping duplicate node '{}'", id);
        }
    }

    let mut dropped = 0;
    for conn in &visual.connections {
        if !graph.add_connection(&conn.from, &conn.to) {
            log::warn!("Dropping invalid connection {} -> {}", conn.from, conn.to);
            dropped += 1;
        }
    }

    log::info!(
        "Loaded document: {} nodes, {} connections",
        graph.len(),
        graph.connections().len()
    );
    Ok(LoadReport {
        migrated: false,
        nodes: graph.len(),
        connections: graph.connections().len(),
        dropped_connections: dropped,
    })
}

/// Clear `graph` and lay down Input -> steps... -> Output on one row.
///
/// Shared by legacy migration and template instantiation. Positions start at
/// `chain_origin` and advance by `chain_step`; callers run layout afterwards.
pub fn build_chain(graph: &mut GraphModel, steps: &[AgentConfig], settings: &EditorSettings) {
    graph.clear();
    let mut position = settings.chain_origin;
    let mut previous = graph.add_node(NodeKind::Input, position, None);

    for step in steps {
        position = position.offset(settings.chain_step, 0.0);
        let id = graph.add_node(NodeKind::Agent, position, Some(&step.agent_name));
        graph.set_node_config(&id, NodeConfig::Agent(step.clone()));
        graph.add_connection(&previous, &id);
        previous = id;
    }

    position = position.offset(settings.chain_step, 0.0);
    let output = graph.add_node(NodeKind::Output, position, None);
    graph.add_connection(&previous, &output);
}

/// Parses persisted documents from text or files
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a document file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowDocument, EditorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            _ => Self::parse_json(&content),
        }
    }

    /// Parse JSON text, accepting a document or a JSON string that encodes one
    pub fn parse_json(content: &str) -> Result<WorkflowDocument, EditorError> {
        let payload: DefinitionPayload = serde_json::from_str(content)?;
        payload.into_document()
    }

    pub fn parse_yaml(content: &str) -> Result<WorkflowDocument, EditorError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Decode a `workflow_definition` value as served by the catalog
    pub fn from_definition(value: serde_json::Value) -> Result<WorkflowDocument, EditorError> {
        if value.is_null() {
            return Err(EditorError::invalid_document("workflow_definition is missing"));
        }
        let payload: DefinitionPayload = serde_json::from_value(value)
            .map_err(|e| EditorError::invalid_document(e.to_string()))?;
        payload.into_document()
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::document::save;
    use crate::editor::graph::Point;
    use serde_json::json;

    fn chain_graph() -> GraphModel {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::new(10.0, 20.0), None);
        let a = graph.add_node(NodeKind::Agent, Point::new(300.0, 20.0), Some("a"));
        let o = graph.add_node(NodeKind::Output, Point::new(600.0, 40.0), None);
        graph.add_connection(&i, &a);
        graph.add_connection(&a, &o);
        graph
    }

    #[test]
    fn test_round_trip_preserves_ids_and_positions() {
        let original = chain_graph();
        let doc = save(&original).unwrap();

        let mut loaded = GraphModel::new();
        let report = restore(&mut loaded, &doc, &EditorSettings::default()).unwrap();

        assert!(!report.migrated);
        assert_eq!(report.dropped_connections, 0);
        let a: Vec<&Node> = original.nodes().collect();
        let b: Vec<&Node> = loaded.nodes().collect();
        assert_eq!(a, b);
        assert_eq!(original.connections(), loaded.connections());
        assert_eq!(loaded.next_id(), 4);
    }

    #[test]
    fn test_legacy_document_becomes_chain() {
        let doc = DocumentLoader::parse_json(
            r#"{"sequence": [{"agent_name": "a"}, {"agent_name": "b"}]}"#,
        )
        .unwrap();
        let mut graph = GraphModel::new();
        let report = restore(&mut graph, &doc, &EditorSettings::default()).unwrap();

        assert!(report.migrated);
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.connections().len(), 3);
        let kinds: Vec<NodeKind> = graph.nodes().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Input,
                NodeKind::Agent,
                NodeKind::Agent,
                NodeKind::Output
            ]
        );
        let steps = crate::editor::document::walk_chain(&graph).unwrap();
        assert_eq!(
            steps[0],
            serde_json::from_value(json!({"agent_name": "a"})).unwrap()
        );
    }

    #[test]
    fn test_legacy_step_saved_back_unchanged() {
        let step = json!({"agent": "w", "params": {"k": 1}});
        let doc = DocumentLoader::parse_json(&json!({"sequence": [step.clone()]}).to_string())
            .unwrap();
        let mut graph = GraphModel::new();
        restore(&mut graph, &doc, &EditorSettings::default()).unwrap();

        let saved = serde_json::to_value(save(&graph).unwrap()).unwrap();
        assert_eq!(saved["sequence"], json!([step.clone()]));
        assert_eq!(saved["agents"], json!(["w"]));
        let agent = saved["visual"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["type"] == "agent")
            .unwrap();
        assert_eq!(agent["config"], step);
    }

    #[test]
    fn test_huge_persisted_id_loads() {
        let doc = DocumentLoader::parse_json(
            &json!({
                "visual": {
                    "nodes": [
                        {"id": "node-18446744073709551615", "type": "input", "x": 0, "y": 0}
                    ],
                    "connections": []
                }
            })
            .to_string(),
        )
        .unwrap();
        let mut graph = GraphModel::new();
        let report = restore(&mut graph, &doc, &EditorSettings::default()).unwrap();
        assert_eq!(report.nodes, 1);
        assert_eq!(
            graph.add_node(NodeKind::Output, Point::default(), None),
            "node-1"
        );
    }

    #[test]
    fn test_empty_legacy_document_links_input_to_output() {
        let mut graph = GraphModel::new();
        restore(
            &mut graph,
            &WorkflowDocument::default(),
            &EditorSettings::default(),
        )
        .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_invalid_connections_dropped() {
        let doc = DocumentLoader::parse_json(
            &json!({
                "agents": [],
                "sequence": [],
                "visual": {
                    "nodes": [
                        {"id": "node-4", "type": "input", "x": 0, "y": 0},
                        {"id": "node-9", "type": "output", "x": 1, "y": 0}
                    ],
                    "connections": [
                        {"from": "node-4", "to": "node-9"},
                        {"from": "node-4", "to": "node-9"},
                        {"from": "node-4", "to": "node-77"}
                    ]
                }
            })
            .to_string(),
        )
        .unwrap();
        let mut graph = GraphModel::new();
        let report = restore(&mut graph, &doc, &EditorSettings::default()).unwrap();
        assert_eq!(report.connections, 1);
        assert_eq!(report.dropped_connections, 2);
        assert_eq!(graph.next_id(), 10);
    }

    #[test]
    fn test_bad_record_leaves_graph_untouched() {
        let mut graph = chain_graph();
        let doc = DocumentLoader::parse_json(
            &json!({
                "visual": {
                    "nodes": [{"id": "n", "type": "agent", "x": 0, "y": 0, "config": 5}],
                    "connections": []
                }
            })
            .to_string(),
        )
        .unwrap();
        let err = restore(&mut graph, &doc, &EditorSettings::default()).unwrap_err();
        assert!(matches!(err, EditorError::MalformedConfig { .. }));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_parse_double_encoded_json() {
        let inner = json!({"agents": ["a"], "sequence": [0]}).to_string();
        let outer = serde_json::to_string(&inner).unwrap();
        let doc = DocumentLoader::parse_json(&outer).unwrap();
        assert_eq!(doc.resolved_steps(), vec![AgentConfig::new("a")]);
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
agents: [writer]
sequence:
  - agent: writer
    output_key: draft
"#;
        let doc = DocumentLoader::parse_yaml(yaml).unwrap();
        let steps = doc.resolved_steps();
        assert_eq!(steps[0].agent_name, "writer");
        assert_eq!(steps[0].output_key, "draft");
    }

    #[test]
    fn test_missing_definition() {
        let err = DocumentLoader::from_definition(serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, EditorError::InvalidDocument(_)));
    }
}
