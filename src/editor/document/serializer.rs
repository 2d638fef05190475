// SPDX-License-Identifier: MIT

//! Graph -> persisted document
//!
//! `sequence` comes from a linear walk starting at the input node. A node
//! on that walk with more than one outgoing connection is rejected by
//! [`save`]: the flat sequence could not represent the branch.
//! [`save_lossless`] writes such graphs anyway, relying on `visual`.

use std::collections::HashSet;

use super::types::{NodeRecord, SequenceStep, VisualBlock, WorkflowDocument};
use crate::editor::graph::{AgentConfig, GraphModel, NodeConfig, NodeKind};
use crate::error::EditorError;

/// Build the document for `graph`.
///
/// Fails on an empty canvas, a graph without an input node, or a branching
/// chain. Nothing is mutated either way.
pub fn save(graph: &GraphModel) -> Result<WorkflowDocument, EditorError> {
    if graph.is_empty() {
        return Err(EditorError::EmptyCanvas);
    }
    let steps = walk_chain(graph)?;
    Ok(document(graph, steps))
}

/// Build the document for `graph`, writing it even when `sequence` cannot
/// describe the graph.
///
/// `visual` always carries the full graph. A branching chain contributes the
/// steps up to and including the branching node; a graph without an input
/// node gets an empty `sequence`. Those problems come back as warnings. Only
/// an empty canvas is an error.
pub fn save_lossless(
    graph: &GraphModel,
) -> Result<(WorkflowDocument, Vec<EditorError>), EditorError> {
    if graph.is_empty() {
        return Err(EditorError::EmptyCanvas);
    }
    let mut warnings = Vec::new();
    let steps = match walk(graph) {
        Ok(walk) => {
            if let Some((node, successors)) = walk.branch {
                warnings.push(EditorError::BranchingSequence {
                    node: node.to_string(),
                    successors,
                });
            }
            walk.steps
        }
        Err(err) => {
            warnings.push(err);
            Vec::new()
        }
    };
    for warning in &warnings {
        log::warn!("Sequence is incomplete: {}", warning);
    }
    Ok((document(graph, steps), warnings))
}

fn document(graph: &GraphModel, steps: Vec<AgentConfig>) -> WorkflowDocument {
    let sequence = steps
        .into_iter()
        .map(SequenceStep::Agent)
        .collect::<Vec<_>>();

    let agents = graph
        .nodes()
        .filter_map(|n| n.config.as_agent())
        .map(|cfg| cfg.agent_name.clone())
        .collect();

    let visual = VisualBlock {
        nodes: graph.nodes().map(NodeRecord::from).collect(),
        connections: graph.connections().to_vec(),
    };

    log::info!(
        "Serialized workflow: {} nodes, {} sequence steps",
        visual.nodes.len(),
        sequence.len()
    );

    WorkflowDocument {
        agents,
        sequence,
        visual: Some(visual),
    }
}

/// Agent configs along the chain from the input node, in walk order
pub fn walk_chain(graph: &GraphModel) -> Result<Vec<AgentConfig>, EditorError> {
    let walk = walk(graph)?;
    match walk.branch {
        Some((node, successors)) => Err(EditorError::BranchingSequence {
            node: node.to_string(),
            successors,
        }),
        None => Ok(walk.steps),
    }
}

struct Walk<'a> {
    steps: Vec<AgentConfig>,
    /// Node the walk stopped at because it fans out, with its successor count
    branch: Option<(&'a str, usize)>,
}

fn walk(graph: &GraphModel) -> Result<Walk<'_>, EditorError> {
    let inputs: Vec<&str> = graph
        .nodes()
        .filter(|n| n.kind == NodeKind::Input)
        .map(|n| n.id.as_str())
        .collect();
    let Some(&start) = inputs.first() else {
        return Err(EditorError::MissingInput);
    };
    if inputs.len() > 1 {
        log::warn!(
            "Graph has {} input nodes, walking from '{}'",
            inputs.len(),
            start
        );
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut steps = Vec::new();
    let mut current = start;

    loop {
        visited.insert(current);
        if let Some(NodeConfig::Agent(cfg)) = graph.node(current).map(|n| &n.config) {
            steps.push(cfg.clone());
        }

        let successors: Vec<&str> = graph.successors(current).collect();
        if successors.len() > 1 {
            return Ok(Walk {
                steps,
                branch: Some((current, successors.len())),
            });
        }
        match successors.into_iter().find(|s| !visited.contains(s)) {
            Some(next) => current = next,
            None => break,
        }
    }

    Ok(Walk {
        steps,
        branch: None,
    })
}
