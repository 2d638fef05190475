// SPDX-License-Identifier: MIT

//! Graph-level shape checks
//!
//! Advisory only: nothing here blocks an edit or a save. Agent semantics
//! (parameter types, side effects) are not looked at.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use super::model::GraphModel;
use super::types::{NodeId, NodeKind};

/// A structural problem with the current graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeIssue {
    NoInput,
    NoOutput,
    MultipleInputs(Vec<NodeId>),
    /// Nodes that sit on or behind a cycle
    Cycle(Vec<NodeId>),
    /// No path leads from any input to this output
    OutputUnreachable(NodeId),
    /// Node without any connection
    Orphan(NodeId),
}

impl fmt::Display for ShapeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeIssue::NoInput => write!(f, "no input node"),
            ShapeIssue::NoOutput => write!(f, "no output node"),
            ShapeIssue::MultipleInputs(ids) => {
                write!(f, "multiple input nodes: {}", ids.join(", "))
            }
            ShapeIssue::Cycle(ids) => write!(f, "cycle through: {}", ids.join(", ")),
            ShapeIssue::OutputUnreachable(id) => {
                write!(f, "output node '{}' is not reachable from an input", id)
            }
            ShapeIssue::Orphan(id) => write!(f, "node '{}' has no connections", id),
        }
    }
}

/// Kahn's algorithm over the graph.
///
/// Returns the topological order, or the nodes left over when a cycle
/// prevents completion.
pub fn topological_order(graph: &GraphModel) -> Result<Vec<NodeId>, Vec<NodeId>> {
    let mut in_degree: HashMap<&str, usize> = graph.nodes().map(|n| (n.id.as_str(), 0)).collect();
    for conn in graph.connections() {
        if let Some(d) = in_degree.get_mut(conn.to.as_str()) {
            *d += 1;
        }
    }

    let mut queue: VecDeque<&str> = graph
        .nodes()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());
        for next in graph.successors(current) {
            if let Some(d) = in_degree.get_mut(next) {
                *d -= 1;
                if *d == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let done: HashSet<&str> = order.iter().map(|s| s.as_str()).collect();
        Err(graph
            .nodes()
            .filter(|n| !done.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect())
    }
}

impl GraphModel {
    /// Report connectivity, cycle and input/output problems
    pub fn analyze(&self) -> Vec<ShapeIssue> {
        let mut issues = Vec::new();
        if self.is_empty() {
            return issues;
        }

        let inputs: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.kind == NodeKind::Input)
            .map(|n| n.id.clone())
            .collect();
        let outputs: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.kind == NodeKind::Output)
            .map(|n| n.id.clone())
            .collect();

        match inputs.len() {
            0 => issues.push(ShapeIssue::NoInput),
            1 => {}
            _ => issues.push(ShapeIssue::MultipleInputs(inputs.clone())),
        }
        if outputs.is_empty() {
            issues.push(ShapeIssue::NoOutput);
        }

        if let Err(stuck) = topological_order(self) {
            issues.push(ShapeIssue::Cycle(stuck));
        }

        let reachable = self.reachable_from(&inputs);
        for output in &outputs {
            if !inputs.is_empty() && !reachable.contains(output.as_str()) {
                issues.push(ShapeIssue::OutputUnreachable(output.clone()));
            }
        }

        if self.len() > 1 {
            for node in self.nodes() {
                if !self.connections().iter().any(|c| c.touches(&node.id)) {
                    issues.push(ShapeIssue::Orphan(node.id.clone()));
                }
            }
        }

        issues
    }

    fn reachable_from(&self, roots: &[NodeId]) -> HashSet<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        for root in roots {
            if let Some(node) = self.node(root) {
                stack.push(node.id.as_str());
            }
        }
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.successors(id));
            }
        }
        seen
    }
}
