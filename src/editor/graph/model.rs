// SPDX-License-Identifier: MIT

//! The editable graph: nodes, connections and the id counter
//!
//! Node payloads and the connection list live behind `Arc`s so that a
//! snapshot is a handful of pointer copies; mutation goes through
//! `Arc::make_mut`, which only copies what a retained snapshot still shares.

use std::sync::Arc;

use super::types::{Connection, Node, NodeConfig, NodeId, NodeKind, Point};

/// Immutable point-in-time copy of the graph state
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<Arc<Node>>,
    connections: Arc<Vec<Connection>>,
    next_id: u64,
}

impl GraphSnapshot {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|n| n.as_ref())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

/// Owns the nodes and connections of one editing session
#[derive(Debug, Clone)]
pub struct GraphModel {
    /// Creation order is preserved; saving relies on it
    nodes: Vec<Arc<Node>>,
    connections: Arc<Vec<Connection>>,
    next_id: u64,
}

impl GraphModel {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Arc::new(Vec::new()),
            next_id: 1,
        }
    }

    /// Create a node with the default config for its kind and return its id
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        position: Point,
        agent_name: Option<&str>,
    ) -> NodeId {
        // Only a persisted id near u64::MAX can make the counter wrap; skip taken ids
        let id = loop {
            let candidate = format!("node-{}", self.next_id);
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if !self.contains(&candidate) {
                break candidate;
            }
        };
        self.nodes.push(Arc::new(Node {
            id: id.clone(),
            kind,
            position,
            config: NodeConfig::default_for(kind, agent_name),
        }));
        id
    }

    /// Insert a fully formed node, keeping its id.
    ///
    /// Used when reconstructing a persisted graph. Returns `false` if the id
    /// is taken or the config does not belong to the node's kind. The id
    /// counter is raised past any numeric `node-<n>` suffix, never lowered;
    /// a suffix with no successor in `u64` is treated as non-numeric.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.contains(&node.id) || node.config.kind() != node.kind {
            log::debug!("Rejected node insert for '{}'", node.id);
            return false;
        }
        if let Some(n) = node
            .id
            .strip_prefix("node-")
            .and_then(|s| s.parse::<u64>().ok())
            .and_then(|n| n.checked_add(1))
        {
            self.next_id = self.next_id.max(n);
        }
        self.nodes.push(Arc::new(node));
        true
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                if node.position != position {
                    Arc::make_mut(node).position = position;
                }
                true
            }
            None => false,
        }
    }

    /// Remove a node and every connection touching it
    pub fn delete_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        if self.connections.iter().any(|c| c.touches(id)) {
            Arc::make_mut(&mut self.connections).retain(|c| !c.touches(id));
        }
        true
    }

    /// Replace a node's config wholesale.
    ///
    /// The contents are the caller's business and are stored as given. The
    /// variant is the one thing checked: it guards the node's port kind, so a
    /// config of another kind is a no-op returning `false`.
    pub fn set_node_config(&mut self, id: &str, config: NodeConfig) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) if node.kind == config.kind() => {
                Arc::make_mut(node).config = config;
                true
            }
            Some(node) => {
                log::debug!(
                    "Rejected {} config for {} node '{}'",
                    config.kind().as_str(),
                    node.kind.as_str(),
                    id
                );
                false
            }
            None => false,
        }
    }

    /// Add `from -> to`.
    ///
    /// Self-loops, unknown ids, duplicates and endpoints lacking the needed
    /// port (an output node as source, an input node as target) are no-ops.
    pub fn add_connection(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            log::debug!("Rejected self-loop on '{}'", from);
            return false;
        }
        let (Some(source), Some(target)) = (self.node(from), self.node(to)) else {
            log::debug!("Rejected connection {} -> {}: unknown node", from, to);
            return false;
        };
        if !source.kind.has_output_port() || !target.kind.has_input_port() {
            log::debug!("Rejected connection {} -> {}: no such port", from, to);
            return false;
        }
        if self.has_connection(from, to) {
            return false;
        }
        Arc::make_mut(&mut self.connections).push(Connection::new(from, to));
        true
    }

    pub fn remove_connection(&mut self, from: &str, to: &str) -> bool {
        if !self.has_connection(from, to) {
            return false;
        }
        Arc::make_mut(&mut self.connections).retain(|c| !(c.from == from && c.to == to));
        true
    }

    /// Empty the canvas. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections = Arc::new(Vec::new());
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            connections: Arc::clone(&self.connections),
            next_id: self.next_id,
        }
    }

    /// Replace the whole state, id counter included
    pub fn restore(&mut self, snapshot: &GraphSnapshot) {
        self.nodes = snapshot.nodes.clone();
        self.connections = Arc::clone(&snapshot.connections);
        self.next_id = snapshot.next_id;
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|n| n.as_ref())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn has_connection(&self, from: &str, to: &str) -> bool {
        self.connections
            .iter()
            .any(|c| c.from == from && c.to == to)
    }

    /// Targets of `id`'s outgoing connections, in connection order
    pub fn successors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from == id)
            .map(|c| c.to.as_str())
    }

    pub fn predecessors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.to == id)
            .map(|c| c.from.as_str())
    }

    /// First input node in creation order
    pub fn input_node(&self) -> Option<&Node> {
        self.nodes().find(|n| n.kind == NodeKind::Input)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}
