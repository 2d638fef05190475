// SPDX-License-Identifier: MIT

//! Two-click connection gesture: pick an output port, then an input port

use super::graph::{Connection, GraphModel, NodeId};

/// Which side of a node a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Input,
    Output,
}

/// What a port click did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Source port armed
    Started(NodeId),
    /// Pending source dropped
    Cancelled,
    /// A new connection was added to the graph
    Connected(Connection),
    /// The target was picked but the graph refused the edge
    Rejected,
    /// Click had no effect (missing port, input picked while idle)
    Ignored,
}

/// Pending-source state machine
#[derive(Debug, Clone, Default)]
pub struct ConnectionProtocol {
    pending: Option<(NodeId, PortKind)>,
}

impl ConnectionProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&NodeId> {
        self.pending.as_ref().map(|(id, _)| id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Dispatch a click on `port` of `node`
    pub fn pick(&mut self, graph: &mut GraphModel, node: &str, port: PortKind) -> ConnectOutcome {
        let Some(kind) = graph.node(node).map(|n| n.kind) else {
            return ConnectOutcome::Ignored;
        };
        let exists = match port {
            PortKind::Output => kind.has_output_port(),
            PortKind::Input => kind.has_input_port(),
        };
        if !exists {
            log::debug!("Node '{}' has no {:?} port", node, port);
            return ConnectOutcome::Ignored;
        }

        match (port, self.pending.take()) {
            (PortKind::Output, None) => {
                self.pending = Some((node.to_string(), PortKind::Output));
                ConnectOutcome::Started(node.to_string())
            }
            // Only one source may be pending: any output click while armed disarms
            (PortKind::Output, Some(_)) => ConnectOutcome::Cancelled,
            (PortKind::Input, None) => ConnectOutcome::Ignored,
            (PortKind::Input, Some((from, _))) => {
                if graph.add_connection(&from, node) {
                    ConnectOutcome::Connected(Connection::new(from, node))
                } else {
                    ConnectOutcome::Rejected
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::graph::{NodeKind, Point};

    fn graph() -> (GraphModel, NodeId, NodeId, NodeId) {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::default(), None);
        let a = graph.add_node(NodeKind::Agent, Point::default(), Some("a"));
        let o = graph.add_node(NodeKind::Output, Point::default(), None);
        (graph, i, a, o)
    }

    #[test]
    fn test_output_then_input_connects() {
        let (mut g, i, a, _) = graph();
        let mut proto = ConnectionProtocol::new();

        assert_eq!(
            proto.pick(&mut g, &i, PortKind::Output),
            ConnectOutcome::Started(i.clone())
        );
        assert_eq!(
            proto.pick(&mut g, &a, PortKind::Input),
            ConnectOutcome::Connected(Connection::new(i.clone(), a.clone()))
        );
        assert!(!proto.is_pending());
        assert!(g.has_connection(&i, &a));
    }

    #[test]
    fn test_same_output_twice_toggles_off() {
        let (mut g, i, _, _) = graph();
        let mut proto = ConnectionProtocol::new();
        proto.pick(&mut g, &i, PortKind::Output);
        assert_eq!(
            proto.pick(&mut g, &i, PortKind::Output),
            ConnectOutcome::Cancelled
        );
        assert!(!proto.is_pending());
    }

    #[test]
    fn test_other_output_while_pending_cancels() {
        let (mut g, i, a, _) = graph();
        let mut proto = ConnectionProtocol::new();
        proto.pick(&mut g, &i, PortKind::Output);
        assert_eq!(
            proto.pick(&mut g, &a, PortKind::Output),
            ConnectOutcome::Cancelled
        );
        assert_eq!(proto.pending(), None);
    }

    #[test]
    fn test_input_while_idle_ignored() {
        let (mut g, _, a, _) = graph();
        let mut proto = ConnectionProtocol::new();
        assert_eq!(
            proto.pick(&mut g, &a, PortKind::Input),
            ConnectOutcome::Ignored
        );
        assert!(g.connections().is_empty());
    }

    #[test]
    fn test_duplicate_returns_to_idle() {
        let (mut g, i, a, _) = graph();
        let mut proto = ConnectionProtocol::new();
        proto.pick(&mut g, &i, PortKind::Output);
        proto.pick(&mut g, &a, PortKind::Input);

        proto.pick(&mut g, &i, PortKind::Output);
        assert_eq!(
            proto.pick(&mut g, &a, PortKind::Input),
            ConnectOutcome::Rejected
        );
        assert!(!proto.is_pending());
        assert_eq!(g.connections().len(), 1);
    }

    #[test]
    fn test_self_connection_rejected() {
        let (mut g, _, a, _) = graph();
        let mut proto = ConnectionProtocol::new();
        proto.pick(&mut g, &a, PortKind::Output);
        assert_eq!(
            proto.pick(&mut g, &a, PortKind::Input),
            ConnectOutcome::Rejected
        );
        assert!(g.connections().is_empty());
    }

    #[test]
    fn test_missing_ports_ignored() {
        let (mut g, i, _, o) = graph();
        let mut proto = ConnectionProtocol::new();
        assert_eq!(
            proto.pick(&mut g, &o, PortKind::Output),
            ConnectOutcome::Ignored
        );
        proto.pick(&mut g, &i, PortKind::Output);
        assert_eq!(
            proto.pick(&mut g, &i, PortKind::Input),
            ConnectOutcome::Ignored
        );
        // still armed: clicking a port that does not exist changes nothing
        assert_eq!(proto.pending(), Some(&i));
    }
}
