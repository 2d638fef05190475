// SPDX-License-Identifier: MIT

//! Modal pointer gestures: node drag and canvas pan
//!
//! At most one gesture is active; it ends on pointer release.

use super::graph::{GraphModel, NodeId, Point};
use super::view::{PanGesture, ViewTransform};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// `grab` is the cursor offset from the node origin, in model space
    DraggingNode {
        id: NodeId,
        grab: Point,
        origin: Point,
    },
    Panning(PanGesture),
}

/// How a finished gesture left the graph
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEnd {
    None,
    /// A node drag ended somewhere other than where it started
    NodeMoved { id: NodeId, from: Point, to: Point },
    /// Node drag released in place, or a pan
    Unchanged,
}

impl Gesture {
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }

    /// Start dragging `id` from the screen point `cursor`
    pub fn drag(graph: &GraphModel, view: &ViewTransform, id: &str, cursor: Point) -> Option<Self> {
        let node = graph.node(id)?;
        Some(Gesture::DraggingNode {
            id: node.id.clone(),
            grab: view.to_model(cursor) - node.position,
            origin: node.position,
        })
    }

    pub fn pan(view: &ViewTransform, cursor: Point) -> Self {
        Gesture::Panning(PanGesture::begin(view, cursor))
    }

    /// Track the cursor. Returns `true` if anything on screen moved.
    pub fn track(&self, graph: &mut GraphModel, view: &mut ViewTransform, cursor: Point) -> bool {
        match self {
            Gesture::Idle => false,
            Gesture::DraggingNode { id, grab, .. } => {
                let target = view.to_model(cursor) - *grab;
                graph.move_node(id, target)
            }
            Gesture::Panning(pan) => {
                pan.update(view, cursor);
                true
            }
        }
    }

    /// End the gesture, leaving `Idle` behind
    pub fn finish(&mut self, graph: &GraphModel) -> GestureEnd {
        match std::mem::take(self) {
            Gesture::Idle => GestureEnd::None,
            Gesture::DraggingNode { id, origin, .. } => match graph.node(&id) {
                Some(node) if node.position != origin => GestureEnd::NodeMoved {
                    to: node.position,
                    from: origin,
                    id,
                },
                _ => GestureEnd::Unchanged,
            },
            Gesture::Panning(_) => GestureEnd::Unchanged,
        }
    }
}
