// SPDX-License-Identifier: MIT

//! In-memory graph model
//!
//! This module provides the node/connection types, the `GraphModel` that
//! enforces the structural invariants, and advisory shape analysis.

mod analysis;
mod model;
pub mod types;

pub use analysis::{topological_order, ShapeIssue};
pub use model::{GraphModel, GraphSnapshot};
pub use types::{AgentConfig, Connection, Node, NodeConfig, NodeId, NodeKind, Point};
