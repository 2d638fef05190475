// SPDX-License-Identifier: MIT

//! Persisted "agents + sequence + visual" documents

mod loader;
mod serializer;
pub mod types;

pub use loader::{build_chain, restore, DocumentLoader, LoadReport};
pub use serializer::{save, save_lossless, walk_chain};
pub use types::{DefinitionPayload, NodeRecord, SequenceStep, VisualBlock, WorkflowDocument};
