// SPDX-License-Identifier: MIT

//! Visual editor engine for agent pipelines
//!
//! - [`editor`]: graph model, history, pan/zoom, layout and the persisted
//!   document format
//! - [`catalog`]: client for the remote agent/workflow service

pub mod catalog;
pub mod editor;
pub mod error;

pub use error::{CatalogError, EditorError, FlowError};
