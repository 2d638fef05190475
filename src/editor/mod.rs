// SPDX-License-Identifier: MIT

//! Node-graph editor engine
//!
//! `EditorSession` ties the pieces together; the submodules are usable on
//! their own for headless processing (the CLI, tests).

pub mod connect;
pub mod document;
pub mod gesture;
pub mod graph;
pub mod history;
pub mod layout;
pub mod session;
pub mod settings;
pub mod template;
pub mod view;

pub use session::{
    EditorEvent, EditorSession, EventOutcome, Notice, NoticeLevel, PointerButton, PointerTarget,
};
pub use settings::EditorSettings;
