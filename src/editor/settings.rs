// SPDX-License-Identifier: MIT

//! Editor tunables with their defaults

use super::graph::Point;
use super::history::MAX_HISTORY;
use super::layout::LayoutSpacing;
use super::view::{MAX_SCALE, MIN_SCALE};

#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    /// Retained undo snapshots
    pub history_limit: usize,
    pub min_scale: f64,
    pub max_scale: f64,
    pub spacing: LayoutSpacing,
    /// Where synthesized chains (legacy load, templates) start before layout
    pub chain_origin: Point,
    /// Horizontal pitch of synthesized chains
    pub chain_step: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: MAX_HISTORY,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            spacing: LayoutSpacing::default(),
            chain_origin: Point::new(100.0, 200.0),
            chain_step: 300.0,
        }
    }
}
