// SPDX-License-Identifier: MIT

//! Pan/zoom transform and screen-space edge geometry
//!
//! `screen = translate + model * scale`. Nothing here looks at graph
//! content except `edge_paths`, which reads node positions to place ports.

use super::graph::{GraphModel, NodeId, Point};
use super::layout::LayoutSpacing;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 3.0;

/// Factor applied by the zoom-in button; zoom-out uses `ZOOM_OUT_STEP`
pub const ZOOM_IN_STEP: f64 = 1.2;
pub const ZOOM_OUT_STEP: f64 = 0.8;

/// Current zoom factor and offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub scale: f64,
    pub translate: Point,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Point::default(),
        }
    }
}

/// Maps model coordinates to screen coordinates under pan/zoom
#[derive(Debug, Clone)]
pub struct ViewTransform {
    state: ViewState,
    min_scale: f64,
    max_scale: f64,
}

impl ViewTransform {
    pub fn new() -> Self {
        Self::with_bounds(MIN_SCALE, MAX_SCALE)
    }

    pub fn with_bounds(min_scale: f64, max_scale: f64) -> Self {
        Self {
            state: ViewState::default(),
            min_scale,
            max_scale,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn translate(&self) -> Point {
        self.state.translate
    }

    pub fn to_screen(&self, model: Point) -> Point {
        self.state.translate + model.scaled(self.state.scale)
    }

    pub fn to_model(&self, screen: Point) -> Point {
        (screen - self.state.translate).scaled(1.0 / self.state.scale)
    }

    /// Rescale by `factor` keeping the model point under `anchor` fixed.
    ///
    /// Returns `false` when clamping leaves the scale unchanged.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> bool {
        let old = self.state.scale;
        let new = (old * factor).clamp(self.min_scale, self.max_scale);
        if new == old {
            return false;
        }
        let ratio = new / old;
        self.state.translate = anchor - (anchor - self.state.translate).scaled(ratio);
        self.state.scale = new;
        true
    }

    /// Mouse wheel: scrolling down zooms out by 10%, up zooms in by 10%
    pub fn wheel(&mut self, anchor: Point, delta_y: f64) -> bool {
        let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
        self.zoom_at(anchor, factor)
    }

    /// Unanchored zoom around the model origin
    pub fn zoom_in(&mut self) -> bool {
        self.rescale(ZOOM_IN_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.rescale(ZOOM_OUT_STEP)
    }

    fn rescale(&mut self, factor: f64) -> bool {
        let new = (self.state.scale * factor).clamp(self.min_scale, self.max_scale);
        let changed = new != self.state.scale;
        self.state.scale = new;
        changed
    }

    pub fn set_translate(&mut self, translate: Point) {
        self.state.translate = translate;
    }

    pub fn reset(&mut self) {
        self.state = ViewState::default();
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Active canvas pan: the cursor keeps a fixed offset from `translate`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    anchor: Point,
}

impl PanGesture {
    pub fn begin(view: &ViewTransform, cursor: Point) -> Self {
        Self {
            anchor: cursor - view.translate(),
        }
    }

    pub fn update(&self, view: &mut ViewTransform, cursor: Point) {
        view.set_translate(cursor - self.anchor);
    }
}

/// Output port anchor in model space: right edge, vertically centered
pub fn output_port(position: Point, spacing: &LayoutSpacing) -> Point {
    position.offset(spacing.node_width, spacing.node_height / 2.0)
}

/// Input port anchor in model space: left edge, vertically centered
pub fn input_port(position: Point, spacing: &LayoutSpacing) -> Point {
    position.offset(0.0, spacing.node_height / 2.0)
}

/// Screen-space curve for one connection
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub from: NodeId,
    pub to: NodeId,
    pub start: Point,
    pub end: Point,
}

impl EdgePath {
    /// Both control points share the horizontal midpoint
    pub fn control_points(&self) -> (Point, Point) {
        let mid_x = (self.start.x + self.end.x) / 2.0;
        (
            Point::new(mid_x, self.start.y),
            Point::new(mid_x, self.end.y),
        )
    }

    /// SVG path data: `M x1 y1 C mx y1, mx y2, x2 y2`
    pub fn svg_path(&self) -> String {
        let (c1, c2) = self.control_points();
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x, self.start.y, c1.x, c1.y, c2.x, c2.y, self.end.x, self.end.y
        )
    }
}

/// Recompute every edge curve from current node positions and view
pub fn edge_paths(
    graph: &GraphModel,
    view: &ViewTransform,
    spacing: &LayoutSpacing,
) -> Vec<EdgePath> {
    graph
        .connections()
        .iter()
        .filter_map(|conn| {
            let from = graph.node(&conn.from)?;
            let to = graph.node(&conn.to)?;
            Some(EdgePath {
                from: conn.from.clone(),
                to: conn.to.clone(),
                start: view.to_screen(output_port(from.position, spacing)),
                end: view.to_screen(input_port(to.position, spacing)),
            })
        })
        .collect()
}

/// Coalesces redraw requests until the next frame is taken
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    requested: bool,
}

impl FrameScheduler {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// True once per burst of requests
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}
