// SPDX-License-Identifier: MIT

//! One open editor: graph, history, view and gesture state
//!
//! All input arrives through [`EditorSession::dispatch`]. Every committed
//! graph change pushes exactly one history snapshot; undo and redo restore
//! snapshots without pushing. Remote loads and saves are split into
//! `begin_*`/`complete_*` so a late response for a workflow that is no
//! longer open can be recognised and dropped.

use std::collections::VecDeque;

use serde_json::Value;
use uuid::Uuid;

use super::connect::{ConnectOutcome, ConnectionProtocol, PortKind};
use super::document::{restore, save, LoadReport, WorkflowDocument};
use super::gesture::{Gesture, GestureEnd};
use super::graph::{Connection, GraphModel, NodeConfig, NodeId, NodeKind, Point};
use super::history::HistoryStack;
use super::layout::LayoutEngine;
use super::settings::EditorSettings;
use super::template::Template;
use super::view::{edge_paths, EdgePath, FrameScheduler, ViewTransform};
use crate::catalog::{Catalog, NewWorkflow, WorkflowRecord, WorkflowUpdate};
use crate::error::{CatalogError, EditorError, FlowError};

pub const DEFAULT_DESCRIPTION: &str = "Created with the visual editor";
pub const DEFAULT_CATEGORY: &str = "Custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user, drained by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
}

/// What the pointer was over when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    Canvas,
    NodeHeader(NodeId),
    OutputPort(NodeId),
    InputPort(NodeId),
}

/// Input to the editor. Points are in screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    PointerDown {
        target: PointerTarget,
        button: PointerButton,
        at: Point,
    },
    PointerMove {
        at: Point,
    },
    PointerUp {
        at: Point,
    },
    SpaceKey {
        pressed: bool,
    },
    Wheel {
        at: Point,
        delta_y: f64,
    },
    /// Palette item dropped on the canvas
    Drop {
        kind: NodeKind,
        agent_name: Option<String>,
        at: Point,
    },
    Undo,
    Redo,
    DeleteNode(NodeId),
    /// Edge removal, after the UI confirmed it
    DeleteConnection(Connection),
    /// Hand-edited config text for a node
    EditConfig {
        node: NodeId,
        text: String,
    },
    AutoLayout,
    ZoomIn,
    ZoomOut,
    ResetView,
    ClearCanvas,
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Ignored,
    /// Graph changed and a snapshot was committed
    Committed,
    /// Undo or redo replaced the graph
    Restored,
    ViewChanged,
    /// A drag or pan is under way
    InProgress,
    Connect(ConnectOutcome),
}

/// Issued by [`EditorSession::begin_load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    token: Uuid,
    pub workflow_id: String,
}

/// Issued by [`EditorSession::begin_save`]: the document to send and where
#[derive(Debug, Clone)]
pub struct SaveRequest {
    token: Uuid,
    pub workflow_id: Option<String>,
    pub name: String,
    pub document: WorkflowDocument,
}

impl SaveRequest {
    pub fn to_new(&self, description: &str, category: &str) -> NewWorkflow {
        NewWorkflow {
            name: self.name.clone(),
            description: description.to_string(),
            workflow_definition: self.document.clone(),
            category: category.to_string(),
        }
    }

    pub fn to_update(&self) -> WorkflowUpdate {
        WorkflowUpdate {
            name: self.name.clone(),
            workflow_definition: self.document.clone(),
        }
    }
}

pub struct EditorSession {
    graph: GraphModel,
    history: HistoryStack,
    view: ViewTransform,
    connect: ConnectionProtocol,
    gesture: Gesture,
    frames: FrameScheduler,
    layout: LayoutEngine,
    settings: EditorSettings,
    notices: VecDeque<Notice>,
    /// Rotated whenever the session switches to a different workflow
    identity: Uuid,
    /// Token of the newest load request; only its response is applied
    pending_load: Uuid,
    workflow_id: Option<String>,
    workflow_name: Option<String>,
    space_held: bool,
}

impl EditorSession {
    pub fn new(settings: EditorSettings) -> Self {
        let graph = GraphModel::new();
        let mut history = HistoryStack::with_limit(settings.history_limit);
        history.commit(graph.snapshot());
        Self {
            graph,
            history,
            view: ViewTransform::with_bounds(settings.min_scale, settings.max_scale),
            connect: ConnectionProtocol::new(),
            gesture: Gesture::Idle,
            frames: FrameScheduler::default(),
            layout: LayoutEngine::new(settings.spacing.clone()),
            settings,
            notices: VecDeque::new(),
            identity: Uuid::new_v4(),
            pending_load: Uuid::new_v4(),
            workflow_id: None,
            workflow_name: None,
            space_held: false,
        }
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn pending_source(&self) -> Option<&NodeId> {
        self.connect.pending()
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn workflow_name(&self) -> Option<&str> {
        self.workflow_name.as_deref()
    }

    pub fn identity(&self) -> Uuid {
        self.identity
    }

    /// Current screen-space edge curves
    pub fn edge_paths(&self) -> Vec<EdgePath> {
        edge_paths(&self.graph, &self.view, &self.settings.spacing)
    }

    /// Edge curves if a redraw was requested since the last frame
    pub fn take_frame(&mut self) -> Option<Vec<EdgePath>> {
        self.frames.take().then(|| self.edge_paths())
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level,
            message: message.into(),
        });
    }

    fn commit(&mut self) {
        self.history.commit(self.graph.snapshot());
        self.frames.request();
    }

    /// Handle one input event.
    ///
    /// Errors are also queued as notices.
    pub fn dispatch(&mut self, event: EditorEvent) -> Result<EventOutcome, EditorError> {
        self.handle(event).map_err(|err| {
            self.notify(NoticeLevel::Error, err.to_string());
            err
        })
    }

    fn handle(&mut self, event: EditorEvent) -> Result<EventOutcome, EditorError> {
        match event {
            EditorEvent::PointerDown { target, button, at } => {
                Ok(self.pointer_down(target, button, at))
            }
            EditorEvent::PointerMove { at } => {
                if !self.gesture.is_active() {
                    return Ok(EventOutcome::Ignored);
                }
                if self.gesture.track(&mut self.graph, &mut self.view, at) {
                    self.frames.request();
                }
                Ok(EventOutcome::InProgress)
            }
            EditorEvent::PointerUp { at } => {
                self.gesture.track(&mut self.graph, &mut self.view, at);
                match self.gesture.finish(&self.graph) {
                    GestureEnd::NodeMoved { id, from, to } => {
                        log::debug!(
                            "Moved '{}' from ({}, {}) to ({}, {})",
                            id,
                            from.x,
                            from.y,
                            to.x,
                            to.y
                        );
                        self.commit();
                        Ok(EventOutcome::Committed)
                    }
                    GestureEnd::Unchanged | GestureEnd::None => Ok(EventOutcome::Ignored),
                }
            }
            EditorEvent::SpaceKey { pressed } => {
                self.space_held = pressed;
                Ok(EventOutcome::Ignored)
            }
            EditorEvent::Wheel { at, delta_y } => {
                Ok(self.view_change(|view| view.wheel(at, delta_y)))
            }
            EditorEvent::ZoomIn => Ok(self.view_change(ViewTransform::zoom_in)),
            EditorEvent::ZoomOut => Ok(self.view_change(ViewTransform::zoom_out)),
            EditorEvent::ResetView => Ok(self.view_change(|view| {
                view.reset();
                true
            })),
            EditorEvent::Drop {
                kind,
                agent_name,
                at,
            } => {
                let position = self.view.to_model(at);
                let id = self.graph.add_node(kind, position, agent_name.as_deref());
                log::debug!("Dropped {} node '{}'", kind.as_str(), id);
                self.commit();
                Ok(EventOutcome::Committed)
            }
            EditorEvent::Undo => Ok(self.step_history(true)),
            EditorEvent::Redo => Ok(self.step_history(false)),
            EditorEvent::DeleteNode(id) => {
                if !self.graph.delete_node(&id) {
                    return Ok(EventOutcome::Ignored);
                }
                if self.connect.pending() == Some(&id) {
                    self.connect.cancel();
                }
                self.commit();
                Ok(EventOutcome::Committed)
            }
            EditorEvent::DeleteConnection(conn) => {
                if !self.graph.remove_connection(&conn.from, &conn.to) {
                    return Ok(EventOutcome::Ignored);
                }
                self.commit();
                Ok(EventOutcome::Committed)
            }
            EditorEvent::EditConfig { node, text } => self.edit_config(&node, &text),
            EditorEvent::AutoLayout => {
                let placed = self.layout.apply(&mut self.graph)?;
                self.commit();
                self.notify(
                    NoticeLevel::Info,
                    format!("Auto layout placed {} nodes", placed),
                );
                Ok(EventOutcome::Committed)
            }
            EditorEvent::ClearCanvas => {
                if self.graph.is_empty() {
                    return Ok(EventOutcome::Ignored);
                }
                self.connect.cancel();
                self.graph.clear();
                self.commit();
                Ok(EventOutcome::Committed)
            }
        }
    }

    fn pointer_down(
        &mut self,
        target: PointerTarget,
        button: PointerButton,
        at: Point,
    ) -> EventOutcome {
        if self.gesture.is_active() {
            log::debug!("Pointer down ignored: gesture in progress");
            return EventOutcome::Ignored;
        }
        if button == PointerButton::Middle || self.space_held {
            self.gesture = Gesture::pan(&self.view, at);
            return EventOutcome::InProgress;
        }
        match target {
            PointerTarget::NodeHeader(id) => match Gesture::drag(&self.graph, &self.view, &id, at) {
                Some(gesture) => {
                    self.gesture = gesture;
                    EventOutcome::InProgress
                }
                None => EventOutcome::Ignored,
            },
            PointerTarget::OutputPort(id) => self.pick_port(&id, PortKind::Output),
            PointerTarget::InputPort(id) => self.pick_port(&id, PortKind::Input),
            PointerTarget::Canvas => {
                if self.connect.is_pending() {
                    self.connect.cancel();
                    EventOutcome::Connect(ConnectOutcome::Cancelled)
                } else {
                    EventOutcome::Ignored
                }
            }
        }
    }

    fn pick_port(&mut self, id: &str, port: PortKind) -> EventOutcome {
        let outcome = self.connect.pick(&mut self.graph, id, port);
        if let ConnectOutcome::Connected(conn) = &outcome {
            log::debug!("Connected {} -> {}", conn.from, conn.to);
            self.commit();
        }
        EventOutcome::Connect(outcome)
    }

    fn view_change(&mut self, change: impl FnOnce(&mut ViewTransform) -> bool) -> EventOutcome {
        if change(&mut self.view) {
            self.frames.request();
            EventOutcome::ViewChanged
        } else {
            EventOutcome::Ignored
        }
    }

    fn step_history(&mut self, back: bool) -> EventOutcome {
        if self.gesture.is_active() {
            return EventOutcome::Ignored;
        }
        let snapshot = if back {
            self.history.undo()
        } else {
            self.history.redo()
        };
        match snapshot {
            Some(snapshot) => {
                self.graph.restore(snapshot);
                self.connect.cancel();
                self.frames.request();
                EventOutcome::Restored
            }
            None => EventOutcome::Ignored,
        }
    }

    fn edit_config(&mut self, node: &str, text: &str) -> Result<EventOutcome, EditorError> {
        let Some(kind) = self.graph.node(node).map(|n| n.kind) else {
            return Ok(EventOutcome::Ignored);
        };
        let value: Value = serde_json::from_str(text)
            .map_err(|e| EditorError::malformed_config(node, e.to_string()))?;
        let config = NodeConfig::from_value(kind, value)
            .map_err(|e| EditorError::malformed_config(node, e.to_string()))?;
        if self.graph.node(node).map(|n| &n.config) == Some(&config) {
            return Ok(EventOutcome::Ignored);
        }
        self.graph.set_node_config(node, config);
        self.commit();
        Ok(EventOutcome::Committed)
    }

    /// Replace the canvas with a template's chain.
    ///
    /// A non-empty canvas needs `confirmed`; otherwise nothing changes.
    pub fn apply_template(
        &mut self,
        template: &Template,
        confirmed: bool,
    ) -> Result<usize, EditorError> {
        if !self.graph.is_empty() && !confirmed {
            let err = EditorError::CanvasNotEmpty;
            self.notify(NoticeLevel::Warning, err.to_string());
            return Err(err);
        }
        self.connect.cancel();
        let placed = template.instantiate(&mut self.graph, &self.settings)?;
        self.commit();
        self.notify(
            NoticeLevel::Info,
            format!("Applied template '{}'", template.name),
        );
        Ok(placed)
    }

    /// Start editing a fresh, unsaved workflow
    pub fn new_workflow(&mut self) {
        self.workflow_id = None;
        self.workflow_name = None;
        self.reset_editing_state();
    }

    fn reset_editing_state(&mut self) {
        let mut graph = self.graph.clone();
        graph.clear();
        self.adopt(graph);
    }

    /// Make `graph` the whole editing state, with a fresh history.
    ///
    /// This is a different workflow from here on: in-flight saves and loads
    /// belong to the previous one.
    fn adopt(&mut self, graph: GraphModel) {
        self.identity = Uuid::new_v4();
        self.pending_load = Uuid::new_v4();
        self.graph = graph;
        self.connect.cancel();
        self.gesture = Gesture::Idle;
        self.history.clear();
        self.history.commit(self.graph.snapshot());
        self.frames.request();
    }

    fn report_load(&mut self, report: &LoadReport) {
        if report.migrated {
            self.notify(
                NoticeLevel::Warning,
                "Legacy workflow without layout data; nodes were arranged automatically",
            );
        }
        if report.dropped_connections > 0 {
            self.notify(
                NoticeLevel::Warning,
                format!("Dropped {} invalid connections", report.dropped_connections),
            );
        }
    }

    /// Open an already parsed document, e.g. from a local file.
    ///
    /// Like a completed load, but synchronous and without a ticket.
    pub fn open_document(
        &mut self,
        doc: &WorkflowDocument,
        workflow_id: Option<String>,
    ) -> Result<LoadReport, EditorError> {
        let mut graph = self.graph.clone();
        let report = restore(&mut graph, doc, &self.settings)?;
        self.workflow_id = workflow_id;
        self.workflow_name = None;
        self.adopt(graph);
        self.report_load(&report);
        Ok(report)
    }

    /// Request `workflow_id`; any earlier load ticket becomes stale.
    ///
    /// The workflow being edited only changes once the load succeeds, so
    /// saves in flight stay valid until then.
    pub fn begin_load(&mut self, workflow_id: impl Into<String>) -> LoadTicket {
        self.pending_load = Uuid::new_v4();
        let ticket = LoadTicket {
            token: self.pending_load,
            workflow_id: workflow_id.into(),
        };
        log::debug!("Loading workflow {}", ticket.workflow_id);
        ticket
    }

    /// Apply a fetched workflow.
    ///
    /// Returns `Ok(None)` when the ticket is stale and the response was dropped.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<WorkflowRecord, CatalogError>,
    ) -> Result<Option<LoadReport>, FlowError> {
        if ticket.token != self.pending_load {
            log::warn!("Discarding stale load of workflow {}", ticket.workflow_id);
            return Ok(None);
        }
        match self.apply_record(&ticket, result) {
            Ok(report) => Ok(Some(report)),
            Err(err) => {
                self.notify(NoticeLevel::Error, format!("Load failed: {}", err));
                Err(err)
            }
        }
    }

    fn apply_record(
        &mut self,
        ticket: &LoadTicket,
        result: Result<WorkflowRecord, CatalogError>,
    ) -> Result<LoadReport, FlowError> {
        let record = result?;
        let doc = record.document()?;

        let mut graph = self.graph.clone();
        let report = restore(&mut graph, &doc, &self.settings)?;

        self.workflow_id = Some(ticket.workflow_id.clone());
        self.workflow_name = Some(record.name);
        self.adopt(graph);
        self.report_load(&report);
        log::info!(
            "Loaded workflow {} ({} nodes)",
            ticket.workflow_id,
            report.nodes
        );
        Ok(report)
    }

    /// Serialize the graph for saving under `name`
    pub fn begin_save(&mut self, name: impl Into<String>) -> Result<SaveRequest, EditorError> {
        match save(&self.graph) {
            Ok(document) => Ok(SaveRequest {
                token: self.identity,
                workflow_id: self.workflow_id.clone(),
                name: name.into(),
                document,
            }),
            Err(err) => {
                self.notify(NoticeLevel::Error, err.to_string());
                Err(err)
            }
        }
    }

    /// Record the service's answer to a save.
    ///
    /// `result` carries the assigned id for a create. The graph is never
    /// touched here. Returns `Ok(false)` for a stale request.
    pub fn complete_save(
        &mut self,
        request: &SaveRequest,
        result: Result<Option<String>, CatalogError>,
    ) -> Result<bool, FlowError> {
        if request.token != self.identity {
            log::warn!("Discarding stale save response for '{}'", request.name);
            return Ok(false);
        }
        match result {
            Ok(assigned) => {
                if self.workflow_id.is_none() {
                    self.workflow_id = assigned;
                }
                self.workflow_name = Some(request.name.clone());
                self.notify(
                    NoticeLevel::Info,
                    format!("Saved workflow '{}'", request.name),
                );
                log::info!(
                    "Saved workflow '{}' as {:?}",
                    request.name,
                    self.workflow_id
                );
                Ok(true)
            }
            Err(err) => {
                self.notify(NoticeLevel::Error, format!("Save failed: {}", err));
                Err(err.into())
            }
        }
    }

    /// Fetch and load `workflow_id` from `catalog`
    pub async fn load_from(
        &mut self,
        catalog: &dyn Catalog,
        workflow_id: &str,
    ) -> Result<Option<LoadReport>, FlowError> {
        let ticket = self.begin_load(workflow_id);
        let result = catalog.fetch_workflow(workflow_id).await;
        self.complete_load(ticket, result)
    }

    /// Save to `catalog`, creating the workflow if it has no id yet.
    ///
    /// Returns the workflow id.
    pub async fn save_to(
        &mut self,
        catalog: &dyn Catalog,
        name: &str,
    ) -> Result<Option<String>, FlowError> {
        let request = self.begin_save(name)?;
        let result = match &request.workflow_id {
            Some(id) => catalog
                .update_workflow(id, &request.to_update())
                .await
                .map(|_| None),
            None => catalog
                .create_workflow(&request.to_new(DEFAULT_DESCRIPTION, DEFAULT_CATEGORY))
                .await
                .map(Some),
        };
        self.complete_save(&request, result)?;
        Ok(self.workflow_id.clone())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}
