// SPDX-License-Identifier: MIT

//! Node, connection and config types for the editor graph

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ops::{Add, Sub};

/// Node identifier, `node-<n>` for nodes created in this crate
pub type NodeId = String;

/// A point in model or screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The three kinds of node on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Output,
    Agent,
}

impl NodeKind {
    /// Input nodes only emit, output nodes only receive
    pub fn has_output_port(self) -> bool {
        !matches!(self, NodeKind::Output)
    }

    pub fn has_input_port(self) -> bool {
        !matches!(self, NodeKind::Input)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Agent => "agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "input" => Some(NodeKind::Input),
            "output" => Some(NodeKind::Output),
            "agent" => Some(NodeKind::Agent),
            _ => None,
        }
    }
}

/// Configuration of an agent step, also the element type of a saved `sequence`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawAgentConfig", into = "RawAgentConfig")]
pub struct AgentConfig {
    /// Name of the agent in the catalog (`agent` in legacy documents)
    pub agent_name: String,
    /// Parameter name -> reference into the execution context, e.g. `$.input.city`
    pub input_mapping: BTreeMap<String, String>,
    /// Context key the agent's result is written to
    pub output_key: String,
    /// Keys this crate does not interpret, kept for round-tripping
    pub extra: Map<String, Value>,
    shape: ConfigShape,
}

impl AgentConfig {
    pub fn new(agent_name: impl Into<String>) -> Self {
        let agent_name = agent_name.into();
        Self {
            output_key: format!("{}_output", agent_name),
            agent_name,
            input_mapping: BTreeMap::new(),
            extra: Map::new(),
            shape: ConfigShape::default(),
        }
    }

    /// True when the name was read from the legacy `agent` key
    pub fn uses_legacy_name(&self) -> bool {
        self.shape.legacy_name
    }
}

/// Which keys the source object spelled out, so a config is written back
/// the way it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConfigShape {
    legacy_name: bool,
    has_name: bool,
    has_mapping: bool,
    has_output_key: bool,
}

impl Default for ConfigShape {
    fn default() -> Self {
        Self {
            legacy_name: false,
            has_name: true,
            has_mapping: true,
            has_output_key: true,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawAgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_mapping: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_key: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawAgentConfig> for AgentConfig {
    fn from(raw: RawAgentConfig) -> Self {
        let mut extra = raw.extra;
        let (agent_name, legacy_name) = match (raw.agent_name, raw.agent) {
            (Some(name), legacy) => {
                // Both spellings present: `agent_name` wins, `agent` rides along untouched
                if let Some(legacy) = legacy {
                    extra.insert("agent".to_string(), Value::String(legacy));
                }
                (Some(name), false)
            }
            (None, Some(legacy)) => (Some(legacy), true),
            (None, None) => (None, false),
        };
        let shape = ConfigShape {
            legacy_name,
            has_name: agent_name.is_some(),
            has_mapping: raw.input_mapping.is_some(),
            has_output_key: raw.output_key.is_some(),
        };
        Self {
            agent_name: agent_name.unwrap_or_default(),
            input_mapping: raw.input_mapping.unwrap_or_default(),
            output_key: raw.output_key.unwrap_or_default(),
            extra,
            shape,
        }
    }
}

impl From<AgentConfig> for RawAgentConfig {
    fn from(cfg: AgentConfig) -> Self {
        let shape = cfg.shape;
        let name = (shape.has_name || !cfg.agent_name.is_empty()).then_some(cfg.agent_name);
        let (agent_name, agent) = if shape.legacy_name {
            (None, name)
        } else {
            (name, None)
        };
        Self {
            agent_name,
            agent,
            input_mapping: (shape.has_mapping || !cfg.input_mapping.is_empty())
                .then_some(cfg.input_mapping),
            output_key: (shape.has_output_key || !cfg.output_key.is_empty())
                .then_some(cfg.output_key),
            extra: cfg.extra,
        }
    }
}

/// Kind-specific node configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeConfig {
    Input(Map<String, Value>),
    Output(Map<String, Value>),
    Agent(AgentConfig),
}

impl NodeConfig {
    /// Default config for a freshly created node
    pub fn default_for(kind: NodeKind, agent_name: Option<&str>) -> Self {
        match kind {
            NodeKind::Input => NodeConfig::Input(type_marker(kind)),
            NodeKind::Output => NodeConfig::Output(type_marker(kind)),
            NodeKind::Agent => NodeConfig::Agent(AgentConfig::new(agent_name.unwrap_or_default())),
        }
    }

    /// Interpret a structured value as the config of a node of `kind`.
    ///
    /// Only the shape needed to store it is checked; semantic completeness
    /// (a non-empty agent name, resolvable mappings) is the caller's business.
    pub fn from_value(kind: NodeKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            NodeKind::Input => NodeConfig::Input(serde_json::from_value(value)?),
            NodeKind::Output => NodeConfig::Output(serde_json::from_value(value)?),
            NodeKind::Agent => NodeConfig::Agent(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Input(_) => NodeKind::Input,
            NodeConfig::Output(_) => NodeKind::Output,
            NodeConfig::Agent(_) => NodeKind::Agent,
        }
    }

    pub fn as_agent(&self) -> Option<&AgentConfig> {
        match self {
            NodeConfig::Agent(cfg) => Some(cfg),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            NodeConfig::Input(map) | NodeConfig::Output(map) => Value::Object(map.clone()),
            NodeConfig::Agent(cfg) => serde_json::to_value(cfg).unwrap_or(Value::Null),
        }
    }
}

fn type_marker(kind: NodeKind) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(kind.as_str().to_string()));
    map
}

/// A vertex on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub config: NodeConfig,
}

impl Node {
    /// Display title: the agent name for agents, the kind otherwise
    pub fn title(&self) -> &str {
        match &self.config {
            NodeConfig::Agent(cfg) if !cfg.agent_name.is_empty() => &cfg.agent_name,
            NodeConfig::Agent(_) => "Agent",
            _ => self.kind.as_str(),
        }
    }
}

/// Directed edge from a node's output port to another node's input port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
}

impl Connection {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}
