// SPDX-License-Identifier: MIT

//! Workflow templates: canned agent chains
//!
//! A template becomes Input -> agents... -> Output, then gets laid out.
//! The built-in library is static; extra libraries can be read from YAML.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::document::build_chain;
use super::graph::{AgentConfig, GraphModel};
use super::layout::LayoutEngine;
use super::settings::EditorSettings;
use crate::error::EditorError;

/// A named agent chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Short lookup key, e.g. `travel`
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub agents: Vec<String>,
}

impl Template {
    /// Replace the graph contents with this template's chain and lay it out.
    ///
    /// Confirmation for a non-empty canvas is the caller's job.
    pub fn instantiate(
        &self,
        graph: &mut GraphModel,
        settings: &EditorSettings,
    ) -> Result<usize, EditorError> {
        let steps: Vec<AgentConfig> = self.agents.iter().map(AgentConfig::new).collect();
        build_chain(graph, &steps, settings);
        let placed = LayoutEngine::new(settings.spacing.clone()).apply(graph)?;
        log::info!(
            "Applied template '{}' ({} agents)",
            self.key,
            self.agents.len()
        );
        Ok(placed)
    }
}

static BUILTIN: Lazy<TemplateLibrary> = Lazy::new(|| TemplateLibrary {
    templates: vec![
        builtin(
            "travel",
            "Travel planning",
            "Weather lookup through to a full itinerary",
            "Lifestyle",
            "✈️",
            &[
                "weather_agent",
                "attraction_agent",
                "hotel_agent",
                "itinerary_agent",
            ],
        ),
        builtin(
            "content",
            "Content creation",
            "Outline, draft, polish and SEO pass",
            "Content",
            "✍️",
            &[
                "outline_agent",
                "writing_agent",
                "polish_agent",
                "seo_agent",
            ],
        ),
        builtin(
            "data-analysis",
            "Data analysis",
            "Collect, clean, analyze and report",
            "Data",
            "📈",
            &[
                "data_collector",
                "data_cleaner",
                "data_analyzer",
                "report_generator",
            ],
        ),
        builtin(
            "ecommerce",
            "E-commerce decision",
            "Competitor analysis through to campaign launch",
            "Business",
            "🛍️",
            &[
                "competitor_analyzer",
                "pricing_strategist",
                "marketing_planner",
                "campaign_launcher",
            ],
        ),
        builtin(
            "simple",
            "Simple sequence",
            "Input, one agent, output",
            "Basic",
            "→",
            &["processor_agent"],
        ),
    ],
});

fn builtin(
    key: &str,
    name: &str,
    description: &str,
    category: &str,
    icon: &str,
    agents: &[&str],
) -> Template {
    Template {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        icon: icon.to_string(),
        agents: agents.iter().map(|a| a.to_string()).collect(),
    }
}

/// An ordered set of templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateLibrary {
    pub templates: Vec<Template>,
}

impl TemplateLibrary {
    /// The templates shipped with the editor
    pub fn builtin() -> &'static TemplateLibrary {
        &BUILTIN
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, EditorError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, EditorError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Look up by key, falling back to a case-insensitive name match
    pub fn get(&self, key: &str) -> Result<&Template, EditorError> {
        self.templates
            .iter()
            .find(|t| t.key == key)
            .or_else(|| {
                self.templates
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| EditorError::TemplateNotFound(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::document::walk_chain;
    use crate::editor::graph::NodeKind;

    #[test]
    fn test_builtin_library() {
        let lib = TemplateLibrary::builtin();
        assert_eq!(lib.len(), 5);
        assert_eq!(lib.get("travel").unwrap().agents.len(), 4);
        assert_eq!(lib.get("simple sequence").unwrap().key, "simple");
        assert!(matches!(lib.get("nope"), Err(EditorError::TemplateNotFound(_))));
    }

    #[test]
    fn test_instantiate_builds_laid_out_chain() {
        let mut graph = GraphModel::new();
        let template = TemplateLibrary::builtin().get("content").unwrap();
        let placed = template
            .instantiate(&mut graph, &EditorSettings::default())
            .unwrap();

        assert_eq!(placed, 6);
        assert_eq!(graph.connections().len(), 5);
        let names: Vec<String> = walk_chain(&graph)
            .unwrap()
            .into_iter()
            .map(|c| c.agent_name)
            .collect();
        assert_eq!(names, template.agents);

        let mut xs: Vec<f64> = graph.nodes().map(|n| n.position.x).collect();
        xs.dedup();
        assert_eq!(xs.len(), 6);
    }

    #[test]
    fn test_zero_agent_template() {
        let template = builtin("empty", "Empty", "", "", "", &[]);
        let mut graph = GraphModel::new();
        template
            .instantiate(&mut graph, &EditorSettings::default())
            .unwrap();

        let kinds: Vec<NodeKind> = graph.nodes().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Input, NodeKind::Output]);
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_instantiate_replaces_existing_nodes_keeps_counter() {
        let mut graph = GraphModel::new();
        graph.add_node(NodeKind::Agent, Default::default(), Some("old"));
        let template = TemplateLibrary::builtin().get("simple").unwrap();
        template
            .instantiate(&mut graph, &EditorSettings::default())
            .unwrap();

        assert_eq!(graph.len(), 3);
        assert!(graph.node("node-1").is_none());
        assert!(graph.node("node-2").is_some());
    }

    #[test]
    fn test_library_from_yaml() {
        let yaml = r#"
templates:
  - key: review
    name: Code review
    category: Engineering
    agents: [diff_reader, reviewer]
"#;
        let lib = TemplateLibrary::from_yaml(yaml).unwrap();
        let t = lib.get("review").unwrap();
        assert_eq!(t.agents, vec!["diff_reader", "reviewer"]);
        assert!(t.icon.is_empty());
    }
}
