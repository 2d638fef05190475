// SPDX-License-Identifier: MIT

//! Agent/workflow catalog and execution service
//!
//! The editor only talks to the service through the `Catalog` trait;
//! `HttpCatalog` is the production implementation.

mod http;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CatalogError;

pub use http::{CatalogConfig, HttpCatalog, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use types::{
    AgentSummary, ExecutionReport, NewWorkflow, WorkflowId, WorkflowRecord, WorkflowUpdate,
};

/// Remote store of agents and persisted workflows
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Agents available for the palette
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, CatalogError>;

    async fn fetch_workflow(&self, id: &str) -> Result<WorkflowRecord, CatalogError>;

    /// Persist a new workflow and return its assigned id
    async fn create_workflow(&self, workflow: &NewWorkflow) -> Result<String, CatalogError>;

    async fn update_workflow(&self, id: &str, update: &WorkflowUpdate) -> Result<(), CatalogError>;

    /// Run a persisted workflow with `input` as its initial context
    async fn execute_workflow(
        &self,
        id: &str,
        input: &Value,
    ) -> Result<ExecutionReport, CatalogError>;
}
