// SPDX-License-Identifier: MIT

//! HTTP catalog client over the service's JSON API

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::types::{
    AgentSummary, CreatedWorkflow, ExecutionReport, NewWorkflow, WorkflowRecord, WorkflowUpdate,
};
use super::Catalog;
use crate::error::CatalogError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the catalog lives and how long to wait for it
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl CatalogConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        Ok(Self {
            base_url: Url::parse(&base)?,
            timeout,
        })
    }

    /// Reads `AGENTFLOW_API_URL` and `AGENTFLOW_TIMEOUT_SECS`, with defaults
    pub fn from_env() -> Result<Self, CatalogError> {
        let base_url = env::var("AGENTFLOW_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout = match env::var("AGENTFLOW_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Self::new(&base_url, Duration::from_secs(timeout))
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `workflows/<id>[/<action>]`, with `id` percent-encoded as one segment
    pub fn workflow_endpoint(&self, id: &str, action: Option<&str>) -> Result<Url, CatalogError> {
        // Url::path_segments_mut silently skips these instead of encoding them
        if id.is_empty() || id == "." || id == ".." {
            return Err(CatalogError::InvalidId(id.to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push("workflows")
            .push(id)
            .extend(action);
        Ok(url)
    }
}

fn parse_timeout(raw: &str) -> Result<u64, CatalogError> {
    let invalid = |_| CatalogError::config(format!("invalid AGENTFLOW_TIMEOUT_SECS '{}'", raw));
    raw.parse().map_err(invalid)
}

/// Catalog backed by the workflow service's REST API
pub struct HttpCatalog {
    client: Client,
    config: CatalogConfig,
}

impl HttpCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Build from environment variables
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::new(CatalogConfig::from_env()?)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, CatalogError> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CatalogError::api(status.as_u16(), error_detail(&text)));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// The service reports failures as `{"error": "..."}`; fall back to the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, CatalogError> {
        let url = self.config.endpoint("agents")?;
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        Self::decode(resp).await
    }

    async fn fetch_workflow(&self, id: &str) -> Result<WorkflowRecord, CatalogError> {
        let url = self.config.workflow_endpoint(id, None)?;
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        Self::decode(resp).await
    }

    async fn create_workflow(&self, workflow: &NewWorkflow) -> Result<String, CatalogError> {
        let url = self.config.endpoint("workflows")?;
        log::debug!("POST {}", url);
        let resp = self.client.post(url).json(workflow).send().await?;
        let created: CreatedWorkflow = Self::decode(resp).await?;
        log::info!("Created workflow {}", created.workflow_id);
        Ok(created.workflow_id.to_string())
    }

    async fn update_workflow(&self, id: &str, update: &WorkflowUpdate) -> Result<(), CatalogError> {
        let url = self.config.workflow_endpoint(id, None)?;
        log::debug!("PUT {}", url);
        let resp = self.client.put(url).json(update).send().await?;
        let _: Value = Self::decode(resp).await?;
        log::info!("Updated workflow {}", id);
        Ok(())
    }

    async fn execute_workflow(
        &self,
        id: &str,
        input: &Value,
    ) -> Result<ExecutionReport, CatalogError> {
        let url = self.config.workflow_endpoint(id, Some("execute"))?;
        log::debug!("POST {}", url);
        let resp = self.client.post(url).json(input).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        // A failed run still carries a report, served with a 500
        match serde_json::from_str::<ExecutionReport>(&text) {
            Ok(report) => Ok(report),
            Err(_) if !status.is_success() => {
                Err(CatalogError::api(status.as_u16(), error_detail(&text)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config =
            CatalogConfig::new("http://localhost:5000/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            config.endpoint("workflows/3/execute").unwrap().as_str(),
            "http://localhost:5000/api/workflows/3/execute"
        );
        assert_eq!(
            config.endpoint("/agents").unwrap().as_str(),
            "http://localhost:5000/api/agents"
        );
    }

    #[test]
    fn test_workflow_endpoint_encodes_id() {
        let config =
            CatalogConfig::new("http://localhost:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            config
                .workflow_endpoint("3", Some("execute"))
                .unwrap()
                .as_str(),
            "http://localhost:5000/api/workflows/3/execute"
        );
        assert_eq!(
            config.workflow_endpoint("a/b?c#d", None).unwrap().as_str(),
            "http://localhost:5000/api/workflows/a%2Fb%3Fc%23d"
        );
        assert!(matches!(
            config.workflow_endpoint("..", Some("execute")),
            Err(CatalogError::InvalidId(_))
        ));
        assert!(matches!(
            config.workflow_endpoint("", None),
            Err(CatalogError::InvalidId(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = CatalogConfig::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidUrl(_)));
    }

    #[test]
    fn test_default_api_url() {
        let config =
            CatalogConfig::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).unwrap();
        assert_eq!(
            config.endpoint("agents").unwrap().as_str(),
            "http://127.0.0.1:5000/api/agents"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"error": "Workflow not found"}"#),
            "Workflow not found"
        );
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
    }
}
