//! Paper repository client (arXiv export API).

use std::time::Duration;

use modelmap_core::CollaboratorResult;
use serde::{Deserialize, Serialize};

use crate::transport_error;

const SERVICE: &str = "papers";

/// Paper repository client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Export API query endpoint.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        ArxivConfig {
            base_url: std::env::var("MODELMAP_PAPERS_URL")
                .unwrap_or_else(|_| "https://export.arxiv.org/api/query".to_string()),
            timeout_secs: 30,
        }
    }
}

impl ArxivConfig {
    /// Create a new config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Client for paper abstracts.
pub struct ArxivClient {
    config: ArxivConfig,
    http: reqwest::Client,
}

impl ArxivClient {
    pub fn new(config: ArxivConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("modelmap-fetch/0.3")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        ArxivClient { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Self {
        Self::new(ArxivConfig::from_env())
    }

    /// Abstract of the paper with the given id (e.g. `2104.08691`), or
    /// `None` when the export API has no entry for it.
    pub async fn abstract_for(&self, paper_id: &str) -> CollaboratorResult<Option<String>> {
        let url = format!("{}?id_list={}", self.config.base_url, paper_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        Ok(extract_summary(&body))
    }
}

/// Pull the first `<summary>` element out of an Atom feed body.
fn extract_summary(feed: &str) -> Option<String> {
    let start = feed.find("<summary>")? + "<summary>".len();
    let rest = &feed[start..];
    let end = rest.find("</summary>")?;
    let summary = rest[..end].trim();
    if summary.is_empty() {
        None
    } else {
        Some(summary.to_string())
    }
}
