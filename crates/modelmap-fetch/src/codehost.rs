//! Code host client (GitHub).

use std::time::Duration;

use modelmap_core::{ArtifactId, CollaboratorResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport_error;

const SERVICE: &str = "codehost";

/// Code host client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    pub api_url: String,

    /// Raw file base URL.
    pub raw_url: String,

    /// API token to lift rate limits (optional).
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: std::env::var("MODELMAP_CODEHOST_API")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            raw_url: std::env::var("MODELMAP_CODEHOST_RAW")
                .unwrap_or_else(|_| "https://raw.githubusercontent.com".to_string()),
            token: std::env::var("GITHUB_TOKEN").ok(),
            timeout_secs: 30,
        }
    }
}

impl GitHubConfig {
    /// Create a new config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the API token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// The slice of the repository metadata the resolver needs.
#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

/// Client for the code host's metadata and raw-file endpoints.
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("modelmap-fetch/0.3")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        GitHubClient { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Self {
        Self::new(GitHubConfig::from_env())
    }

    fn api_get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("token {token}"));
        }
        request
    }

    /// Whether the repository exists. Network errors report `false`.
    pub async fn repo_exists(&self, id: &ArtifactId) -> bool {
        let url = format!("{}/repos/{}", self.config.api_url, id.full_name());
        match self.api_get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(repo = %id, error = %e, "codehost probe failed");
                false
            }
        }
    }

    /// The repository description and topics as one text block, when the
    /// repository carries any.
    pub async fn repo_summary(&self, id: &ArtifactId) -> CollaboratorResult<Option<String>> {
        let url = format!("{}/repos/{}", self.config.api_url, id.full_name());
        let response = self
            .api_get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let info: RepoInfo = response
            .json()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let mut parts = Vec::new();
        if let Some(description) = info.description {
            parts.push(description);
        }
        if !info.topics.is_empty() {
            parts.push(info.topics.join(" "));
        }
        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parts.join("\n")))
        }
    }

    /// A raw repository file at the given ref, or `None` when absent.
    pub async fn raw_file(
        &self,
        id: &ArtifactId,
        git_ref: &str,
        name: &str,
    ) -> CollaboratorResult<Option<String>> {
        let url = format!(
            "{}/{}/{}/{}",
            self.config.raw_url,
            id.full_name(),
            git_ref,
            name
        );
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
        Ok(Some(body))
    }
}
