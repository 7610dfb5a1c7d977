//! Model registry client (Hugging Face Hub).

use std::time::Duration;

use modelmap_core::{ArtifactId, CollaboratorResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport_error;

const SERVICE: &str = "registry";

/// Registry client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// Hub base URL.
    pub base_url: String,

    /// Access token for gated artifacts (optional).
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        HuggingFaceConfig {
            base_url: std::env::var("MODELMAP_REGISTRY_URL")
                .unwrap_or_else(|_| "https://huggingface.co".to_string()),
            token: std::env::var("HF_TOKEN").ok(),
            timeout_secs: 30,
        }
    }
}

impl HuggingFaceConfig {
    /// Create a new config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the access token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// Client for the model registry's metadata and raw-file endpoints.
pub struct HuggingFaceClient {
    config: HuggingFaceConfig,
    http: reqwest::Client,
}

/// The slice of the model-info response the resolver needs.
#[derive(Debug, Deserialize)]
struct ModelInfo {
    #[serde(rename = "cardData", default)]
    card_data: Option<CardData>,
}

#[derive(Debug, Deserialize)]
struct CardData {
    #[serde(default)]
    content: Option<String>,
}

impl HuggingFaceClient {
    pub fn new(config: HuggingFaceConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("modelmap-fetch/0.3")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        HuggingFaceClient { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Self {
        Self::new(HuggingFaceConfig::from_env())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Whether the model exists on the registry. Network errors report
    /// `false`.
    pub async fn model_exists(&self, id: &ArtifactId) -> bool {
        let url = format!("{}/api/models/{}", self.config.base_url, id.full_name());
        match self.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(model = %id, error = %e, "registry probe failed");
                false
            }
        }
    }

    /// The model card body, when the card carries one.
    pub async fn card_content(&self, id: &ArtifactId) -> CollaboratorResult<Option<String>> {
        let url = format!(
            "{}/api/models/{}?full=true",
            self.config.base_url,
            id.full_name()
        );
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let info: ModelInfo = response
            .json()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        Ok(info.card_data.and_then(|card| card.content))
    }

    /// A raw repository file at the given ref, or `None` when absent.
    pub async fn raw_file(
        &self,
        id: &ArtifactId,
        git_ref: &str,
        name: &str,
    ) -> CollaboratorResult<Option<String>> {
        let url = format!(
            "{}/{}/raw/{}/{}",
            self.config.base_url,
            id.full_name(),
            git_ref,
            name
        );
        let response = self
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
