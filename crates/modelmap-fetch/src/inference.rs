//! Semantic-inference client over an OpenAI-compatible chat API.
//!
//! The service's replies are free-form and non-deterministic; everything
//! that comes back goes through `InferenceAnswer::parse`, so malformed
//! output degrades to "no answer" instead of an error.

use std::time::Duration;

use async_trait::async_trait;
use modelmap_core::{
    CollaboratorError, CollaboratorResult, InferenceAnswer, InferenceQuestion, SemanticInference,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport_error;

const SERVICE: &str = "inference";

/// Inference client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// API base URL (an OpenAI-compatible `/chat/completions` endpoint).
    pub base_url: String,

    /// API key; without one every call fails as unavailable.
    pub api_key: Option<String>,

    /// Model name.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            base_url: std::env::var("MODELMAP_INFERENCE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: std::env::var("MODELMAP_INFERENCE_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl InferenceConfig {
    /// Create a new config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client implementing the semantic-inference seam.
pub struct ChatInferenceClient {
    config: InferenceConfig,
    http: reqwest::Client,
}

impl ChatInferenceClient {
    pub fn new(config: InferenceConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("modelmap-fetch/0.3")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        ChatInferenceClient { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Self {
        Self::new(InferenceConfig::from_env())
    }
}

/// System prompt and whether to force a JSON-object reply.
fn prompt_for(question: &InferenceQuestion) -> (String, bool) {
    match question {
        InferenceQuestion::Counterpart { source, target } => (
            format!(
                "You identify, for the artifact '{}' published on {}, the \
                 repository on {} that holds its canonical counterpart.\n\
                 Rules:\n\
                 - Reply with exactly one line of the form organization/name. \
                 No link, no explanation, no backticks.\n\
                 - Prefer the artifact's own repository over broad \
                 monorepositories.\n\
                 - Use the provided evidence (name, structure, papers, \
                 tokenizer, libraries) to pin the exact path.",
                source.full_name(),
                source.platform,
                target
            ),
            false,
        ),
        InferenceQuestion::BaseArtifact { artifact } => (
            format!(
                "You analyze model documentation to find the base (pretrain) \
                 artifact a model was derived from.\n\
                 The artifact '{}' may be a fine-tuned derivative. Read the \
                 evidence and answer with a single JSON object:\n\
                 {{ \"base_artifact\": \"organization/name\" }}\n\
                 or, if it is itself a base artifact or you are not \
                 confident:\n\
                 {{ \"base_artifact\": null }}",
                artifact.full_name()
            ),
            true,
        ),
    }
}

#[async_trait]
impl SemanticInference for ChatInferenceClient {
    async fn infer(
        &self,
        question: &InferenceQuestion,
        evidence: &str,
    ) -> CollaboratorResult<InferenceAnswer> {
        let Some(api_key) = &self.config.api_key else {
            return Err(CollaboratorError::Transport {
                service: SERVICE.to_string(),
                detail: "no API key configured".to_string(),
            });
        };

        let (system, json_reply) = prompt_for(question);
        let user = if evidence.is_empty() {
            "(no evidence documents were retrievable)".to_string()
        } else {
            evidence.to_string()
        };
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            response_format: json_reply.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        if !response.status().is_success() {
            return Err(CollaboratorError::Protocol {
                service: SERVICE.to_string(),
                detail: format!("status {}", response.status()),
            });
        }
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        debug!(reply = %content, "inference reply");
        Ok(InferenceAnswer::parse(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelmap_core::{ArtifactId, Platform};

    #[test]
    fn test_counterpart_prompt_names_both_platforms() {
        let question = InferenceQuestion::Counterpart {
            source: ArtifactId::new(Platform::HuggingFace, "acme", "foo-7b"),
            target: Platform::GitHub,
        };
        let (prompt, json_reply) = prompt_for(&question);
        assert!(prompt.contains("acme/foo-7b"));
        assert!(prompt.contains("huggingface"));
        assert!(prompt.contains("github"));
        assert!(!json_reply);
    }

    #[test]
    fn test_base_artifact_prompt_requests_json() {
        let question = InferenceQuestion::BaseArtifact {
            artifact: ArtifactId::new(Platform::HuggingFace, "acme", "foo-7b-chat"),
        };
        let (prompt, json_reply) = prompt_for(&question);
        assert!(prompt.contains("acme/foo-7b-chat"));
        assert!(prompt.contains("base_artifact"));
        assert!(json_reply);
    }

    #[test]
    fn test_chat_response_content_flows_through_answer_parser() {
        let body = r#"{"choices": [{"message": {"role": "assistant",
            "content": "{ \"base_artifact\": \"bigscience/bloom-560m\" }"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("deserialize");
        let content = parsed.choices[0].message.content.clone().unwrap();
        let answer = InferenceAnswer::parse(&content);
        assert_eq!(answer, InferenceAnswer::proposed("bigscience/bloom-560m"));
    }

    #[test]
    fn test_chat_response_without_choices_is_no_answer() {
        let parsed: ChatResponse = serde_json::from_str("{}").expect("deserialize");
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        assert!(!InferenceAnswer::parse(&content).ok);
    }

    #[test]
    fn test_request_serializes_response_format_only_when_set() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            temperature: 0.0,
            response_format: None,
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(!json.contains("response_format"));

        let request = ChatRequest {
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
            ..request
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(json.contains("json_object"));
    }
}
