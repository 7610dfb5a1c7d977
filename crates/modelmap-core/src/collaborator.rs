//! Collaborator seams: document retrieval, existence probing, semantic
//! inference, and artifact persistence.
//!
//! The core is agnostic to the concrete protocols behind these traits.
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DocumentSpec;
use crate::error::CollaboratorResult;
use crate::identifier::{ArtifactId, Platform};

/// Document name for a platform's own metadata body (the model card on a
/// registry, the repository description on a code host).
pub const CARD_DOCUMENT: &str = "card";

/// Retrieves a named document for an artifact.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch one document at the given ref.
    ///
    /// `Ok(None)` means the document does not exist on the platform; that is
    /// not an error. Transport failures are `Err` and the caller degrades
    /// them to absent.
    async fn fetch_document(
        &self,
        platform: Platform,
        id: &ArtifactId,
        document: &str,
        git_ref: &str,
    ) -> CollaboratorResult<Option<String>>;
}

/// Lightweight liveness check for a candidate identifier.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Whether the identifier is live on the platform.
    ///
    /// Never errors: transport failures report `false` so a probe can never
    /// block the surrounding tiered procedure.
    async fn exists(&self, platform: Platform, id: &ArtifactId) -> bool;
}

/// The question posed to the semantic-inference collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InferenceQuestion {
    /// Which repository on `target` holds this artifact's canonical
    /// counterpart?
    Counterpart { source: ArtifactId, target: Platform },

    /// Which artifact was this one derived from, if any?
    BaseArtifact { artifact: ArtifactId },
}

/// Tagged answer from the inference collaborator.
///
/// The collaborator's replies are free-form and non-deterministic; anything
/// not matching the expected single-identifier shape parses to `ok = false`.
/// Partial or ambiguous data never escapes the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceAnswer {
    pub ok: bool,
    pub identifier: Option<String>,
}

impl InferenceAnswer {
    /// "No answer".
    pub fn none() -> Self {
        Self::default()
    }

    /// A proposed identifier.
    pub fn proposed(identifier: impl Into<String>) -> Self {
        Self {
            ok: true,
            identifier: Some(identifier.into()),
        }
    }

    /// Strictly parse a raw collaborator reply.
    ///
    /// Accepts either a JSON object whose single value is the proposed
    /// identifier (or null for "no answer"), or a bare one-line
    /// `org/name` token. Everything else is "no answer".
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::none();
        }

        if trimmed.starts_with('{') {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
                return Self::none();
            };
            let Some(object) = value.as_object() else {
                return Self::none();
            };
            let mut fields = object.values();
            let (Some(field), None) = (fields.next(), fields.next()) else {
                return Self::none();
            };
            return match field {
                serde_json::Value::String(s) => Self::from_token(s),
                serde_json::Value::Null => Self::none(),
                _ => Self::none(),
            };
        }

        let line = trimmed.lines().next().unwrap_or("");
        Self::from_token(line)
    }

    fn from_token(token: &str) -> Self {
        let token = token.trim().trim_matches('`').trim();
        if token.is_empty() || token.chars().any(char::is_whitespace) || !token.contains('/') {
            return Self::none();
        }
        Self::proposed(token)
    }
}

/// Guesses identifiers from free-text evidence. A fallible, non-
/// deterministic last resort.
#[async_trait]
pub trait SemanticInference: Send + Sync {
    /// Ask `question` over the given evidence text.
    async fn infer(
        &self,
        question: &InferenceQuestion,
        evidence: &str,
    ) -> CollaboratorResult<InferenceAnswer>;
}

/// Persists resolution by-products, partitioned by a per-artifact
/// directory key.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist a named document under the artifact's partition.
    async fn persist(&self, dir_key: &str, name: &str, contents: &[u8]) -> CollaboratorResult<()>;
}

/// Fetch each configured document for `id`, trying refs in order and
/// keeping the first present body per document.
///
/// Transport failures are logged and degrade to absent; callers always get
/// a (possibly empty) list of `(document name, body)` pairs.
pub async fn collect_documents(
    source: &dyn DocumentSource,
    id: &ArtifactId,
    specs: &[DocumentSpec],
) -> Vec<(String, String)> {
    let mut collected = Vec::new();
    for spec in specs {
        for git_ref in &spec.refs {
            match source.fetch_document(id.platform, id, &spec.name, git_ref).await {
                Ok(Some(body)) => {
                    collected.push((spec.name.clone(), body));
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(artifact = %id, document = %spec.name, error = %e, "document fetch failed");
                    continue;
                }
            }
        }
    }
    collected
}
