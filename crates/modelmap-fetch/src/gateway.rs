//! Platform gateway: routes collaborator calls to the per-platform
//! clients.

use async_trait::async_trait;
use modelmap_core::{
    ArtifactId, CollaboratorResult, DocumentSource, ExistenceProbe, Platform, CARD_DOCUMENT,
};
use tracing::debug;

use crate::codehost::GitHubClient;
use crate::papers::ArxivClient;
use crate::registry::HuggingFaceClient;

/// One document source / existence probe over all platforms.
pub struct PlatformGateway {
    registry: HuggingFaceClient,
    codehost: GitHubClient,
    papers: ArxivClient,
}

impl PlatformGateway {
    pub fn new(registry: HuggingFaceClient, codehost: GitHubClient, papers: ArxivClient) -> Self {
        Self {
            registry,
            codehost,
            papers,
        }
    }

    /// Build every client from environment variables.
    pub fn from_env() -> Self {
        Self::new(
            HuggingFaceClient::from_env(),
            GitHubClient::from_env(),
            ArxivClient::from_env(),
        )
    }
}

#[async_trait]
impl DocumentSource for PlatformGateway {
    async fn fetch_document(
        &self,
        platform: Platform,
        id: &ArtifactId,
        document: &str,
        git_ref: &str,
    ) -> CollaboratorResult<Option<String>> {
        match platform {
            Platform::HuggingFace => {
                if document == CARD_DOCUMENT {
                    self.registry.card_content(id).await
                } else {
                    self.registry.raw_file(id, git_ref, document).await
                }
            }
            Platform::GitHub => {
                if document == CARD_DOCUMENT {
                    self.codehost.repo_summary(id).await
                } else {
                    self.codehost.raw_file(id, git_ref, document).await
                }
            }
            Platform::Arxiv => self.papers.abstract_for(&id.name).await,
            Platform::Unknown => {
                debug!(artifact = %id, document, "no document source for unknown platform");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ExistenceProbe for PlatformGateway {
    async fn exists(&self, platform: Platform, id: &ArtifactId) -> bool {
        match platform {
            Platform::HuggingFace => self.registry.model_exists(id).await,
            Platform::GitHub => self.codehost.repo_exists(id).await,
            Platform::Arxiv | Platform::Unknown => {
                debug!(artifact = %id, platform = %platform, "no existence probe for platform");
                false
            }
        }
    }
}
