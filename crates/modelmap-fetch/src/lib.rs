//! HTTP collaborators and persistence for modelmap.
//!
//! Concrete implementations of the `modelmap-core` collaborator traits:
//! registry and code-host clients, a paper-repository client, an
//! OpenAI-compatible semantic-inference client, and a filesystem artifact
//! store. Every client takes an explicit config with a timeout knob; none
//! reads ambient global state outside its `from_env` constructor.

pub mod codehost;
pub mod gateway;
pub mod inference;
pub mod papers;
pub mod registry;
pub mod store;

pub use codehost::{GitHubClient, GitHubConfig};
pub use gateway::PlatformGateway;
pub use inference::{ChatInferenceClient, InferenceConfig};
pub use papers::{ArxivClient, ArxivConfig};
pub use registry::{HuggingFaceClient, HuggingFaceConfig};
pub use store::FsArtifactStore;

use modelmap_core::CollaboratorError;

/// Map a reqwest failure onto the collaborator error taxonomy.
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout {
            service: service.to_string(),
        }
    } else {
        CollaboratorError::Transport {
            service: service.to_string(),
            detail: err.to_string(),
        }
    }
}
