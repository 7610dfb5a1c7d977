//! Provenance resolution: walk a derivative artifact back toward its base.
//!
//! Each step asks the semantic-inference collaborator for the immediate
//! ancestor over the current artifact's own documents, verifies the
//! proposal, and guards against self-reference and cycles.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborator::{
    collect_documents, DocumentSource, ExistenceProbe, InferenceQuestion, SemanticInference,
};
use crate::config::ResolverConfig;
use crate::extract::clip;
use crate::identifier::ArtifactId;

/// Why a provenance walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkEnd {
    /// The inference collaborator reported no ancestor.
    NoAncestor,
    /// A proposed ancestor did not parse or failed the existence probe.
    Unverified,
    /// The proposed ancestor was the current artifact itself.
    SelfReference,
    /// The proposed ancestor was already in the chain.
    CycleDetected,
    /// The configured maximum depth was reached.
    DepthLimit,
    /// No evidence documents could be retrieved for the current artifact.
    NoEvidence,
}

/// Ancestry of an artifact, from the queried artifact toward its base.
///
/// Always contains at least the starting artifact; no canonical key
/// appears twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceChain {
    pub artifacts: Vec<ArtifactId>,
    pub ended: WalkEnd,
}

impl ProvenanceChain {
    /// The artifact the walk started from.
    pub fn start(&self) -> &ArtifactId {
        &self.artifacts[0]
    }

    /// The oldest ancestor found (the start itself if none).
    pub fn base(&self) -> &ArtifactId {
        self.artifacts.last().unwrap_or(&self.artifacts[0])
    }

    /// Number of ancestors found.
    pub fn depth(&self) -> usize {
        self.artifacts.len().saturating_sub(1)
    }
}

/// Walks provenance by repeated semantic-inference queries.
pub struct ProvenanceResolver {
    documents: Arc<dyn DocumentSource>,
    probe: Arc<dyn ExistenceProbe>,
    inference: Arc<dyn SemanticInference>,
    config: ResolverConfig,
}

impl ProvenanceResolver {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        probe: Arc<dyn ExistenceProbe>,
        inference: Arc<dyn SemanticInference>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            documents,
            probe,
            inference,
            config,
        }
    }

    /// Walk from `start` toward its base artifact. Never fails: every
    /// terminal condition is recorded on the returned chain.
    pub async fn resolve_provenance(&self, start: &ArtifactId) -> ProvenanceChain {
        let mut artifacts = vec![start.clone()];
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.canonical_key());
        let mut current = start.clone();

        let mut ended = WalkEnd::DepthLimit;
        for _ in 0..self.config.max_provenance_depth {
            match self.step(&current, &visited).await {
                Step::Ancestor(ancestor) => {
                    info!(artifact = %current, ancestor = %ancestor, "verified provenance ancestor");
                    visited.insert(ancestor.canonical_key());
                    artifacts.push(ancestor.clone());
                    current = ancestor;
                }
                Step::End(end) => {
                    ended = end;
                    break;
                }
            }
        }

        info!(start = %start, depth = artifacts.len() - 1, ended = ?ended, "provenance walk finished");
        ProvenanceChain { artifacts, ended }
    }

    /// One walk step: gather evidence, ask for the ancestor, verify it.
    async fn step(&self, current: &ArtifactId, visited: &HashSet<String>) -> Step {
        let evidence =
            collect_documents(self.documents.as_ref(), current, &self.config.documents).await;
        if evidence.is_empty() {
            debug!(artifact = %current, "no evidence documents for provenance step");
            return Step::End(WalkEnd::NoEvidence);
        }
        let evidence_text = evidence
            .iter()
            .map(|(_, body)| clip(body, self.config.evidence_limit))
            .collect::<Vec<_>>()
            .join("\n\n");

        let question = InferenceQuestion::BaseArtifact {
            artifact: current.clone(),
        };
        let answer = match self.inference.infer(&question, &evidence_text).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(artifact = %current, error = %e, "inference collaborator unavailable");
                return Step::End(WalkEnd::NoAncestor);
            }
        };
        if !answer.ok {
            return Step::End(WalkEnd::NoAncestor);
        }
        let Some(raw) = answer.identifier else {
            return Step::End(WalkEnd::NoAncestor);
        };

        let Ok(parsed) = ArtifactId::parse(raw.trim()) else {
            debug!(proposal = %raw, "ancestor proposal is not a valid identifier");
            return Step::End(WalkEnd::Unverified);
        };
        let ancestor = parsed.with_platform(current.platform);

        if ancestor.canonical_key() == current.canonical_key() {
            debug!(artifact = %current, "ancestor proposal is the artifact itself");
            return Step::End(WalkEnd::SelfReference);
        }
        if visited.contains(&ancestor.canonical_key()) {
            debug!(ancestor = %ancestor, "ancestor already visited");
            return Step::End(WalkEnd::CycleDetected);
        }
        if !self.probe.exists(ancestor.platform, &ancestor).await {
            debug!(ancestor = %ancestor, "ancestor proposal not live");
            return Step::End(WalkEnd::Unverified);
        }
        Step::Ancestor(ancestor)
    }
}

enum Step {
    Ancestor(ArtifactId),
    End(WalkEnd),
}
