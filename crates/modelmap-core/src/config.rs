//! Resolution heuristics configuration.
//!
//! There is no ambient state: the caller builds one `ResolverConfig` at
//! startup and threads it into the resolver, the provenance walker, and the
//! pipeline coordinator.

use serde::{Deserialize, Serialize};

use crate::score::ScoringConfig;

/// A metadata document the resolver scans, with fallback refs tried in
/// order when the first is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSpec {
    /// Document name as understood by the retrieval collaborator.
    pub name: String,

    /// Refs (branches) to try, in order.
    pub refs: Vec<String>,
}

impl DocumentSpec {
    pub fn new(name: impl Into<String>, refs: &[&str]) -> Self {
        Self {
            name: name.into(),
            refs: refs.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Configuration for the resolution core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Candidate scoring weights and keyword lists.
    pub scoring: ScoringConfig,

    /// Documents the extraction tier scans, in order.
    pub documents: Vec<DocumentSpec>,

    /// Characters of context captured on each side of an extracted link.
    pub context_window: usize,

    /// Per-document cap on the evidence text handed to the inference
    /// collaborator.
    pub evidence_limit: usize,

    /// Maximum number of ancestors a provenance walk may collect.
    pub max_provenance_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            documents: vec![
                DocumentSpec::new(crate::collaborator::CARD_DOCUMENT, &["main"]),
                DocumentSpec::new("README.md", &["main", "master"]),
            ],
            context_window: 80,
            evidence_limit: 12_000,
            max_provenance_depth: 5,
        }
    }
}

impl ResolverConfig {
    /// Override the provenance depth limit.
    pub fn with_max_provenance_depth(mut self, depth: usize) -> Self {
        self.max_provenance_depth = depth;
        self
    }

    /// Override the scoring configuration.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }
}
