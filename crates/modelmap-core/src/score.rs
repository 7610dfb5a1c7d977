//! Heuristic confidence scoring for extracted candidate links.
//!
//! The weights and keyword lists are configuration, not constants: the
//! defaults reproduce the values tuned against production traffic, with no
//! claim of optimality.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extract::CandidateLink;
use crate::identifier::ArtifactId;

/// Additive scoring weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Candidate org equals the querying org (case-insensitive).
    pub org_match: i32,

    /// Per query-name token contained in the candidate name.
    pub name_token: i32,

    /// Candidate name contains a generic-relevance keyword.
    pub relevance_keyword: i32,

    /// Per negative-signal keyword present in the candidate name.
    pub negative_keyword: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            org_match: 5,
            name_token: 2,
            relevance_keyword: 2,
            negative_keyword: -2,
        }
    }
}

/// Scoring weights plus keyword lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,

    /// Keywords marking a repository as generically model-related.
    pub relevance_keywords: Vec<String>,

    /// Keywords marking auxiliary, non-canonical repositories.
    pub negative_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            relevance_keywords: to_strings(&["model", "models", "llm"]),
            negative_keywords: to_strings(&[
                "api",
                "client",
                "sdk",
                "demo",
                "website",
                "docs",
                "doc",
                "notebook",
                "colab",
                "examples",
                "sample",
                "bench",
                "leaderboard",
                "eval",
                "evaluation",
                "convert",
                "export",
                "deploy",
                "inference",
                "space",
                "slim",
                "angelslim",
            ]),
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Lower-cased alphanumeric tokens of an identifier-ish string.
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Deterministic, pure scorer over a candidate's identifier segments.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    config: ScoringConfig,
}

impl CandidateScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score one candidate against the querying artifact's organization and
    /// name tokens.
    ///
    /// The context window is part of the scoring interface; the current
    /// rules score on the identifier segments alone. Identical inputs
    /// always yield the identical score.
    pub fn score(
        &self,
        candidate: &ArtifactId,
        _context: &str,
        query_org: &str,
        query_tokens: &[String],
    ) -> i32 {
        let weights = self.config.weights;
        let org = candidate.organization.to_lowercase();
        let name = candidate.name.to_lowercase();
        let mut score = 0;

        if !query_org.is_empty() && org == query_org.to_lowercase() {
            score += weights.org_match;
        }
        for token in query_tokens {
            if !token.is_empty() && name.contains(token.as_str()) {
                score += weights.name_token;
            }
        }
        if self
            .config
            .relevance_keywords
            .iter()
            .any(|k| name.contains(k.as_str()))
        {
            score += weights.relevance_keyword;
        }
        for keyword in &self.config.negative_keywords {
            if name.contains(keyword.as_str()) {
                score += weights.negative_keyword;
            }
        }
        score
    }
}

/// Deduplicate scored candidates by canonical key.
///
/// First-seen order and casing are kept; the surviving entry carries the
/// highest score observed for its key. Distinct canonical identifiers are
/// never merged. Links the scoring stage could not normalize are dropped.
pub fn dedupe_candidates(links: Vec<CandidateLink>) -> Vec<CandidateLink> {
    let mut kept: Vec<CandidateLink> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for link in links {
        let Some(id) = &link.identifier else { continue };
        let key = id.canonical_key();
        match by_key.get(&key) {
            Some(&at) => {
                if link.score > kept[at].score {
                    kept[at].score = link.score;
                }
            }
            None => {
                by_key.insert(key, kept.len());
                kept.push(link);
            }
        }
    }
    kept
}
