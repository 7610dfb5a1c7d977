//! Tiered cross-platform resolution.
//!
//! Three strategies in decreasing order of reliability: a direct
//! same-name existence check, link extraction over the artifact's own
//! metadata documents, and a semantic-inference guess. The first tier
//! producing a verified result wins; exhaustion is an unresolved result,
//! not an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborator::{
    collect_documents, DocumentSource, ExistenceProbe, InferenceQuestion, SemanticInference,
};
use crate::config::ResolverConfig;
use crate::extract::{clip, CandidateLink, LinkExtractor};
use crate::identifier::{ArtifactId, Platform};
use crate::score::{dedupe_candidates, tokenize, CandidateScorer};

/// Strategy that produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Same-name identifier existed on the target platform.
    Direct,
    /// An extracted, scored link passed the existence probe.
    Extraction,
    /// The semantic-inference collaborator proposed it.
    Inference,
}

impl Tier {
    /// 1-based reliability rank (1 = most reliable).
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Direct => 1,
            Tier::Extraction => 2,
            Tier::Inference => 3,
        }
    }
}

/// Outcome of one tiered resolution. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// The resolved identifier; `None` means every tier was exhausted.
    pub identifier: Option<ArtifactId>,

    /// Which tier produced the identifier.
    pub tier: Option<Tier>,

    /// Whether the existence probe confirmed the identifier live.
    pub verified: bool,
}

impl ResolutionResult {
    /// A probe-verified resolution.
    pub fn resolved(identifier: ArtifactId, tier: Tier) -> Self {
        Self {
            identifier: Some(identifier),
            tier: Some(tier),
            verified: true,
        }
    }

    /// All tiers exhausted without a confident answer.
    pub fn unresolved() -> Self {
        Self {
            identifier: None,
            tier: None,
            verified: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.identifier.is_some()
    }
}

impl Default for ResolutionResult {
    fn default() -> Self {
        ResolutionResult::unresolved()
    }
}

/// Orchestrates the three resolution tiers for one direction
/// (source platform → target platform).
pub struct TieredResolver {
    documents: Arc<dyn DocumentSource>,
    probe: Arc<dyn ExistenceProbe>,
    inference: Arc<dyn SemanticInference>,
    scorer: CandidateScorer,
    config: ResolverConfig,
}

impl TieredResolver {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        probe: Arc<dyn ExistenceProbe>,
        inference: Arc<dyn SemanticInference>,
        config: ResolverConfig,
    ) -> Self {
        let scorer = CandidateScorer::new(config.scoring.clone());
        Self {
            documents,
            probe,
            inference,
            scorer,
            config,
        }
    }

    /// Resolve `source` onto `target`. Never fails: tier misses are logged
    /// and exhaustion returns an unresolved result.
    pub async fn resolve(&self, source: &ArtifactId, target: Platform) -> ResolutionResult {
        let direct = source.clone().with_platform(target);
        if self.probe.exists(target, &direct).await {
            info!(source = %source, target = %target, "direct match verified");
            return ResolutionResult::resolved(direct, Tier::Direct);
        }
        debug!(source = %source, target = %target, "direct tier missed");

        let evidence = collect_documents(self.documents.as_ref(), source, &self.config.documents).await;

        if let Some(result) = self.extraction_tier(source, target, &evidence).await {
            return result;
        }
        if let Some(result) = self.inference_tier(source, target, &evidence).await {
            return result;
        }

        info!(source = %source, target = %target, "all tiers exhausted");
        ResolutionResult::unresolved()
    }

    /// Tier 2: scan the source's documents for links onto the target
    /// platform, score and dedupe them, then probe best-first.
    async fn extraction_tier(
        &self,
        source: &ArtifactId,
        target: Platform,
        evidence: &[(String, String)],
    ) -> Option<ResolutionResult> {
        let extractor = LinkExtractor::for_platform(target, self.config.context_window)?;
        let query_tokens = tokenize(&source.full_name());

        let mut links: Vec<CandidateLink> = Vec::new();
        for (_, body) in evidence {
            for mut link in extractor.scan(body) {
                let Ok(id) = ArtifactId::parse(&link.raw_url) else {
                    continue;
                };
                // Hub namespaces like collections/ are not artifact repos.
                if target == Platform::HuggingFace
                    && id.organization.eq_ignore_ascii_case("collections")
                {
                    continue;
                }
                link.score =
                    self.scorer
                        .score(&id, &link.context, &source.organization, &query_tokens);
                link.identifier = Some(id);
                links.push(link);
            }
        }

        let mut candidates = dedupe_candidates(links);
        if candidates.is_empty() {
            debug!(source = %source, target = %target, "extraction tier found no candidates");
            return None;
        }
        // Stable sort keeps extraction order among equal scores.
        candidates.sort_by_key(|link| std::cmp::Reverse(link.score));

        for link in candidates {
            let Some(id) = link.identifier else { continue };
            if self.probe.exists(target, &id).await {
                info!(source = %source, candidate = %id, score = link.score, "extracted link verified");
                return Some(ResolutionResult::resolved(id, Tier::Extraction));
            }
            debug!(candidate = %id, score = link.score, "extracted candidate not live");
        }
        debug!(source = %source, target = %target, "no extracted candidate passed the probe");
        None
    }

    /// Tier 3: ask the inference collaborator and verify its proposal.
    async fn inference_tier(
        &self,
        source: &ArtifactId,
        target: Platform,
        evidence: &[(String, String)],
    ) -> Option<ResolutionResult> {
        let question = InferenceQuestion::Counterpart {
            source: source.clone(),
            target,
        };
        let evidence_text = self.bounded_evidence(evidence);
        let answer = match self.inference.infer(&question, &evidence_text).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(source = %source, error = %e, "inference collaborator unavailable");
                return None;
            }
        };

        let raw = answer.identifier.filter(|_| answer.ok);
        let id = self.verify_proposal(raw, source, target).await?;
        info!(source = %source, proposal = %id, "inference proposal verified");
        Some(ResolutionResult::resolved(id, Tier::Inference))
    }

    /// Parse a proposed identifier, reject self-references, and require a
    /// live probe. Malformed or empty proposals are "no answer".
    pub(crate) async fn verify_proposal(
        &self,
        raw: Option<String>,
        source: &ArtifactId,
        target: Platform,
    ) -> Option<ArtifactId> {
        let raw = raw?;
        let Ok(parsed) = ArtifactId::parse(raw.trim()) else {
            debug!(proposal = %raw, "inference proposal is not a valid identifier");
            return None;
        };
        let id = parsed.with_platform(target);
        if id.canonical_key() == source.canonical_key() {
            debug!(proposal = %id, "inference proposed the source itself");
            return None;
        }
        if self.probe.exists(target, &id).await {
            Some(id)
        } else {
            debug!(proposal = %id, "inference proposal not live");
            None
        }
    }

    /// Join the evidence bodies, clipping each to the configured limit.
    pub(crate) fn bounded_evidence(&self, evidence: &[(String, String)]) -> String {
        evidence
            .iter()
            .map(|(_, body)| clip(body, self.config.evidence_limit))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::InferenceAnswer;
    use crate::fakes::{ScriptedInference, StaticDocuments, StaticProbe};

    fn resolver(
        documents: StaticDocuments,
        probe: StaticProbe,
        inference: ScriptedInference,
    ) -> TieredResolver {
        TieredResolver::new(
            Arc::new(documents),
            Arc::new(probe),
            Arc::new(inference),
            ResolverConfig::default(),
        )
    }

    fn hf(org: &str, name: &str) -> ArtifactId {
        ArtifactId::new(Platform::HuggingFace, org, name)
    }

    #[test]
    fn test_tier_ranks() {
        assert_eq!(Tier::Direct.rank(), 1);
        assert_eq!(Tier::Extraction.rank(), 2);
        assert_eq!(Tier::Inference.rank(), 3);
    }

    #[tokio::test]
    async fn test_direct_tier_short_circuits() {
        let probe = StaticProbe::new().with_live(Platform::GitHub, "acme/foo-7b");
        let inference = ScriptedInference::new();
        let r = resolver(StaticDocuments::new(), probe, inference);
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert_eq!(result.tier, Some(Tier::Direct));
        assert!(result.verified);
        assert_eq!(result.identifier.unwrap().full_name(), "acme/foo-7b");
    }

    #[tokio::test]
    async fn test_extraction_tier_prefers_higher_score() {
        let card = "code: https://github.com/acme/foo-7b-demo and https://github.com/acme/foo-7b-core";
        let documents = StaticDocuments::new().with_document(
            Platform::HuggingFace,
            "acme/foo-7b",
            "card",
            "main",
            card,
        );
        let probe = StaticProbe::new()
            .with_live(Platform::GitHub, "acme/foo-7b-demo")
            .with_live(Platform::GitHub, "acme/foo-7b-core");
        let r = resolver(documents, probe, ScriptedInference::new());
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert_eq!(result.tier, Some(Tier::Extraction));
        // "demo" carries a negative keyword, so the core repo wins.
        assert_eq!(result.identifier.unwrap().full_name(), "acme/foo-7b-core");
    }

    #[tokio::test]
    async fn test_extraction_tier_falls_through_dead_candidates() {
        let card = "https://github.com/acme/foo-7b-models is gone, use https://github.com/other/foo";
        let documents = StaticDocuments::new().with_document(
            Platform::HuggingFace,
            "acme/foo-7b",
            "card",
            "main",
            card,
        );
        // Only the lower-scoring candidate is live.
        let probe = StaticProbe::new().with_live(Platform::GitHub, "other/foo");
        let r = resolver(documents, probe, ScriptedInference::new());
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert_eq!(result.tier, Some(Tier::Extraction));
        assert_eq!(result.identifier.unwrap().full_name(), "other/foo");
    }

    #[tokio::test]
    async fn test_extraction_reads_secondary_ref_when_primary_absent() {
        let documents = StaticDocuments::new().with_document(
            Platform::HuggingFace,
            "acme/foo-7b",
            "README.md",
            "master",
            "see https://github.com/acme/foo-7b-models",
        );
        let probe = StaticProbe::new().with_live(Platform::GitHub, "acme/foo-7b-models");
        let r = resolver(documents, probe, ScriptedInference::new());
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert_eq!(result.tier, Some(Tier::Extraction));
    }

    #[tokio::test]
    async fn test_inference_tier_requires_probe_and_distinct_key() {
        let inference =
            ScriptedInference::new().with_reply(InferenceAnswer::proposed("mirror/foo-7b"));
        let probe = StaticProbe::new().with_live(Platform::GitHub, "mirror/foo-7b");
        let r = resolver(StaticDocuments::new(), probe, inference);
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert_eq!(result.tier, Some(Tier::Inference));
        assert!(result.verified);
    }

    #[tokio::test]
    async fn test_inference_self_proposal_is_rejected() {
        let inference =
            ScriptedInference::new().with_reply(InferenceAnswer::proposed("Acme/Foo-7B"));
        // Even live, a proposal equal to the source's canonical key is no
        // answer.
        let probe = StaticProbe::new().with_live(Platform::GitHub, "acme/foo-7b");
        let r = resolver(StaticDocuments::new(), probe, inference);
        let source = hf("acme", "foo-7b");
        let result = r.inference_tier(&source, Platform::GitHub, &[]).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_exhaustion_is_unresolved_not_error() {
        let r = resolver(
            StaticDocuments::new(),
            StaticProbe::new(),
            ScriptedInference::new(),
        );
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert!(!result.is_resolved());
        assert!(result.tier.is_none());
        assert!(!result.verified);
    }

    #[tokio::test]
    async fn test_direct_hit_never_consults_inference() {
        let probe = StaticProbe::new().with_live(Platform::GitHub, "acme/foo-7b");
        let inference = Arc::new(ScriptedInference::new());
        let r = TieredResolver::new(
            Arc::new(StaticDocuments::new()),
            Arc::new(probe),
            inference.clone(),
            ResolverConfig::default(),
        );
        let result = r.resolve(&hf("acme", "foo-7b"), Platform::GitHub).await;
        assert_eq!(result.tier, Some(Tier::Direct));
        assert_eq!(inference.call_count(), 0);
    }

    #[tokio::test]
    async fn test_registry_collections_namespace_is_skipped() {
        let readme = "browse https://huggingface.co/collections/acme-stuff for the set";
        let documents = StaticDocuments::new().with_document(
            Platform::GitHub,
            "acme/foo",
            "README.md",
            "main",
            readme,
        );
        let probe = StaticProbe::new().with_live(Platform::HuggingFace, "collections/acme-stuff");
        let r = resolver(documents, probe, ScriptedInference::new());
        let source = ArtifactId::new(Platform::GitHub, "acme", "foo");
        let result = r.resolve(&source, Platform::HuggingFace).await;
        assert!(!result.is_resolved());
    }

    #[test]
    fn test_bounded_evidence_clips_each_document() {
        let r = TieredResolver::new(
            Arc::new(StaticDocuments::new()),
            Arc::new(StaticProbe::new()),
            Arc::new(ScriptedInference::new()),
            ResolverConfig {
                evidence_limit: 4,
                ..ResolverConfig::default()
            },
        );
        let evidence = vec![
            ("card".to_string(), "aaaaaaaa".to_string()),
            ("README.md".to_string(), "bb".to_string()),
        ];
        assert_eq!(r.bounded_evidence(&evidence), "aaaa\n\nbb");
    }
}
