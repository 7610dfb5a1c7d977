//! End-to-end resolution scenarios over the in-memory fakes.

use std::sync::Arc;

use modelmap_core::fakes::{ScriptedInference, StaticDocuments, StaticProbe};
use modelmap_core::{
    tokenize, ArtifactId, CandidateScorer, InferenceAnswer, LinkExtractor, Platform,
    ProvenanceResolver, ResolveError, ResolverConfig, ScoringConfig, Tier, TieredResolver,
};

fn resolver(
    documents: StaticDocuments,
    probe: StaticProbe,
    inference: Arc<ScriptedInference>,
) -> TieredResolver {
    TieredResolver::new(
        Arc::new(documents),
        Arc::new(probe),
        inference,
        ResolverConfig::default(),
    )
}

/// Scenario: a bare canonical token parses with an unknown platform and
/// preserved casing.
#[test]
fn test_bare_token_parses_to_unknown_platform() {
    let id = ArtifactId::parse("acme/foo-7b").expect("well-formed");
    assert_eq!(id.platform, Platform::Unknown);
    assert_eq!(id.organization, "acme");
    assert_eq!(id.name, "foo-7b");
    assert_eq!(id.canonical_key(), "acme/foo-7b");
}

/// Scenario: a metadata document with one code-host link yields one
/// normalized candidate; the near-miss org gets no org bonus, the shared
/// name token scores.
#[test]
fn test_single_link_extraction_and_score() {
    let document = "Weights for foo-7b. Code: https://github.com/AcmeLabs/foo-core";
    let extractor = LinkExtractor::for_platform(Platform::GitHub, 80).expect("extractor");
    let links: Vec<_> = extractor.scan(document).collect();
    assert_eq!(links.len(), 1);

    let candidate = ArtifactId::parse(&links[0].raw_url).expect("normalizes");
    assert_eq!(candidate.canonical_key(), "acmelabs/foo-core");

    let scorer = CandidateScorer::new(ScoringConfig::default());
    let tokens = tokenize("acme/foo-7b");
    // org "acme" != "acmelabs" (no +5); token "foo" appears in "foo-core" (+2).
    let score = scorer.score(&candidate, &links[0].context, "acme", &tokens);
    assert_eq!(score, 2);
}

/// Scenario: the direct tier wins without the inference collaborator ever
/// being consulted.
#[tokio::test]
async fn test_direct_tier_skips_inference() {
    let probe = StaticProbe::new().with_live(Platform::GitHub, "acme/foo-7b");
    let inference = Arc::new(ScriptedInference::new());
    let r = resolver(StaticDocuments::new(), probe, inference.clone());

    let source = ArtifactId::new(Platform::HuggingFace, "acme", "foo-7b");
    let result = r.resolve(&source, Platform::GitHub).await;

    assert_eq!(result.tier, Some(Tier::Direct));
    assert!(result.verified);
    assert_eq!(inference.call_count(), 0);
}

/// Scenario: all three tiers fail; the outcome is an unresolved result,
/// not an error.
#[tokio::test]
async fn test_total_exhaustion_is_a_result() {
    let inference = Arc::new(ScriptedInference::new().with_reply(InferenceAnswer::none()));
    let r = resolver(StaticDocuments::new(), StaticProbe::new(), inference);

    let source = ArtifactId::new(Platform::HuggingFace, "acme", "foo-7b");
    let result = r.resolve(&source, Platform::GitHub).await;

    assert!(result.identifier.is_none());
    assert!(result.tier.is_none());
    assert!(!result.verified);
}

/// Scenario: the inference collaborator proposes the artifact itself as
/// its own ancestor; the self-reference guard ends the walk at length 1.
#[tokio::test]
async fn test_provenance_self_reference_guard() {
    let documents = StaticDocuments::new().with_document(
        Platform::HuggingFace,
        "acme/foo-7b",
        "card",
        "main",
        "model card text",
    );
    let probe = StaticProbe::new().with_live(Platform::HuggingFace, "acme/foo-7b");
    let inference = Arc::new(ScriptedInference::new().with_reply(InferenceAnswer::proposed("acme/foo-7b")));
    let walker = ProvenanceResolver::new(
        Arc::new(documents),
        Arc::new(probe),
        inference,
        ResolverConfig::default(),
    );

    let start = ArtifactId::new(Platform::HuggingFace, "acme", "foo-7b");
    let chain = walker.resolve_provenance(&start).await;
    assert_eq!(chain.artifacts.len(), 1);
    assert_eq!(chain.start().canonical_key(), "acme/foo-7b");
}

/// A tier-2 or tier-3 identifier is only ever returned verified: a
/// candidate that fails the probe falls through to exhaustion.
#[tokio::test]
async fn test_resolved_results_are_always_verified() {
    let documents = StaticDocuments::new().with_document(
        Platform::HuggingFace,
        "acme/foo-7b",
        "card",
        "main",
        "Code: https://github.com/acme/foo-7b (dead link)",
    );
    let inference = Arc::new(ScriptedInference::new().with_reply(InferenceAnswer::proposed("ghost/repo")));
    // Nothing is live.
    let r = resolver(documents, StaticProbe::new(), inference);

    let source = ArtifactId::new(Platform::HuggingFace, "acme", "foo-7b");
    let result = r.resolve(&source, Platform::GitHub).await;
    assert!(result.identifier.is_none());
}

/// Malformed inputs fail with the one caller-visible error.
#[test]
fn test_malformed_inputs() {
    for input in ["", "no-slash", "a/b/c", "https://github.com/lonely"] {
        assert!(
            matches!(
                ArtifactId::parse(input),
                Err(ResolveError::MalformedInput { .. })
            ),
            "{input:?} should be malformed"
        );
    }
}
