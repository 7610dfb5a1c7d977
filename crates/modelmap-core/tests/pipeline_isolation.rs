//! Integration tests for the pipeline coordinator's partial-failure policy.

use std::sync::Arc;

use modelmap_core::fakes::{
    MemoryArtifactStore, ScriptedInference, StaticDocuments, StaticProbe, UnreachableDocuments,
};
use modelmap_core::{
    PipelineCoordinator, Platform, ResolverConfig, StageStatus, Tier,
};

fn live_registry_probe() -> StaticProbe {
    StaticProbe::new().with_live(Platform::HuggingFace, "acme/foo-7b")
}

/// A failing collaborator in one stage leaves the other stages running
/// and the failure recorded on the report.
#[tokio::test]
async fn test_stage_two_failure_keeps_pipeline_going() {
    let documents = StaticDocuments::new().with_document(
        Platform::HuggingFace,
        "acme/foo-7b",
        "card",
        "main",
        "---\nlicense: apache-2.0\n---",
    );
    let store = Arc::new(MemoryArtifactStore::new().with_failure_on("features.json"));
    let coordinator = PipelineCoordinator::new(
        Arc::new(documents),
        Arc::new(live_registry_probe()),
        Arc::new(ScriptedInference::new()),
        store.clone(),
        ResolverConfig::default(),
    );

    let report = coordinator.process("acme/foo-7b").await.expect("report");

    let statuses: Vec<(String, StageStatus)> = report
        .stages
        .iter()
        .map(|s| (s.stage.clone(), s.status))
        .collect();
    assert_eq!(statuses.len(), 4);
    assert_eq!(statuses[0], ("retrieve".to_string(), StageStatus::Completed));
    assert_eq!(statuses[1], ("filter".to_string(), StageStatus::Failed));
    assert_eq!(statuses[2], ("provenance".to_string(), StageStatus::Completed));
    assert_eq!(statuses[3], ("evaluate".to_string(), StageStatus::Completed));
    assert_eq!(report.failed_stages(), vec!["filter"]);

    // Later stages still persisted their outputs.
    assert!(store.get("acme_foo-7b", "provenance.json").is_some());
    assert!(store.get("acme_foo-7b", "evaluation.json").is_some());
}

/// Unreachable document retrieval degrades every fetch to absent: the
/// pipeline completes with an empty-evidence report instead of failing.
#[tokio::test]
async fn test_unreachable_documents_still_complete() {
    let coordinator = PipelineCoordinator::new(
        Arc::new(UnreachableDocuments),
        Arc::new(live_registry_probe()),
        Arc::new(ScriptedInference::new()),
        Arc::new(MemoryArtifactStore::new()),
        ResolverConfig::default(),
    );

    let report = coordinator.process("acme/foo-7b").await.expect("report");
    assert_eq!(report.registry.tier, Some(Tier::Direct));
    assert!(!report.features.has_card);
    assert!(report.stages.iter().all(|s| s.status != StageStatus::Failed));
}

/// Batch processing records malformed inputs and keeps going; the batch
/// report accounts for every input.
#[tokio::test]
async fn test_batch_never_aborts() {
    let coordinator = PipelineCoordinator::new(
        Arc::new(StaticDocuments::new()),
        Arc::new(live_registry_probe()),
        Arc::new(ScriptedInference::new()),
        Arc::new(MemoryArtifactStore::new()),
        ResolverConfig::default(),
    );

    let inputs: Vec<String> = ["acme/foo-7b", "not a reference", "acme/ghost"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let batch = coordinator.process_batch(&inputs).await;

    assert_eq!(batch.processed_count() + batch.failure_count(), inputs.len());
    assert_eq!(batch.failure_count(), 1);
    assert_eq!(batch.failures[0].input, "not a reference");
    // The well-formed but unresolvable artifact still produced a report.
    assert!(batch
        .reports
        .iter()
        .any(|r| r.input == "acme/ghost" && !r.registry.is_resolved()));
}
