//! Pipeline coordination: staged per-artifact processing and batch driving.
//!
//! Each artifact runs four stages (retrieve, filter, provenance,
//! evaluate). A stage failure is caught, logged, and recorded; later
//! stages still run against default values. At the batch level each
//! artifact is isolated the same way, so one bad input never aborts the
//! run.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::collaborator::{
    collect_documents, ArtifactStore, DocumentSource, ExistenceProbe, SemanticInference,
    CARD_DOCUMENT,
};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::extract::LinkExtractor;
use crate::identifier::{ArtifactId, Platform};
use crate::provenance::{ProvenanceChain, ProvenanceResolver};
use crate::resolver::{ResolutionResult, Tier, TieredResolver};

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Failed,
    Skipped,
}

/// Record of one stage attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage name.
    pub stage: String,

    /// How the stage ended.
    pub status: StageStatus,

    /// Failure or skip reason, if any.
    pub detail: Option<String>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl StageReport {
    fn completed(stage: &str, started: Instant) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Completed,
            detail: None,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn failed(stage: &str, started: Instant, detail: String) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Failed,
            detail: Some(detail),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn skipped(stage: &str, detail: &str) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Skipped,
            detail: Some(detail.to_string()),
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == StageStatus::Completed
    }
}

/// Structured features filtered out of the fetched documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactFeatures {
    /// A platform card body was retrieved.
    pub has_card: bool,

    /// A README body was retrieved.
    pub has_readme: bool,

    /// License declared in the card metadata, if any.
    pub license: Option<String>,

    /// Paper identifiers linked from the documents.
    pub paper_ids: Vec<String>,

    /// Frameworks mentioned in the documents.
    pub frameworks: Vec<String>,
}

/// Downstream evaluation: which evidence classes were recovered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub registry_resolved: bool,
    pub code_resolved: bool,
    pub paper_found: bool,
    pub license_found: bool,
    pub base_artifact_found: bool,

    /// Count of the evidence classes above that were recovered.
    pub evidence_score: u32,
}

impl EvaluationSummary {
    fn evaluate(
        registry: &ResolutionResult,
        code: &ResolutionResult,
        features: &ArtifactFeatures,
        provenance: Option<&ProvenanceChain>,
    ) -> Self {
        let mut summary = Self {
            registry_resolved: registry.is_resolved(),
            code_resolved: code.is_resolved(),
            paper_found: !features.paper_ids.is_empty(),
            license_found: features.license.is_some(),
            base_artifact_found: provenance.is_some_and(|chain| chain.depth() > 0),
            evidence_score: 0,
        };
        summary.evidence_score = [
            summary.registry_resolved,
            summary.code_resolved,
            summary.paper_found,
            summary.license_found,
            summary.base_artifact_found,
        ]
        .iter()
        .filter(|present| **present)
        .count() as u32;
        summary
    }
}

/// Everything the pipeline learned about one artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReport {
    /// The input string as given.
    pub input: String,

    /// Model-registry identifier resolution.
    pub registry: ResolutionResult,

    /// Code-host identifier resolution.
    pub code: ResolutionResult,

    /// Filtered features.
    pub features: ArtifactFeatures,

    /// Provenance chain, when the walk ran.
    pub provenance: Option<ProvenanceChain>,

    /// Code repository of the base artifact, when one was found.
    pub base_code: Option<ResolutionResult>,

    /// Evaluation summary.
    pub evaluation: EvaluationSummary,

    /// Per-stage outcomes, in execution order.
    pub stages: Vec<StageReport>,

    /// When processing finished.
    pub completed_at: DateTime<Utc>,
}

impl ArtifactReport {
    /// Names of stages that failed.
    pub fn failed_stages(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Failed)
            .map(|s| s.stage.as_str())
            .collect()
    }
}

/// One artifact the batch driver could not process at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub input: String,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub reports: Vec<ArtifactReport>,
    pub failures: Vec<BatchFailure>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn processed_count(&self) -> usize {
        self.reports.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// What the retrieval stage hands to the later stages.
#[derive(Debug, Default)]
struct Retrieval {
    registry: ResolutionResult,
    code: ResolutionResult,
    /// `(document name, body)` pairs, registry documents first.
    evidence: Vec<(String, String)>,
}

const STAGE_RETRIEVE: &str = "retrieve";
const STAGE_FILTER: &str = "filter";
const STAGE_PROVENANCE: &str = "provenance";
const STAGE_EVALUATE: &str = "evaluate";

/// Drives the stages for each artifact and iterates over batches.
pub struct PipelineCoordinator {
    documents: Arc<dyn DocumentSource>,
    store: Arc<dyn ArtifactStore>,
    resolver: TieredResolver,
    provenance: ProvenanceResolver,
    probe: Arc<dyn ExistenceProbe>,
    config: ResolverConfig,
}

impl PipelineCoordinator {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        probe: Arc<dyn ExistenceProbe>,
        inference: Arc<dyn SemanticInference>,
        store: Arc<dyn ArtifactStore>,
        config: ResolverConfig,
    ) -> Self {
        let resolver = TieredResolver::new(
            documents.clone(),
            probe.clone(),
            inference.clone(),
            config.clone(),
        );
        let provenance =
            ProvenanceResolver::new(documents.clone(), probe.clone(), inference, config.clone());
        Self {
            documents,
            store,
            resolver,
            provenance,
            probe,
            config,
        }
    }

    /// Process one artifact input.
    ///
    /// Only a malformed input is an error; every other condition is
    /// recorded in the report and processing continues.
    pub async fn process(&self, input: &str) -> Result<ArtifactReport, ResolveError> {
        let parsed = ArtifactId::parse(input)?;
        let dir_key = parsed.storage_key();
        info!(input, artifact = %parsed, "processing artifact");

        let mut stages = Vec::new();

        // Stage 1: retrieve-and-normalize.
        let started = Instant::now();
        let retrieval = match self.retrieve_stage(&parsed, &dir_key).await {
            Ok(retrieval) => {
                stages.push(StageReport::completed(STAGE_RETRIEVE, started));
                retrieval
            }
            Err(e) => {
                warn!(stage = STAGE_RETRIEVE, error = %e, "stage failed");
                stages.push(StageReport::failed(STAGE_RETRIEVE, started, e.to_string()));
                Retrieval::default()
            }
        };

        // Stage 2: feature filtering.
        let started = Instant::now();
        let features = match self.filter_stage(&retrieval, &dir_key).await {
            Ok(features) => {
                stages.push(StageReport::completed(STAGE_FILTER, started));
                features
            }
            Err(e) => {
                warn!(stage = STAGE_FILTER, error = %e, "stage failed");
                stages.push(StageReport::failed(STAGE_FILTER, started, e.to_string()));
                ArtifactFeatures::default()
            }
        };

        // Stage 3: provenance resolution.
        let started = Instant::now();
        let (provenance, base_code) = match retrieval.registry.identifier.clone() {
            None => {
                stages.push(StageReport::skipped(
                    STAGE_PROVENANCE,
                    "registry identifier unresolved",
                ));
                (None, None)
            }
            Some(registry_id) => match self.provenance_stage(&registry_id, &dir_key).await {
                Ok(outcome) => {
                    stages.push(StageReport::completed(STAGE_PROVENANCE, started));
                    outcome
                }
                Err(e) => {
                    warn!(stage = STAGE_PROVENANCE, error = %e, "stage failed");
                    stages.push(StageReport::failed(STAGE_PROVENANCE, started, e.to_string()));
                    (None, None)
                }
            },
        };

        // Stage 4: downstream evaluation.
        let started = Instant::now();
        let summary = EvaluationSummary::evaluate(
            &retrieval.registry,
            &retrieval.code,
            &features,
            provenance.as_ref(),
        );
        let evaluation = match self.persist_json(&dir_key, "evaluation.json", &summary).await {
            Ok(()) => {
                stages.push(StageReport::completed(STAGE_EVALUATE, started));
                summary
            }
            Err(e) => {
                warn!(stage = STAGE_EVALUATE, error = %e, "stage failed");
                stages.push(StageReport::failed(STAGE_EVALUATE, started, e.to_string()));
                EvaluationSummary::default()
            }
        };

        Ok(ArtifactReport {
            input: input.to_string(),
            registry: retrieval.registry,
            code: retrieval.code,
            features,
            provenance,
            base_code,
            evaluation,
            stages,
            completed_at: Utc::now(),
        })
    }

    /// Process a batch of inputs, one after another. An artifact whose
    /// processing fails is recorded and the batch continues.
    pub async fn process_batch(&self, inputs: &[String]) -> BatchReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, total = inputs.len(), "starting batch run");

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (index, input) in inputs.iter().enumerate() {
            info!(entry = index + 1, total = inputs.len(), input = %input, "batch entry");
            match self.process(input).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(input = %input, error = %e, "artifact failed; continuing batch");
                    failures.push(BatchFailure {
                        input: input.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(%run_id, processed = reports.len(), failed = failures.len(), "batch run finished");
        BatchReport {
            run_id,
            reports,
            failures,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Probe both platforms for the input identity, resolve the missing
    /// side through the tiers, then fetch and persist the evidence
    /// documents of each resolved side.
    async fn retrieve_stage(&self, parsed: &ArtifactId, dir_key: &str) -> anyhow::Result<Retrieval> {
        let registry_seed = parsed.clone().with_platform(Platform::HuggingFace);
        let code_seed = parsed.clone().with_platform(Platform::GitHub);

        let registry_live = self.probe.exists(Platform::HuggingFace, &registry_seed).await;
        let code_live = self.probe.exists(Platform::GitHub, &code_seed).await;

        let registry = if registry_live {
            ResolutionResult::resolved(registry_seed.clone(), Tier::Direct)
        } else if code_live {
            self.resolver.resolve(&code_seed, Platform::HuggingFace).await
        } else {
            ResolutionResult::unresolved()
        };

        let code = if code_live {
            ResolutionResult::resolved(code_seed.clone(), Tier::Direct)
        } else if let Some(registry_id) = &registry.identifier {
            self.resolver.resolve(registry_id, Platform::GitHub).await
        } else {
            ResolutionResult::unresolved()
        };

        let mut evidence = Vec::new();
        if let Some(registry_id) = &registry.identifier {
            for (name, body) in
                collect_documents(self.documents.as_ref(), registry_id, &self.config.documents)
                    .await
            {
                self.store.persist(dir_key, &name, body.as_bytes()).await?;
                evidence.push((name, body));
            }
        }
        if let Some(code_id) = &code.identifier {
            for (name, body) in
                collect_documents(self.documents.as_ref(), code_id, &self.config.documents).await
            {
                let stored = format!("code_{name}");
                self.store.persist(dir_key, &stored, body.as_bytes()).await?;
                evidence.push((stored, body));
            }
        }

        Ok(Retrieval {
            registry,
            code,
            evidence,
        })
    }

    /// Derive structured features from the retrieved documents and persist
    /// them, together with the abstract of the first linked paper.
    async fn filter_stage(
        &self,
        retrieval: &Retrieval,
        dir_key: &str,
    ) -> anyhow::Result<ArtifactFeatures> {
        let mut features = ArtifactFeatures {
            has_card: retrieval
                .evidence
                .iter()
                .any(|(name, _)| name == CARD_DOCUMENT),
            has_readme: retrieval
                .evidence
                .iter()
                .any(|(name, _)| name.ends_with("README.md")),
            ..ArtifactFeatures::default()
        };

        let license = Regex::new(r"(?mi)^license:\s*(\S+)").expect("builtin pattern compiles");
        let frameworks = ["pytorch", "tensorflow", "jax", "transformers", "safetensors"];
        let paper_links = LinkExtractor::for_platform(Platform::Arxiv, 0);

        for (_, body) in &retrieval.evidence {
            if features.license.is_none() {
                if let Some(captures) = license.captures(body) {
                    features.license = Some(captures[1].to_string());
                }
            }
            let lowered = body.to_lowercase();
            for framework in frameworks {
                if lowered.contains(framework) && !features.frameworks.contains(&framework.to_string()) {
                    features.frameworks.push(framework.to_string());
                }
            }
            if let Some(extractor) = &paper_links {
                for link in extractor.scan(body) {
                    if let Ok(paper) = ArtifactId::parse(&link.raw_url) {
                        if !features.paper_ids.contains(&paper.name) {
                            features.paper_ids.push(paper.name.clone());
                        }
                    }
                }
            }
        }

        // Pull the first linked paper's abstract alongside the features;
        // a missing or unreachable paper is not a stage failure.
        if let Some(paper_id) = features.paper_ids.first() {
            let paper = ArtifactId::new(Platform::Arxiv, "abs", paper_id.clone());
            match self
                .documents
                .fetch_document(Platform::Arxiv, &paper, "abstract", "")
                .await
            {
                Ok(Some(abstract_text)) => {
                    self.store
                        .persist(dir_key, "paper_abstract.txt", abstract_text.as_bytes())
                        .await?;
                }
                Ok(None) => {}
                Err(e) => warn!(paper = %paper_id, error = %e, "paper abstract fetch failed"),
            }
        }

        self.persist_json(dir_key, "features.json", &features).await?;
        Ok(features)
    }

    /// Walk provenance from the registry identifier; when an ancestor is
    /// found, also resolve the ancestor's code repository.
    async fn provenance_stage(
        &self,
        registry_id: &ArtifactId,
        dir_key: &str,
    ) -> anyhow::Result<(Option<ProvenanceChain>, Option<ResolutionResult>)> {
        let chain = self.provenance.resolve_provenance(registry_id).await;
        self.persist_json(dir_key, "provenance.json", &chain).await?;

        let base_code = if chain.depth() > 0 {
            Some(self.resolver.resolve(chain.base(), Platform::GitHub).await)
        } else {
            None
        };
        Ok((Some(chain), base_code))
    }

    async fn persist_json<T: Serialize>(
        &self,
        dir_key: &str,
        name: &str,
        value: &T,
    ) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.store.persist(dir_key, name, &bytes).await?;
        Ok(())
    }
}
