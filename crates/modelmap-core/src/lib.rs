//! modelmap core: tiered cross-platform artifact resolution.
//!
//! Given an artifact known on one platform (a model registry, a code
//! host), resolves the corresponding identifiers on related platforms and
//! walks the chain of artifacts it was derived from. Heterogeneous,
//! partially missing evidence (platform metadata, README text, embedded
//! links) funnels into an ordered decision procedure; an external
//! semantic-inference service is the fallible last resort.
//!
//! The core talks to the outside world only through the `collaborator`
//! traits; concrete HTTP/LLM/filesystem implementations live in
//! `modelmap-fetch`.

pub mod collaborator;
pub mod config;
pub mod error;
pub mod extract;
pub mod fakes;
pub mod identifier;
pub mod pipeline;
pub mod provenance;
pub mod resolver;
pub mod score;
pub mod telemetry;

pub use collaborator::{
    collect_documents, ArtifactStore, DocumentSource, ExistenceProbe, InferenceAnswer,
    InferenceQuestion, SemanticInference, CARD_DOCUMENT,
};
pub use config::{DocumentSpec, ResolverConfig};
pub use error::{CollaboratorError, CollaboratorResult, ResolveError, Result};
pub use extract::{CandidateLink, LinkExtractor};
pub use identifier::{ArtifactId, Platform};
pub use pipeline::{
    ArtifactFeatures, ArtifactReport, BatchFailure, BatchReport, EvaluationSummary,
    PipelineCoordinator, StageReport, StageStatus,
};
pub use provenance::{ProvenanceChain, ProvenanceResolver, WalkEnd};
pub use resolver::{ResolutionResult, Tier, TieredResolver};
pub use score::{dedupe_candidates, tokenize, CandidateScorer, ScoreWeights, ScoringConfig};
pub use telemetry::init_tracing;
