//! In-memory fakes for collaborator traits (testing only)
//!
//! Provides `StaticDocuments`, `StaticProbe`, `ScriptedInference`, and
//! `MemoryArtifactStore` that satisfy the trait contracts without any
//! external dependencies.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborator::{
    ArtifactStore, DocumentSource, ExistenceProbe, InferenceAnswer, InferenceQuestion,
    SemanticInference,
};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::identifier::{ArtifactId, Platform};

// ---------------------------------------------------------------------------
// StaticDocuments
// ---------------------------------------------------------------------------

/// Document source backed by a map keyed by
/// `(platform, canonical key, document, ref)`.
#[derive(Debug, Default)]
pub struct StaticDocuments {
    docs: HashMap<(Platform, String, String, String), String>,
}

impl StaticDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document body. `key` is the canonical `org/name` form.
    pub fn with_document(
        mut self,
        platform: Platform,
        key: &str,
        document: &str,
        git_ref: &str,
        body: &str,
    ) -> Self {
        self.docs.insert(
            (
                platform,
                key.to_lowercase(),
                document.to_string(),
                git_ref.to_string(),
            ),
            body.to_string(),
        );
        self
    }
}

#[async_trait]
impl DocumentSource for StaticDocuments {
    async fn fetch_document(
        &self,
        platform: Platform,
        id: &ArtifactId,
        document: &str,
        git_ref: &str,
    ) -> CollaboratorResult<Option<String>> {
        Ok(self
            .docs
            .get(&(
                platform,
                id.canonical_key(),
                document.to_string(),
                git_ref.to_string(),
            ))
            .cloned())
    }
}

/// Document source whose every fetch fails with a transport error.
#[derive(Debug, Default)]
pub struct UnreachableDocuments;

#[async_trait]
impl DocumentSource for UnreachableDocuments {
    async fn fetch_document(
        &self,
        _platform: Platform,
        _id: &ArtifactId,
        _document: &str,
        _git_ref: &str,
    ) -> CollaboratorResult<Option<String>> {
        Err(CollaboratorError::Transport {
            service: "documents".to_string(),
            detail: "unreachable".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// StaticProbe
// ---------------------------------------------------------------------------

/// Existence probe backed by a set of live `(platform, canonical key)`
/// pairs. Records every probe for assertions.
#[derive(Debug, Default)]
pub struct StaticProbe {
    live: HashSet<(Platform, String)>,
    calls: Mutex<Vec<(Platform, String)>>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` (canonical `org/name`) as live on `platform`.
    pub fn with_live(mut self, platform: Platform, key: &str) -> Self {
        self.live.insert((platform, key.to_lowercase()));
        self
    }

    /// Identifiers probed so far, in call order.
    pub fn probed(&self) -> Vec<(Platform, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExistenceProbe for StaticProbe {
    async fn exists(&self, platform: Platform, id: &ArtifactId) -> bool {
        let key = id.canonical_key();
        self.calls.lock().unwrap().push((platform, key.clone()));
        self.live.contains(&(platform, key))
    }
}

// ---------------------------------------------------------------------------
// ScriptedInference
// ---------------------------------------------------------------------------

/// Inference collaborator that replays a scripted sequence of answers and
/// records the questions it was asked.
#[derive(Debug, Default)]
pub struct ScriptedInference {
    replies: Mutex<VecDeque<InferenceAnswer>>,
    calls: Mutex<Vec<InferenceQuestion>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next answer. Once the script runs dry the fake answers
    /// "no answer" forever.
    pub fn with_reply(self, answer: InferenceAnswer) -> Self {
        self.replies.lock().unwrap().push_back(answer);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn questions(&self) -> Vec<InferenceQuestion> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SemanticInference for ScriptedInference {
    async fn infer(
        &self,
        question: &InferenceQuestion,
        _evidence: &str,
    ) -> CollaboratorResult<InferenceAnswer> {
        self.calls.lock().unwrap().push(question.clone());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(InferenceAnswer::none))
    }
}

// ---------------------------------------------------------------------------
// MemoryArtifactStore
// ---------------------------------------------------------------------------

/// In-memory artifact store keyed by `(dir_key, name)`. Can be told to
/// fail persisting one specific document name, for isolation tests.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    files: Mutex<HashMap<(String, String), Vec<u8>>>,
    fail_on: Option<String>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `persist` fail whenever the document name equals `name`.
    pub fn with_failure_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    pub fn get(&self, dir_key: &str, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&(dir_key.to_string(), name.to_string()))
            .cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn persist(&self, dir_key: &str, name: &str, contents: &[u8]) -> CollaboratorResult<()> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(CollaboratorError::Transport {
                service: "store".to_string(),
                detail: format!("scripted failure persisting {name}"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert((dir_key.to_string(), name.to_string()), contents.to_vec());
        Ok(())
    }
}
