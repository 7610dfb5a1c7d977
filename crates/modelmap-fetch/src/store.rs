//! Filesystem artifact store, partitioned per artifact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use modelmap_core::{ArtifactStore, CollaboratorResult};
use tracing::debug;

/// Artifact store writing one directory per artifact under a root.
///
/// Layout: `<root>/<dir_key>/<document name>`. The directory key is the
/// artifact's sanitized storage key, so concurrent runs against different
/// artifacts never touch the same partition.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding one artifact's documents.
    pub fn partition(&self, dir_key: &str) -> PathBuf {
        self.root.join(dir_key)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn persist(&self, dir_key: &str, name: &str, contents: &[u8]) -> CollaboratorResult<()> {
        let dir = self.partition(dir_key);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(name);
        tokio::fs::write(&path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "persisted artifact document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_writes_under_partition() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store
            .persist("acme_foo-7b", "card", b"card body")
            .await
            .expect("persist");

        let written = std::fs::read(dir.path().join("acme_foo-7b").join("card")).unwrap();
        assert_eq!(written, b"card body");
    }

    #[tokio::test]
    async fn test_partitions_are_disjoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.persist("a", "doc", b"one").await.expect("persist");
        store.persist("b", "doc", b"two").await.expect("persist");

        assert_eq!(std::fs::read(store.partition("a").join("doc")).unwrap(), b"one");
        assert_eq!(std::fs::read(store.partition("b").join("doc")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.persist("a", "doc", b"first").await.expect("persist");
        store.persist("a", "doc", b"second").await.expect("persist");
        assert_eq!(
            std::fs::read(store.partition("a").join("doc")).unwrap(),
            b"second"
        );
    }
}
