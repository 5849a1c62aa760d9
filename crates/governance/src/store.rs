//! JSON state store for governance hosts
//!
//! The engine keeps its registry in memory. Hosts that need it to outlive
//! the process snapshot it with [`GovernanceEngine::snapshot`] and write it
//! here; loading goes back through [`GovernanceEngine::restore`], which
//! checks the registry invariants.
//!
//! [`GovernanceEngine::snapshot`]: crate::GovernanceEngine::snapshot
//! [`GovernanceEngine::restore`]: crate::GovernanceEngine::restore

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::{Proposal, ProposalId};

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored state breaks a registry invariant
    #[error("Corrupt governance state: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistable form of the engine's registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Id handed to the next proposal
    pub next_proposal_id: ProposalId,
    /// All proposals, in id order
    pub proposals: Vec<Proposal>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            next_proposal_id: ProposalId::FIRST,
            proposals: Vec::new(),
        }
    }
}

/// File-backed store holding a single JSON snapshot
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store at `path`; nothing is touched until load or save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if none has been saved yet
    pub async fn load(&self) -> StoreResult<Option<EngineState>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No governance state found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let state: EngineState = serde_json::from_slice(&data)?;
        info!(
            path = %self.path.display(),
            proposals = state.proposals.len(),
            "Loaded governance state"
        );
        Ok(Some(state))
    }

    /// Write the snapshot, replacing any previous one
    ///
    /// The data goes to a sibling temp file first and is renamed over the
    /// target, so readers never see a half-written snapshot.
    pub async fn save(&self, state: &EngineState) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &self.path).await?;

        info!(
            path = %self.path.display(),
            proposals = state.proposals.len(),
            "Saved governance state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedClock, GovernanceEngine, Identity};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));

        let mut engine = GovernanceEngine::with_clock(FixedClock(1_000));
        let member1 = Identity::new("member1").unwrap();
        let id = engine
            .create_proposal(&member1, "Title", "Content", 1)
            .unwrap();
        engine.vote(&member1, id, false).unwrap();

        store.save(&engine.snapshot()).await.unwrap();
        let state = store.load().await.unwrap().unwrap();
        assert_eq!(state, engine.snapshot());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_garbage_is_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = StateStore::new(path);
        assert!(matches!(
            store.load().await,
            Err(StoreError::Serialization(_))
        ));
    }
}
