//! Shared, concurrently accessible governance handle
//!
//! Multithreaded hosts serialize every operation through one lock around
//! the engine: mutations take it for writing, reads for reading.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Clock, EngineState, GovernanceEngine, GovernanceResult, Identity, ProposalId, ProposalView,
};

/// A trait for governance operations
#[async_trait]
pub trait Governance: Send + Sync {
    /// Create a new proposal on behalf of `caller`
    async fn create_proposal(
        &self,
        caller: &Identity,
        title: String,
        content: String,
        duration_days: i64,
    ) -> GovernanceResult<ProposalId>;

    /// Cast `caller`'s vote on a proposal
    async fn vote(
        &self,
        caller: &Identity,
        proposal_id: ProposalId,
        support: bool,
    ) -> GovernanceResult<()>;

    /// Get a proposal by ID
    async fn get_proposal_details(&self, proposal_id: ProposalId)
        -> GovernanceResult<ProposalView>;

    /// Whether `identity` has voted on a proposal
    async fn check_has_voted(
        &self,
        proposal_id: ProposalId,
        identity: &Identity,
    ) -> GovernanceResult<bool>;

    /// List all proposals
    async fn list_proposals(&self) -> GovernanceResult<Vec<ProposalView>>;
}

/// Cloneable handle to an engine behind a single lock
pub struct SharedGovernance<C: Clock> {
    engine: Arc<RwLock<GovernanceEngine<C>>>,
}

impl<C: Clock> Clone for SharedGovernance<C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<C: Clock> SharedGovernance<C> {
    /// Wrap an engine for shared use
    pub fn new(engine: GovernanceEngine<C>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    /// Consistent snapshot of the registry
    pub async fn snapshot(&self) -> EngineState {
        self.engine.read().await.snapshot()
    }
}

#[async_trait]
impl<C: Clock> Governance for SharedGovernance<C> {
    async fn create_proposal(
        &self,
        caller: &Identity,
        title: String,
        content: String,
        duration_days: i64,
    ) -> GovernanceResult<ProposalId> {
        let mut engine = self.engine.write().await;
        engine.create_proposal(caller, title, content, duration_days)
    }

    async fn vote(
        &self,
        caller: &Identity,
        proposal_id: ProposalId,
        support: bool,
    ) -> GovernanceResult<()> {
        let mut engine = self.engine.write().await;
        engine.vote(caller, proposal_id, support)
    }

    async fn get_proposal_details(
        &self,
        proposal_id: ProposalId,
    ) -> GovernanceResult<ProposalView> {
        self.engine.read().await.get_proposal_details(proposal_id)
    }

    async fn check_has_voted(
        &self,
        proposal_id: ProposalId,
        identity: &Identity,
    ) -> GovernanceResult<bool> {
        self.engine
            .read()
            .await
            .check_has_voted(proposal_id, identity)
    }

    async fn list_proposals(&self) -> GovernanceResult<Vec<ProposalView>> {
        Ok(self.engine.read().await.list_proposals())
    }
}
