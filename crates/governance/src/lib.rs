//! Governance engine for GovMode
//!
//! This crate provides the proposal registry and voting state machine:
//! members create time-bounded proposals, other members cast a single,
//! irrevocable vote on each, and anyone may read tallies and participation.
//!
//! The engine trusts the caller identity and the clock it is given. Identity
//! authentication and persistence are the host's concern; [`store`] offers a
//! JSON snapshot store for hosts that want one.

use thiserror::Error;

pub mod clock;
pub mod engine;
pub mod identity;
pub mod proposal;
pub mod shared;
pub mod store;

// Re-exports
pub use clock::{Clock, FixedClock, ManualClock, SystemClock, Timestamp, SECONDS_PER_DAY};
pub use engine::GovernanceEngine;
pub use identity::Identity;
pub use proposal::{Proposal, ProposalId, ProposalStatus, ProposalView, VoteTally};
pub use shared::{Governance, SharedGovernance};
pub use store::{EngineState, StateStore, StoreError, StoreResult};

/// Error types for governance operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// Duration was zero or negative, or too large to represent
    #[error("Invalid duration: {0} days (must be a positive number of days)")]
    InvalidDuration(i64),

    /// Proposal not found
    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// The caller already voted on this proposal
    #[error("{voter} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Identity,
    },

    /// The current time is outside the proposal's voting window
    #[error(
        "Voting on proposal {proposal_id} is closed at {now} (window [{start_time}, {end_time}])"
    )]
    VotingClosed {
        proposal_id: ProposalId,
        now: Timestamp,
        start_time: Timestamp,
        end_time: Timestamp,
    },

    /// Invalid proposal input
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    /// Invalid caller identity
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
