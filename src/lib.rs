//! GovMode
//!
//! A proposal and voting engine for member governance: time-bounded
//! proposals, one irrevocable vote per member, and public tallies.

/// Module version information
pub mod version {
    /// The current version of the GovMode library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// The proposal registry and voting state machine
pub use govmode_governance as governance;

/// Host configuration
pub use govmode_config as config;

pub use govmode_governance::{
    Governance, GovernanceEngine, GovernanceError, GovernanceResult, Identity, ProposalId,
    ProposalView, SharedGovernance,
};
