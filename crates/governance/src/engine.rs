//! Governance engine implementation
//!
//! This module owns the proposal registry and every lifecycle transition:
//! proposal creation, vote casting, and the read-only queries over tallies
//! and participation. Every operation is synchronous and atomic: inputs are
//! validated in full before any state changes.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::store::{EngineState, StoreError, StoreResult};
use crate::{
    Clock, GovernanceError, GovernanceResult, Identity, Proposal, ProposalId, ProposalStatus,
    ProposalView, SystemClock, Timestamp, VoteTally, SECONDS_PER_DAY,
};

/// The proposal registry and voting state machine
#[derive(Debug)]
pub struct GovernanceEngine<C: Clock = SystemClock> {
    /// Source of the current time
    clock: C,
    /// Proposals by id, in id order
    proposals: BTreeMap<ProposalId, Proposal>,
    /// Id handed to the next proposal
    next_proposal_id: ProposalId,
}

impl GovernanceEngine<SystemClock> {
    /// Create an empty engine on the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for GovernanceEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> GovernanceEngine<C> {
    /// Create an empty engine reading time from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            proposals: BTreeMap::new(),
            next_proposal_id: ProposalId::FIRST,
        }
    }

    /// The clock this engine reads
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current time according to the engine's clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Create a new proposal and return its id
    ///
    /// Voting opens immediately and stays open for `duration_days` whole
    /// days. Titles and contents need not be unique.
    pub fn create_proposal(
        &mut self,
        caller: &Identity,
        title: impl Into<String>,
        content: impl Into<String>,
        duration_days: i64,
    ) -> GovernanceResult<ProposalId> {
        let title = title.into();
        let content = content.into();

        if title.trim().is_empty() {
            return Err(GovernanceError::InvalidProposal(
                "Title cannot be empty".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(GovernanceError::InvalidProposal(
                "Content cannot be empty".to_string(),
            ));
        }
        if duration_days <= 0 {
            return Err(GovernanceError::InvalidDuration(duration_days));
        }

        let start_time = self.clock.now();
        let end_time = (duration_days as u64)
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|secs| start_time.checked_add(secs))
            .ok_or(GovernanceError::InvalidDuration(duration_days))?;

        let id = self.next_proposal_id;
        let proposal = Proposal {
            id,
            title,
            content,
            creator: caller.clone(),
            start_time,
            end_time,
            for_votes: 0,
            against_votes: 0,
            voters: BTreeSet::new(),
        };

        self.proposals.insert(id, proposal);
        self.next_proposal_id = id.next();

        info!(
            proposal_id = %id,
            creator = %caller,
            start_time,
            end_time,
            "Created proposal"
        );
        Ok(id)
    }

    /// Cast `caller`'s vote on a proposal
    ///
    /// A vote is final: it cannot be changed, retracted, or cast again.
    pub fn vote(
        &mut self,
        caller: &Identity,
        proposal_id: ProposalId,
        support: bool,
    ) -> GovernanceResult<()> {
        let now = self.clock.now();
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        if proposal.has_voted(caller) {
            warn!(proposal_id = %proposal_id, voter = %caller, "Rejected duplicate vote");
            return Err(GovernanceError::AlreadyVoted {
                proposal_id,
                voter: caller.clone(),
            });
        }

        if !proposal.is_open_at(now) {
            warn!(
                proposal_id = %proposal_id,
                voter = %caller,
                now,
                start_time = proposal.start_time,
                end_time = proposal.end_time,
                "Rejected vote outside voting window"
            );
            return Err(GovernanceError::VotingClosed {
                proposal_id,
                now,
                start_time: proposal.start_time,
                end_time: proposal.end_time,
            });
        }

        proposal.voters.insert(caller.clone());
        if support {
            proposal.for_votes += 1;
        } else {
            proposal.against_votes += 1;
        }

        info!(
            proposal_id = %proposal_id,
            voter = %caller,
            support,
            for_votes = proposal.for_votes,
            against_votes = proposal.against_votes,
            "Recorded vote"
        );
        Ok(())
    }

    /// Snapshot of a proposal's fields and current tallies
    pub fn get_proposal_details(&self, proposal_id: ProposalId) -> GovernanceResult<ProposalView> {
        debug!(proposal_id = %proposal_id, "Reading proposal details");
        self.proposal(proposal_id).map(Proposal::view)
    }

    /// Whether `identity` has voted on a proposal
    pub fn check_has_voted(
        &self,
        proposal_id: ProposalId,
        identity: &Identity,
    ) -> GovernanceResult<bool> {
        Ok(self.proposal(proposal_id)?.has_voted(identity))
    }

    /// Borrow a proposal from the registry
    pub fn proposal(&self, proposal_id: ProposalId) -> GovernanceResult<&Proposal> {
        self.proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))
    }

    /// Number of proposals ever created
    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// The id the next proposal will receive
    pub fn next_proposal_id(&self) -> ProposalId {
        self.next_proposal_id
    }

    /// Views of every proposal, oldest first
    pub fn list_proposals(&self) -> Vec<ProposalView> {
        self.proposals.values().map(Proposal::view).collect()
    }

    /// Whether a proposal is pending, open or closed right now
    pub fn proposal_status(&self, proposal_id: ProposalId) -> GovernanceResult<ProposalStatus> {
        let now = self.clock.now();
        Ok(self.proposal(proposal_id)?.status_at(now))
    }

    /// Current vote counts for a proposal
    pub fn tally(&self, proposal_id: ProposalId) -> GovernanceResult<VoteTally> {
        Ok(self.proposal(proposal_id)?.tally())
    }

    /// Everyone who has voted on a proposal, sorted
    pub fn voters(&self, proposal_id: ProposalId) -> GovernanceResult<Vec<Identity>> {
        Ok(self.proposal(proposal_id)?.voters.iter().cloned().collect())
    }

    /// Capture the registry for persistence
    pub fn snapshot(&self) -> EngineState {
        EngineState {
            next_proposal_id: self.next_proposal_id,
            proposals: self.proposals.values().cloned().collect(),
        }
    }

    /// Rebuild an engine from a persisted snapshot
    ///
    /// The snapshot must satisfy every registry invariant: ids dense from 1
    /// in order, the next id one past the last, a non-empty voting window,
    /// and tallies that add up to the voter count.
    pub fn restore(state: EngineState, clock: C) -> StoreResult<Self> {
        let mut proposals = BTreeMap::new();
        let mut expected = ProposalId::FIRST;

        for proposal in state.proposals {
            if proposal.id != expected {
                return Err(StoreError::Corrupt(format!(
                    "expected proposal {} but found {}",
                    expected, proposal.id
                )));
            }
            if proposal.end_time <= proposal.start_time {
                return Err(StoreError::Corrupt(format!(
                    "proposal {} ends at {} before it starts at {}",
                    proposal.id, proposal.end_time, proposal.start_time
                )));
            }
            let votes = proposal.for_votes.checked_add(proposal.against_votes);
            if votes != Some(proposal.voters.len() as u64) {
                return Err(StoreError::Corrupt(format!(
                    "proposal {} has {} for and {} against but {} voters",
                    proposal.id,
                    proposal.for_votes,
                    proposal.against_votes,
                    proposal.voters.len()
                )));
            }
            expected = expected.next();
            proposals.insert(proposal.id, proposal);
        }

        if state.next_proposal_id != expected {
            return Err(StoreError::Corrupt(format!(
                "next proposal id is {} but {} proposals are stored",
                state.next_proposal_id,
                proposals.len()
            )));
        }

        info!(proposals = proposals.len(), "Restored governance state");
        Ok(Self {
            clock,
            proposals,
            next_proposal_id: state.next_proposal_id,
        })
    }
}
