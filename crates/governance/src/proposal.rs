//! Proposal types
//!
//! A proposal is created once, only ever gains votes, and is never deleted.
//! Everything except the tallies and the voter set is fixed at creation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Identity, Timestamp};

/// Sequential proposal identifier, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl ProposalId {
    /// The first id ever assigned by an engine
    pub const FIRST: ProposalId = ProposalId(1);

    /// The id that follows this one
    pub fn next(self) -> ProposalId {
        ProposalId(self.0 + 1)
    }

    /// The raw number
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ProposalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ProposalId)
    }
}

impl From<u64> for ProposalId {
    fn from(value: u64) -> Self {
        ProposalId(value)
    }
}

/// Whether a proposal accepts votes
///
/// The voting window `[start_time, end_time]` is inclusive at both ends, so
/// a proposal is still `Open` at exactly `end_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Voting window has not started yet
    Pending,
    /// Inside the voting window
    Open,
    /// Voting window has passed
    Closed,
}

impl ProposalStatus {
    /// Status of the window `[start_time, end_time]`, seen at `now`
    pub fn at(now: Timestamp, start_time: Timestamp, end_time: Timestamp) -> Self {
        if now < start_time {
            ProposalStatus::Pending
        } else if now > end_time {
            ProposalStatus::Closed
        } else {
            ProposalStatus::Open
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalStatus::Pending => f.pad("pending"),
            ProposalStatus::Open => f.pad("open"),
            ProposalStatus::Closed => f.pad("closed"),
        }
    }
}

/// Running vote counts for a proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Number of affirmative votes
    pub for_votes: u64,
    /// Number of negative votes
    pub against_votes: u64,
}

impl VoteTally {
    /// Total votes cast
    pub fn total(&self) -> u64 {
        self.for_votes + self.against_votes
    }

    /// For minus against; positive when the proposal is ahead
    pub fn margin(&self) -> i128 {
        self.for_votes as i128 - self.against_votes as i128
    }
}

/// A governance proposal as held in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique identifier for this proposal
    pub id: ProposalId,
    /// Short title, opaque to the engine
    pub title: String,
    /// Free-form body, opaque to the engine
    pub content: String,
    /// The identity that created the proposal
    pub creator: Identity,
    /// When the proposal was created and voting opened
    pub start_time: Timestamp,
    /// When voting closes (inclusive)
    pub end_time: Timestamp,
    /// Number of affirmative votes
    pub for_votes: u64,
    /// Number of negative votes
    pub against_votes: u64,
    /// Everyone who has voted
    pub voters: BTreeSet<Identity>,
}

impl Proposal {
    /// Whether `now` falls inside the inclusive voting window
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.status_at(now) == ProposalStatus::Open
    }

    /// Status at the given instant
    pub fn status_at(&self, now: Timestamp) -> ProposalStatus {
        ProposalStatus::at(now, self.start_time, self.end_time)
    }

    /// Whether `identity` has voted on this proposal
    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.voters.contains(identity)
    }

    /// Current tally
    pub fn tally(&self) -> VoteTally {
        VoteTally {
            for_votes: self.for_votes,
            against_votes: self.against_votes,
        }
    }

    /// Read-only snapshot of this proposal
    pub fn view(&self) -> ProposalView {
        ProposalView {
            id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            creator: self.creator.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            for_votes: self.for_votes,
            against_votes: self.against_votes,
        }
    }
}

/// Snapshot of a proposal returned to readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    pub id: ProposalId,
    pub title: String,
    pub content: String,
    pub creator: Identity,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub for_votes: u64,
    pub against_votes: u64,
}

impl ProposalView {
    /// Status at the given instant
    pub fn status_at(&self, now: Timestamp) -> ProposalStatus {
        ProposalStatus::at(now, self.start_time, self.end_time)
    }

    /// Current tally
    pub fn tally(&self) -> VoteTally {
        VoteTally {
            for_votes: self.for_votes,
            against_votes: self.against_votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(start_time: Timestamp, end_time: Timestamp) -> Proposal {
        Proposal {
            id: ProposalId::FIRST,
            title: "Title".to_string(),
            content: "Content".to_string(),
            creator: Identity::new("creator").unwrap(),
            start_time,
            end_time,
            for_votes: 0,
            against_votes: 0,
            voters: BTreeSet::new(),
        }
    }

    #[test]
    fn test_window_is_inclusive_at_both_ends() {
        let p = proposal(100, 200);
        assert!(!p.is_open_at(99));
        assert!(p.is_open_at(100));
        assert!(p.is_open_at(200));
        assert!(!p.is_open_at(201));

        assert_eq!(p.status_at(99), ProposalStatus::Pending);
        assert_eq!(p.status_at(100), ProposalStatus::Open);
        assert_eq!(p.status_at(200), ProposalStatus::Open);
        assert_eq!(p.status_at(201), ProposalStatus::Closed);
    }

    #[test]
    fn test_tally_margin() {
        let tally = VoteTally {
            for_votes: 2,
            against_votes: 5,
        };
        assert_eq!(tally.total(), 7);
        assert_eq!(tally.margin(), -3);
    }

    #[test]
    fn test_proposal_id_parsing() {
        assert_eq!(" 12 ".parse::<ProposalId>().unwrap(), ProposalId(12));
        assert!("abc".parse::<ProposalId>().is_err());
        assert_eq!(ProposalId::FIRST.next(), ProposalId(2));
    }
}
