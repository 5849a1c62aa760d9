//! Member identities
//!
//! An identity is whatever account name the host execution context hands
//! the engine. It is trusted as given; the only check is that it is not empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GovernanceError, GovernanceResult};

/// The identity of a member account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create an identity, rejecting empty or whitespace-only names
    pub fn new(id: impl Into<String>) -> GovernanceResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(GovernanceError::InvalidIdentity(
                "Identity cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// The identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = GovernanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
