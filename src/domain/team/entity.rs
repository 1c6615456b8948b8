//! Team entity and related types

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{
    validate_team_id, validate_team_name, TeamValidationError, SUB_TEAM_ID_SUFFIX,
};
use crate::domain::chain::VerifiedChain;

/// Team identifier - 16 hex-encoded bytes, the last byte encodes root vs subteam
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into().to_ascii_lowercase();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this ID belongs to a subteam
    pub fn is_sub_team(&self) -> bool {
        self.0.ends_with(&format!("{:02x}", SUB_TEAM_ID_SUFFIX))
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully qualified team name, e.g. `acme.eng`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// Create a new TeamName. Input is lowercased before validation.
    pub fn new(name: impl Into<String>) -> Result<Self, TeamValidationError> {
        let name = name.into().to_lowercase();
        validate_team_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name parts from the root down
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn is_root(&self) -> bool {
        !self.0.contains('.')
    }

    /// Name of the root team this name lives under
    pub fn root_ancestor(&self) -> TeamName {
        match self.0.split_once('.') {
            Some((root, _)) => Self(root.to_string()),
            None => self.clone(),
        }
    }

    /// Parent team name, `None` for a root team
    pub fn parent(&self) -> Option<TeamName> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Self(parent.to_string()))
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequence number of a link in a signed chain
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Seqno(pub i64);

impl Seqno {
    pub const ZERO: Seqno = Seqno(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Seqno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team key generation counter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PerTeamKeyGeneration(pub u32);

impl PerTeamKeyGeneration {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for PerTeamKeyGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authoritative in-memory view of a team, projected from its verified chain.
///
/// A `Team` is an immutable snapshot. Reloading produces a new value; holders
/// of an older snapshot keep seeing the state they loaded.
#[derive(Debug, Clone)]
pub struct Team {
    chain: Arc<VerifiedChain>,
    loaded_at: DateTime<Utc>,
}

impl Team {
    /// Project a team from a verified chain
    pub fn from_chain(chain: VerifiedChain) -> Self {
        Self {
            chain: Arc::new(chain),
            loaded_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &TeamId {
        self.chain.team_id()
    }

    pub fn name(&self) -> &TeamName {
        self.chain.name()
    }

    pub fn generation(&self) -> PerTeamKeyGeneration {
        self.chain.generation()
    }

    pub fn latest_seqno(&self) -> Seqno {
        self.chain.latest_seqno()
    }

    /// Handle to the verified chain this snapshot was built from
    pub fn chain(&self) -> &VerifiedChain {
        &self.chain
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
