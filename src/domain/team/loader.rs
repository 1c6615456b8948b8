//! Team loader trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
use mockall::automock;

use super::entity::{Team, TeamId, TeamName};
use crate::domain::DomainError;

/// Which team to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamTarget {
    Id(TeamId),
    Name(TeamName),
}

impl std::fmt::Display for TeamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{}", id),
            Self::Name(name) => write!(f, "name:{}", name),
        }
    }
}

/// Arguments for loading a team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTeamArg {
    pub target: TeamTarget,
    /// Bypass the cache and rebuild from the chain
    pub force_repoll: bool,
}

impl LoadTeamArg {
    pub fn by_id(id: TeamId) -> Self {
        Self {
            target: TeamTarget::Id(id),
            force_repoll: false,
        }
    }

    pub fn by_name(name: TeamName) -> Self {
        Self {
            target: TeamTarget::Name(name),
            force_repoll: false,
        }
    }

    pub fn with_force_repoll(mut self) -> Self {
        self.force_repoll = true;
        self
    }
}

/// Produces authoritative team snapshots, owning the per-team cache
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TeamLoader: Send + Sync + std::fmt::Debug {
    /// Load a team, from cache unless `force_repoll` is set
    async fn load(&self, arg: LoadTeamArg, cancel: &CancellationToken)
        -> Result<Team, DomainError>;

    /// Refresh the cached snapshot and name mapping of a renamed team
    async fn notify_team_rename(
        &self,
        id: &TeamId,
        new_name: &TeamName,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;
}
