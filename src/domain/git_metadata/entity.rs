//! Per-team git repository metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::team::{TeamId, TeamName};
use crate::domain::DomainError;

/// Opaque repository identifier chosen by the client
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(String);

impl RepoId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::invalid_id("Repo ID cannot be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side metadata about a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLocalMetadata {
    pub repo_name: String,
}

impl GitLocalMetadata {
    pub fn new(repo_name: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.into(),
        }
    }
}

/// Stored metadata row, scoped to one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepoMetadata {
    pub team_id: TeamId,
    pub team_name: TeamName,
    pub repo_id: RepoId,
    pub local: GitLocalMetadata,
    pub last_modified: DateTime<Utc>,
}

impl GitRepoMetadata {
    pub fn new(team_id: TeamId, team_name: TeamName, repo_id: RepoId, local: GitLocalMetadata) -> Self {
        Self {
            team_id,
            team_name,
            repo_id,
            local,
            last_modified: Utc::now(),
        }
    }
}
