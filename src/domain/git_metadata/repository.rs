//! Git metadata repository trait

use async_trait::async_trait;

use super::entity::{GitRepoMetadata, RepoId};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Storage for per-team repository metadata. Rows are keyed by
/// `(team_id, repo_id)`, so the same repo ID may exist in several teams.
#[async_trait]
pub trait GitMetadataRepository: Send + Sync + std::fmt::Debug {
    /// Insert or replace the row for `(team_id, repo_id)`
    async fn put(&self, metadata: GitRepoMetadata) -> Result<GitRepoMetadata, DomainError>;

    /// Rows belonging to one team
    async fn get_for_team(&self, team_id: &TeamId) -> Result<Vec<GitRepoMetadata>, DomainError>;

    /// Rows across all teams
    async fn get_all(&self) -> Result<Vec<GitRepoMetadata>, DomainError>;

    /// Remove one row, returning whether it existed
    async fn delete(&self, team_id: &TeamId, repo_id: &RepoId) -> Result<bool, DomainError>;

    /// Remove every row of a team, returning the number removed
    async fn delete_team(&self, team_id: &TeamId) -> Result<usize, DomainError>;
}
