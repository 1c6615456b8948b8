//! In-memory git metadata repository

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{DomainError, GitMetadataRepository, GitRepoMetadata, RepoId, TeamId};

/// Thread-safe in-memory metadata store, ordered by team then repo
#[derive(Debug, Default)]
pub struct InMemoryGitMetadataRepository {
    rows: RwLock<BTreeMap<(TeamId, RepoId), GitRepoMetadata>>,
}

impl InMemoryGitMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GitMetadataRepository for InMemoryGitMetadataRepository {
    async fn put(&self, metadata: GitRepoMetadata) -> Result<GitRepoMetadata, DomainError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        rows.insert(
            (metadata.team_id.clone(), metadata.repo_id.clone()),
            metadata.clone(),
        );
        Ok(metadata)
    }

    async fn get_for_team(&self, team_id: &TeamId) -> Result<Vec<GitRepoMetadata>, DomainError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(rows
            .iter()
            .filter(|((team, _), _)| team == team_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn get_all(&self) -> Result<Vec<GitRepoMetadata>, DomainError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(rows.values().cloned().collect())
    }

    async fn delete(&self, team_id: &TeamId, repo_id: &RepoId) -> Result<bool, DomainError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(rows.remove(&(team_id.clone(), repo_id.clone())).is_some())
    }

    async fn delete_team(&self, team_id: &TeamId) -> Result<usize, DomainError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        let before = rows.len();
        rows.retain(|(team, _), _| team != team_id);
        Ok(before - rows.len())
    }
}
