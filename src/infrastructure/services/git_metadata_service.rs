//! Git metadata service - Per-team repository metadata addressed by team name

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::domain::{
    DomainError, GitLocalMetadata, GitMetadataRepository, GitRepoMetadata, LoadTeamArg, RepoId,
    Team, TeamLoader, TeamName,
};

/// Git metadata service
#[derive(Debug)]
pub struct GitMetadataService {
    loader: Arc<dyn TeamLoader>,
    repository: Arc<dyn GitMetadataRepository>,
}

impl GitMetadataService {
    pub fn new(loader: Arc<dyn TeamLoader>, repository: Arc<dyn GitMetadataRepository>) -> Self {
        Self { loader, repository }
    }

    /// Store metadata for a repository of the named team
    #[instrument(skip(self, local, cancel), fields(team_name = %team_name, repo_id = %repo_id))]
    pub async fn put_metadata(
        &self,
        team_name: &TeamName,
        repo_id: RepoId,
        local: GitLocalMetadata,
        cancel: &CancellationToken,
    ) -> Result<GitRepoMetadata, DomainError> {
        let team = self.resolve(team_name, cancel).await?;
        debug!(team_id = %team.id(), "Storing git metadata");

        self.repository
            .put(GitRepoMetadata::new(
                team.id().clone(),
                team.name().clone(),
                repo_id,
                local,
            ))
            .await
    }

    /// Metadata of one team, or of every team when `team_name` is `None`
    pub async fn get_metadata(
        &self,
        team_name: Option<&TeamName>,
        cancel: &CancellationToken,
    ) -> Result<Vec<GitRepoMetadata>, DomainError> {
        match team_name {
            Some(name) => {
                let team = self.resolve(name, cancel).await?;
                self.repository.get_for_team(team.id()).await
            }
            None => self.repository.get_all().await,
        }
    }

    pub async fn delete_metadata(
        &self,
        team_name: &TeamName,
        repo_id: &RepoId,
        cancel: &CancellationToken,
    ) -> Result<bool, DomainError> {
        let team = self.resolve(team_name, cancel).await?;
        self.repository.delete(team.id(), repo_id).await
    }

    async fn resolve(&self, name: &TeamName, cancel: &CancellationToken) -> Result<Team, DomainError> {
        self.loader.load(LoadTeamArg::by_name(name.clone()), cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TeamId, VerifiedChain};
    use crate::infrastructure::chain::InMemoryChainStore;
    use crate::infrastructure::git_metadata::InMemoryGitMetadataRepository;
    use crate::infrastructure::team::CachingTeamLoader;

    async fn service() -> GitMetadataService {
        let store = Arc::new(InMemoryChainStore::new());
        for (id, name) in [
            ("0123456789abcdef0123456789abcd24", "acme"),
            ("fedcba9876543210fedcba9876543224", "globex"),
        ] {
            store
                .create_team(VerifiedChain::new(
                    TeamId::new(id).unwrap(),
                    TeamName::new(name).unwrap(),
                ))
                .await
                .unwrap();
        }

        GitMetadataService::new(
            Arc::new(CachingTeamLoader::new(store)),
            Arc::new(InMemoryGitMetadataRepository::new()),
        )
    }

    #[tokio::test]
    async fn test_scoped_and_unscoped_queries() {
        let service = service().await;
        let cancel = CancellationToken::new();
        let acme = TeamName::new("acme").unwrap();
        let globex = TeamName::new("globex").unwrap();

        for team in [&acme, &globex] {
            service
                .put_metadata(
                    team,
                    RepoId::new("abc123").unwrap(),
                    GitLocalMetadata::new("dummy name"),
                    &cancel,
                )
                .await
                .unwrap();
        }

        let all = service.get_metadata(None, &cancel).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = service.get_metadata(Some(&acme), &cancel).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].team_name, acme);
    }

    #[tokio::test]
    async fn test_unknown_team_not_found() {
        let service = service().await;
        let err = service
            .put_metadata(
                &TeamName::new("initech").unwrap(),
                RepoId::new("abc123").unwrap(),
                GitLocalMetadata::new("dummy name"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_metadata() {
        let service = service().await;
        let cancel = CancellationToken::new();
        let acme = TeamName::new("acme").unwrap();
        let repo = RepoId::new("abc123").unwrap();

        service
            .put_metadata(&acme, repo.clone(), GitLocalMetadata::new("dummy"), &cancel)
            .await
            .unwrap();

        assert!(service.delete_metadata(&acme, &repo, &cancel).await.unwrap());
        assert!(!service.delete_metadata(&acme, &repo, &cancel).await.unwrap());
    }
}
