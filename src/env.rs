//! Explicit dependency set shared by every team sync service

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{
    ChainAccessor, DomainError, GitMetadataRepository, IdentityResolver, NotifyRouter, TeamLoader,
};
use crate::infrastructure::{
    BroadcastNotifyRouter, CachingTeamLoader, ChangeNotificationService, GitMetadataService,
    InMemoryGitMetadataRepository, InviteService, RotationService, TeamEventDispatcher,
};

/// Collaborators and configuration that the services are built from.
///
/// Cloning is cheap; all collaborators are shared.
#[derive(Debug, Clone)]
pub struct TeamSyncEnv {
    pub chain: Arc<dyn ChainAccessor>,
    pub loader: Arc<dyn TeamLoader>,
    pub identity: Arc<dyn IdentityResolver>,
    pub notify: Arc<dyn NotifyRouter>,
    pub git_metadata: Arc<dyn GitMetadataRepository>,
    pub config: AppConfig,
}

impl TeamSyncEnv {
    pub fn builder() -> TeamSyncEnvBuilder {
        TeamSyncEnvBuilder::new()
    }

    pub fn rotation_service(&self) -> RotationService {
        RotationService::new(self.loader.clone(), self.chain.clone())
    }

    pub fn change_service(&self) -> ChangeNotificationService {
        ChangeNotificationService::new(self.loader.clone(), self.notify.clone())
            .with_mode(self.config.batch.mode)
    }

    pub fn invite_service(&self) -> InviteService {
        InviteService::new(
            self.loader.clone(),
            self.chain.clone(),
            self.identity.clone(),
        )
        .with_identify_config(self.config.identify.clone())
        .with_mode(self.config.batch.mode)
    }

    pub fn git_metadata_service(&self) -> GitMetadataService {
        GitMetadataService::new(self.loader.clone(), self.git_metadata.clone())
    }

    pub fn dispatcher(&self) -> TeamEventDispatcher {
        TeamEventDispatcher::new(
            self.rotation_service(),
            self.change_service(),
            self.invite_service(),
        )
    }
}

/// Builder for `TeamSyncEnv`.
///
/// The chain accessor and identity resolver are required. The loader
/// defaults to a `CachingTeamLoader` over the chain accessor, the notify
/// router to a `BroadcastNotifyRouter` and git metadata to an in-memory
/// repository.
#[derive(Debug, Default)]
pub struct TeamSyncEnvBuilder {
    chain: Option<Arc<dyn ChainAccessor>>,
    loader: Option<Arc<dyn TeamLoader>>,
    identity: Option<Arc<dyn IdentityResolver>>,
    notify: Option<Arc<dyn NotifyRouter>>,
    git_metadata: Option<Arc<dyn GitMetadataRepository>>,
    config: AppConfig,
}

impl TeamSyncEnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, chain: Arc<dyn ChainAccessor>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn TeamLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_notify(mut self, notify: Arc<dyn NotifyRouter>) -> Self {
        self.notify = Some(notify);
        self
    }

    pub fn with_git_metadata(mut self, git_metadata: Arc<dyn GitMetadataRepository>) -> Self {
        self.git_metadata = Some(git_metadata);
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<TeamSyncEnv, DomainError> {
        let chain = self
            .chain
            .ok_or_else(|| DomainError::configuration("A chain accessor is required"))?;
        let identity = self
            .identity
            .ok_or_else(|| DomainError::configuration("An identity resolver is required"))?;

        let loader = self.loader.unwrap_or_else(|| {
            Arc::new(CachingTeamLoader::with_config(
                chain.clone(),
                &self.config.loader,
            ))
        });
        let notify = self
            .notify
            .unwrap_or_else(|| Arc::new(BroadcastNotifyRouter::new()));
        let git_metadata = self
            .git_metadata
            .unwrap_or_else(|| Arc::new(InMemoryGitMetadataRepository::new()));

        Ok(TeamSyncEnv {
            chain,
            loader,
            identity,
            notify,
            git_metadata,
            config: self.config,
        })
    }
}
