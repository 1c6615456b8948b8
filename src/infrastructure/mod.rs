//! Infrastructure layer - Collaborator implementations and services

pub mod chain;
pub mod git_metadata;
pub mod identity;
pub mod logging;
pub mod notify;
pub mod services;
pub mod team;

pub use chain::InMemoryChainStore;
pub use git_metadata::InMemoryGitMetadataRepository;
pub use identity::InMemoryIdentityResolver;
pub use logging::init_logging;
pub use notify::BroadcastNotifyRouter;
pub use services::{
    ChangeNotificationService, DispatchError, DispatchOutcome, GitMetadataService, InviteService,
    RotationOutcome, RotationService, TeamEventDispatcher,
};
pub use team::CachingTeamLoader;
