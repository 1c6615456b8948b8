//! Domain layer - Team chain types, collaborator contracts and batch outcomes

pub mod batch;
pub mod chain;
pub mod error;
pub mod event;
pub mod git_metadata;
pub mod identity;
pub mod invite;
pub mod membership;
pub mod notify;
pub mod team;
pub mod user;

pub use batch::{BatchError, BatchMode, BatchReport, RowFailure};
pub use chain::{ChainAccessor, VerifiedChain};
pub use error::DomainError;
pub use event::TeamEvent;
pub use git_metadata::{GitLocalMetadata, GitMetadataRepository, GitRepoMetadata, RepoId};
pub use identity::{IdentifyBehavior, IdentifyRequest, IdentityResolver};
pub use invite::{
    InviteCategory, InviteId, InviteType, InviteValidationError, SbsAssertion, TeamInvite,
    TeamInvitee, TeamSbsMsg,
};
pub use membership::{MembershipChangeRequest, TeamRole};
pub use notify::{NotifyRouter, TeamChangedEvent, TeamNotification};
pub use team::{
    LoadTeamArg, PerTeamKeyGeneration, Seqno, Team, TeamChangeRow, TeamChangeSet, TeamId,
    TeamLoader, TeamName, TeamTarget, TeamValidationError,
};
pub use user::{Uid, UserValidationError, UserVersion, UserVersionPercentForm};
