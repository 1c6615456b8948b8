//! Team sync services

mod change_service;
mod dispatcher;
mod git_metadata_service;
mod invite_service;
mod rotation_service;

pub use change_service::ChangeNotificationService;
pub use dispatcher::{DispatchError, DispatchOutcome, TeamEventDispatcher};
pub use git_metadata_service::GitMetadataService;
pub use invite_service::{assert_can_accept_keybase_invite, InviteService};
pub use rotation_service::{RotationOutcome, RotationService};
