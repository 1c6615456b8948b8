//! Team invites

mod entity;
mod validation;

pub use entity::{
    InviteCategory, InviteId, InviteType, SbsAssertion, TeamInvite, TeamInvitee, TeamSbsMsg,
    SBS_SERVICES,
};
pub use validation::{validate_invite_id, InviteValidationError};
