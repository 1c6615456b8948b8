//! Invite validation

use thiserror::Error;

/// Errors that can occur while reading invite records
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InviteValidationError {
    #[error("Invite ID cannot be empty")]
    EmptyId,

    #[error("Invite ID must be hex encoded")]
    InvalidIdCharacters,

    #[error("Invite type cannot be empty")]
    EmptyType,

    #[error("Unknown invite category '{0}'")]
    UnknownCategory(String),

    #[error("Invite name cannot be empty")]
    EmptyName,

    #[error("Invite of category '{0}' does not carry a keybase user version")]
    NotKeybaseInvite(String),

    #[error("Keybase invite name '{0}' is not a user version")]
    MalformedKeybaseName(String),
}

/// Validate an invite ID
pub fn validate_invite_id(id: &str) -> Result<(), InviteValidationError> {
    if id.is_empty() {
        return Err(InviteValidationError::EmptyId);
    }

    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(InviteValidationError::InvalidIdCharacters);
    }

    Ok(())
}
