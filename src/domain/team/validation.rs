//! Team validation

use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team ID cannot be empty")]
    EmptyId,

    #[error("Team ID must be {0} hex characters")]
    InvalidIdLength(usize),

    #[error("Team ID must be hex encoded")]
    InvalidIdCharacters,

    #[error("Team ID has an unknown type suffix '{0:02x}'")]
    InvalidIdSuffix(u8),

    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team name part '{0}' must be between {1} and {2} characters")]
    InvalidPartLength(String, usize, usize),

    #[error("Team name part '{0}' can only contain lowercase letters, digits and underscores")]
    InvalidPartCharacters(String),

    #[error("Team name part '{0}' cannot start with an underscore")]
    LeadingUnderscore(String),
}

/// Byte length of a decoded team ID
pub const TEAM_ID_BYTE_LEN: usize = 16;

/// Suffix byte of a root team ID
pub const ROOT_TEAM_ID_SUFFIX: u8 = 0x24;

/// Suffix byte of a subteam ID
pub const SUB_TEAM_ID_SUFFIX: u8 = 0x25;

const MIN_NAME_PART_LENGTH: usize = 2;
const MAX_NAME_PART_LENGTH: usize = 16;

/// Validate a team ID, returning its type suffix byte
pub fn validate_team_id(id: &str) -> Result<u8, TeamValidationError> {
    if id.is_empty() {
        return Err(TeamValidationError::EmptyId);
    }

    if id.len() != TEAM_ID_BYTE_LEN * 2 {
        return Err(TeamValidationError::InvalidIdLength(TEAM_ID_BYTE_LEN * 2));
    }

    let bytes = hex::decode(id).map_err(|_| TeamValidationError::InvalidIdCharacters)?;
    let suffix = bytes[TEAM_ID_BYTE_LEN - 1];

    match suffix {
        ROOT_TEAM_ID_SUFFIX | SUB_TEAM_ID_SUFFIX => Ok(suffix),
        other => Err(TeamValidationError::InvalidIdSuffix(other)),
    }
}

/// Validate a single dot-separated part of a team name
pub fn validate_team_name_part(part: &str) -> Result<(), TeamValidationError> {
    if part.len() < MIN_NAME_PART_LENGTH || part.len() > MAX_NAME_PART_LENGTH {
        return Err(TeamValidationError::InvalidPartLength(
            part.to_string(),
            MIN_NAME_PART_LENGTH,
            MAX_NAME_PART_LENGTH,
        ));
    }

    if !part
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(TeamValidationError::InvalidPartCharacters(part.to_string()));
    }

    if part.starts_with('_') {
        return Err(TeamValidationError::LeadingUnderscore(part.to_string()));
    }

    Ok(())
}

/// Validate a full (already lowercased) team name
pub fn validate_team_name(name: &str) -> Result<(), TeamValidationError> {
    if name.is_empty() {
        return Err(TeamValidationError::EmptyName);
    }

    name.split('.').try_for_each(validate_team_name_part)
}
