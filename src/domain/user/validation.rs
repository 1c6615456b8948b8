//! User identifier validation

use thiserror::Error;

/// Errors that can occur during user identifier validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("UID cannot be empty")]
    EmptyUid,

    #[error("UID must be {0} hex characters")]
    InvalidUidLength(usize),

    #[error("UID must be hex encoded")]
    InvalidUidCharacters,

    #[error("UID has an unknown type suffix '{0:02x}'")]
    InvalidUidSuffix(u8),

    #[error("Malformed user version '{0}', expected '<uid>%<eldest seqno>'")]
    MalformedPercentForm(String),

    #[error("Eldest seqno cannot be negative")]
    NegativeEldestSeqno,
}

pub const UID_BYTE_LEN: usize = 16;

const UID_SUFFIX: u8 = 0x19;
const UID_SUFFIX_LEGACY: u8 = 0x00;

/// Validate a UID string
pub fn validate_uid(uid: &str) -> Result<(), UserValidationError> {
    if uid.is_empty() {
        return Err(UserValidationError::EmptyUid);
    }

    if uid.len() != UID_BYTE_LEN * 2 {
        return Err(UserValidationError::InvalidUidLength(UID_BYTE_LEN * 2));
    }

    let bytes = hex::decode(uid).map_err(|_| UserValidationError::InvalidUidCharacters)?;

    match bytes[UID_BYTE_LEN - 1] {
        UID_SUFFIX | UID_SUFFIX_LEGACY => Ok(()),
        other => Err(UserValidationError::InvalidUidSuffix(other)),
    }
}
