//! User identity domain

mod entity;
mod validation;

pub use entity::{Uid, UserVersion, UserVersionPercentForm};
pub use validation::{validate_uid, UserValidationError, UID_BYTE_LEN};
