//! User identity types

use serde::{Deserialize, Serialize};

use super::validation::{validate_uid, UserValidationError};
use crate::domain::team::Seqno;

/// User identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    pub fn new(uid: impl Into<String>) -> Result<Self, UserValidationError> {
        let uid = uid.into().to_ascii_lowercase();
        validate_uid(&uid)?;
        Ok(Self(uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Uid {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One incarnation of a user: the UID plus the seqno of its eldest key.
///
/// An eldest seqno of zero marks a reset account that has not provisioned a
/// new eldest key yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserVersion {
    pub uid: Uid,
    pub eldest_seqno: Seqno,
}

impl UserVersion {
    pub fn new(uid: Uid, eldest_seqno: Seqno) -> Self {
        Self { uid, eldest_seqno }
    }

    /// Whether this version refers to a reset account
    pub fn is_reset(&self) -> bool {
        self.eldest_seqno == Seqno::ZERO
    }

    pub fn percent_form(&self) -> UserVersionPercentForm {
        UserVersionPercentForm(format!("{}%{}", self.uid, self.eldest_seqno))
    }
}

impl std::fmt::Display for UserVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%{}", self.uid, self.eldest_seqno)
    }
}

/// String form of a user version, `<uid>%<eldest seqno>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserVersionPercentForm(String);

impl UserVersionPercentForm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into a user version
    pub fn parse(s: &str) -> Result<UserVersion, UserValidationError> {
        let (uid, eldest) = s
            .split_once('%')
            .ok_or_else(|| UserValidationError::MalformedPercentForm(s.to_string()))?;

        let uid = Uid::new(uid)?;
        let eldest: i64 = eldest
            .parse()
            .map_err(|_| UserValidationError::MalformedPercentForm(s.to_string()))?;

        if eldest < 0 {
            return Err(UserValidationError::NegativeEldestSeqno);
        }

        Ok(UserVersion::new(uid, Seqno(eldest)))
    }

    pub fn to_user_version(&self) -> Result<UserVersion, UserValidationError> {
        Self::parse(&self.0)
    }
}

impl std::fmt::Display for UserVersionPercentForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
