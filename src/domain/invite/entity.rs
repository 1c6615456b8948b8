//! Team invite records and untrusted acceptance claims

use serde::{Deserialize, Serialize};

use super::validation::{validate_invite_id, InviteValidationError};
use crate::domain::membership::TeamRole;
use crate::domain::team::{Seqno, TeamId};
use crate::domain::user::{Uid, UserVersion, UserVersionPercentForm};

/// Social services whose proofs can satisfy an SBS invite
pub const SBS_SERVICES: &[&str] = &[
    "twitter",
    "github",
    "reddit",
    "hackernews",
    "facebook",
    "mastodon",
    "rooter",
];

/// Invite identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InviteId(String);

impl InviteId {
    pub fn new(id: impl Into<String>) -> Result<Self, InviteValidationError> {
        let id = id.into().to_ascii_lowercase();
        validate_invite_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InviteId {
    type Error = InviteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InviteId> for String {
    fn from(id: InviteId) -> Self {
        id.0
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invite type as recorded on the chain link, e.g. `keybase`, `email`, `twitter`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteType(String);

impl InviteType {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    pub fn keybase() -> Self {
        Self::new("keybase")
    }

    pub fn email() -> Self {
        Self::new("email")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the category this type belongs to. Types outside the known
    /// categories are an error, never a default.
    pub fn category(&self) -> Result<InviteCategory, InviteValidationError> {
        match self.0.as_str() {
            "" => Err(InviteValidationError::EmptyType),
            "keybase" => Ok(InviteCategory::Keybase),
            "email" => Ok(InviteCategory::Email),
            service if SBS_SERVICES.contains(&service) => Ok(InviteCategory::Sbs {
                service: service.to_string(),
            }),
            other => Err(InviteValidationError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for InviteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of invite categories, one verification strategy each
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteCategory {
    /// Satisfied by a server-brokered social proof on `service`
    Sbs { service: String },
    /// Trust anchored in email delivery
    Email,
    /// Addressed to a known user version
    Keybase,
}

impl std::fmt::Display for InviteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sbs { service } => write!(f, "sbs({})", service),
            Self::Email => write!(f, "email"),
            Self::Keybase => write!(f, "keybase"),
        }
    }
}

/// Invite as recorded on the team chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInvite {
    pub id: InviteId,
    #[serde(rename = "type")]
    pub invite_type: InviteType,
    /// Category-specific name: a social username, an email address or a
    /// user version percent form
    pub name: String,
    pub role: TeamRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter: Option<UserVersion>,
}

impl TeamInvite {
    pub fn new(
        id: InviteId,
        invite_type: InviteType,
        name: impl Into<String>,
        role: TeamRole,
    ) -> Self {
        Self {
            id,
            invite_type,
            name: name.into(),
            role,
            inviter: None,
        }
    }

    /// Keybase invite addressed to a specific user version
    pub fn keybase(id: InviteId, uv: &UserVersion, role: TeamRole) -> Self {
        Self::new(id, InviteType::keybase(), uv.percent_form().as_str(), role)
    }

    pub fn category(&self) -> Result<InviteCategory, InviteValidationError> {
        self.invite_type.category()
    }

    /// The user version a keybase invite was issued to
    pub fn keybase_user_version(&self) -> Result<UserVersion, InviteValidationError> {
        match self.category()? {
            InviteCategory::Keybase => UserVersionPercentForm::parse(&self.name)
                .map_err(|_| InviteValidationError::MalformedKeybaseName(self.name.clone())),
            other => Err(InviteValidationError::NotKeybaseInvite(other.to_string())),
        }
    }
}

/// Untrusted claim, delivered by the server, that a user accepted an invite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInvitee {
    pub invite_id: InviteId,
    pub uid: Uid,
    pub eldest_seqno: Seqno,
    pub role: TeamRole,
}

impl TeamInvitee {
    pub fn new(invite_id: InviteId, uid: Uid, eldest_seqno: Seqno, role: TeamRole) -> Self {
        Self {
            invite_id,
            uid,
            eldest_seqno,
            role,
        }
    }

    pub fn user_version(&self) -> UserVersion {
        UserVersion::new(self.uid.clone(), self.eldest_seqno)
    }
}

/// Batch of acceptance claims for one team, as pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSbsMsg {
    pub team_id: TeamId,
    pub invitees: Vec<TeamInvitee>,
}

impl TeamSbsMsg {
    pub fn new(team_id: TeamId, invitees: Vec<TeamInvitee>) -> Self {
        Self { team_id, invitees }
    }
}

/// Social assertion binding an invite name on a service to a uid,
/// rendered as `<name>@<service>+uid:<uid>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbsAssertion {
    pub name: String,
    pub service: String,
    pub uid: Uid,
}

impl SbsAssertion {
    pub fn new(name: impl Into<String>, service: impl Into<String>, uid: Uid) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            uid,
        }
    }
}

impl std::fmt::Display for SbsAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}+uid:{}", self.name, self.service, self.uid)
    }
}
