//! Membership change request builder

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::role::TeamRole;
use crate::domain::invite::InviteId;
use crate::domain::user::{UserVersion, UserVersionPercentForm};
use crate::domain::DomainError;

/// A set of role changes plus the invites they complete, applied to a team
/// chain as one atomic link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChangeRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<UserVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admins: Vec<UserVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writers: Vec<UserVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readers: Vec<UserVersion>,
    /// Members to remove
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub none: Vec<UserVersion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub completed_invites: BTreeMap<InviteId, UserVersionPercentForm>,
}

impl MembershipChangeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that grants `uv` the given role. `TeamRole::None` is rejected,
    /// removals go through `remove`.
    pub fn for_role(uv: UserVersion, role: TeamRole) -> Result<Self, DomainError> {
        let mut req = Self::new();
        req.add(uv, role)?;
        Ok(req)
    }

    pub fn add(&mut self, uv: UserVersion, role: TeamRole) -> Result<(), DomainError> {
        match role {
            TeamRole::Owner => self.owners.push(uv),
            TeamRole::Admin => self.admins.push(uv),
            TeamRole::Writer => self.writers.push(uv),
            TeamRole::Reader => self.readers.push(uv),
            TeamRole::None => {
                return Err(DomainError::validation(format!(
                    "cannot grant role '{}' to {}",
                    role, uv
                )))
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, uv: UserVersion) {
        self.none.push(uv);
    }

    pub fn with_completed_invite(
        mut self,
        invite_id: InviteId,
        percent_form: UserVersionPercentForm,
    ) -> Self {
        self.completed_invites.insert(invite_id, percent_form);
        self
    }

    /// Every (user, new role) pair in the request, removals last
    pub fn role_changes(&self) -> impl Iterator<Item = (&UserVersion, TeamRole)> {
        let buckets = [
            (&self.owners, TeamRole::Owner),
            (&self.admins, TeamRole::Admin),
            (&self.writers, TeamRole::Writer),
            (&self.readers, TeamRole::Reader),
            (&self.none, TeamRole::None),
        ];
        buckets
            .into_iter()
            .flat_map(|(uvs, role)| uvs.iter().map(move |uv| (uv, role)))
    }

    pub fn is_empty(&self) -> bool {
        self.role_changes().next().is_none() && self.completed_invites.is_empty()
    }
}
