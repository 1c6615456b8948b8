//! Verified team chain state

use std::collections::BTreeMap;

use crate::domain::invite::{InviteId, TeamInvite};
use crate::domain::membership::{MembershipChangeRequest, TeamRole};
use crate::domain::team::{PerTeamKeyGeneration, Seqno, TeamId, TeamName};
use crate::domain::user::UserVersion;
use crate::domain::DomainError;

/// State of a team chain after signature and link verification.
///
/// Only the accessor produces values of this type; consumers treat it as
/// read-only. The `rotated` and `with_membership_change` helpers compute the
/// successor state a chain-mutating backend would append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedChain {
    team_id: TeamId,
    name: TeamName,
    generation: PerTeamKeyGeneration,
    latest_seqno: Seqno,
    members: BTreeMap<UserVersion, TeamRole>,
    active_invites: BTreeMap<InviteId, TeamInvite>,
}

impl VerifiedChain {
    /// Chain of a freshly created team: first key generation, one link
    pub fn new(team_id: TeamId, name: TeamName) -> Self {
        Self {
            team_id,
            name,
            generation: PerTeamKeyGeneration(1),
            latest_seqno: Seqno(1),
            members: BTreeMap::new(),
            active_invites: BTreeMap::new(),
        }
    }

    pub fn with_generation(mut self, generation: PerTeamKeyGeneration) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_latest_seqno(mut self, seqno: Seqno) -> Self {
        self.latest_seqno = seqno;
        self
    }

    pub fn with_member(mut self, uv: UserVersion, role: TeamRole) -> Self {
        self.members.insert(uv, role);
        self
    }

    pub fn with_invite(mut self, invite: TeamInvite) -> Self {
        self.active_invites.insert(invite.id.clone(), invite);
        self
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn name(&self) -> &TeamName {
        &self.name
    }

    pub fn generation(&self) -> PerTeamKeyGeneration {
        self.generation
    }

    pub fn latest_seqno(&self) -> Seqno {
        self.latest_seqno
    }

    pub fn members(&self) -> &BTreeMap<UserVersion, TeamRole> {
        &self.members
    }

    pub fn member_role(&self, uv: &UserVersion) -> TeamRole {
        self.members.get(uv).copied().unwrap_or_default()
    }

    pub fn active_invites(&self) -> impl Iterator<Item = &TeamInvite> {
        self.active_invites.values()
    }

    /// Look up an invite that has not been completed or cancelled
    pub fn find_active_invite_by_id(&self, id: &InviteId) -> Option<&TeamInvite> {
        self.active_invites.get(id)
    }

    /// Successor state after renaming the team
    pub fn renamed(&self, name: TeamName) -> Self {
        let mut next = self.clone();
        next.name = name;
        next.latest_seqno = self.latest_seqno.next();
        next
    }

    /// Successor state after a key rotation
    pub fn rotated(&self) -> Self {
        let mut next = self.clone();
        next.generation = self.generation.next();
        next.latest_seqno = self.latest_seqno.next();
        next
    }

    /// Successor state after applying a membership change as one link.
    ///
    /// Every completed invite must be active. Granting a role to a user
    /// replaces any other version of the same uid.
    pub fn with_membership_change(
        &self,
        req: &MembershipChangeRequest,
    ) -> Result<Self, DomainError> {
        let mut next = self.clone();

        for invite_id in req.completed_invites.keys() {
            if next.active_invites.remove(invite_id).is_none() {
                return Err(DomainError::policy_violation(format!(
                    "invite {} is not active in team {}",
                    invite_id, self.team_id
                )));
            }
        }

        for (uv, role) in req.role_changes() {
            next.members.retain(|existing, _| existing.uid != uv.uid);
            if !role.is_none() {
                next.members.insert(uv.clone(), role);
            }
        }

        next.latest_seqno = self.latest_seqno.next();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Uid;

    fn chain() -> VerifiedChain {
        VerifiedChain::new(
            TeamId::new("0123456789abcdef0123456789abcd24").unwrap(),
            TeamName::new("acme").unwrap(),
        )
    }

    fn uv(eldest: i64) -> UserVersion {
        UserVersion::new(
            Uid::new("0123456789abcdef0123456789abcd19").unwrap(),
            Seqno(eldest),
        )
    }

    #[test]
    fn test_new_chain_defaults() {
        let chain = chain();
        assert_eq!(chain.generation(), PerTeamKeyGeneration(1));
        assert_eq!(chain.latest_seqno(), Seqno(1));
        assert!(chain.members().is_empty());
    }

    #[test]
    fn test_rotated_advances_generation() {
        let next = chain().rotated();
        assert_eq!(next.generation(), PerTeamKeyGeneration(2));
        assert_eq!(next.latest_seqno(), Seqno(2));
    }

    #[test]
    fn test_membership_change_completes_invite() {
        let invite_id = InviteId::new("aa27").unwrap();
        let chain = chain().with_invite(TeamInvite::keybase(
            invite_id.clone(),
            &uv(0),
            TeamRole::Writer,
        ));
        assert!(chain.find_active_invite_by_id(&invite_id).is_some());

        let req = MembershipChangeRequest::for_role(uv(3), TeamRole::Writer)
            .unwrap()
            .with_completed_invite(invite_id.clone(), uv(3).percent_form());
        let next = chain.with_membership_change(&req).unwrap();

        assert!(next.find_active_invite_by_id(&invite_id).is_none());
        assert_eq!(next.member_role(&uv(3)), TeamRole::Writer);
        assert_eq!(next.latest_seqno(), Seqno(2));
    }

    #[test]
    fn test_membership_change_replaces_reset_version() {
        let chain = chain().with_member(uv(1), TeamRole::Reader);
        let req = MembershipChangeRequest::for_role(uv(7), TeamRole::Admin).unwrap();
        let next = chain.with_membership_change(&req).unwrap();

        assert_eq!(next.member_role(&uv(1)), TeamRole::None);
        assert_eq!(next.member_role(&uv(7)), TeamRole::Admin);
        assert_eq!(next.members().len(), 1);
    }

    #[test]
    fn test_membership_change_rejects_inactive_invite() {
        let req = MembershipChangeRequest::for_role(uv(3), TeamRole::Writer)
            .unwrap()
            .with_completed_invite(InviteId::new("bb27").unwrap(), uv(3).percent_form());
        let result = chain().with_membership_change(&req);
        assert!(matches!(result, Err(DomainError::PolicyViolation { .. })));
    }
}
