//! Invite service - Verifies server-delivered invite acceptances before
//! completing them on the team chain

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::IdentifyConfig;
use crate::domain::{
    BatchError, BatchMode, BatchReport, ChainAccessor, DomainError, IdentifyBehavior,
    IdentifyRequest, IdentityResolver, InviteCategory, InviteId, LoadTeamArg,
    MembershipChangeRequest, SbsAssertion, TeamId, TeamInvite, TeamInvitee, TeamLoader,
    TeamSbsMsg, Uid, UserVersion,
};

/// Turns untrusted acceptance claims into membership changes, checking each
/// claim against the invite recorded on the team's own chain first
#[derive(Debug)]
pub struct InviteService {
    loader: Arc<dyn TeamLoader>,
    chain: Arc<dyn ChainAccessor>,
    identity: Arc<dyn IdentityResolver>,
    identify: IdentifyConfig,
    mode: BatchMode,
}

impl InviteService {
    pub fn new(
        loader: Arc<dyn TeamLoader>,
        chain: Arc<dyn ChainAccessor>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            loader,
            chain,
            identity,
            identify: IdentifyConfig::default(),
            mode: BatchMode::default(),
        }
    }

    pub fn with_identify_config(mut self, identify: IdentifyConfig) -> Self {
        self.identify = identify;
        self
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Process every invitee of the message in order
    #[instrument(
        name = "team.sbs",
        skip(self, msg, cancel),
        fields(log_tag = "CLKR", team_id = %msg.team_id, invitees = msg.invitees.len())
    )]
    pub async fn handle_sbs_request(
        &self,
        msg: &TeamSbsMsg,
        cancel: &CancellationToken,
    ) -> Result<BatchReport<InviteId>, BatchError<InviteId>> {
        let mut report = BatchReport::new();
        let mut remaining = msg.invitees.iter();

        while let Some(invitee) = remaining.next() {
            let result = self.handle_sbs_single(&msg.team_id, invitee, cancel).await;
            let cancelled = matches!(result, Err(DomainError::Cancelled));
            if let Err(e) = &result {
                warn!(invite_id = %invitee.invite_id, uid = %invitee.uid, error = %e, "Rejected invite acceptance");
            }

            if report
                .record(invitee.invite_id.clone(), result, self.mode)
                .is_break()
                || cancelled
            {
                report.skip_remaining(remaining.by_ref().map(|i| i.invite_id.clone()));
                break;
            }
        }

        report.into_result()
    }

    /// Verify one claim and, when it holds, complete the invite
    pub async fn handle_sbs_single(
        &self,
        team_id: &TeamId,
        invitee: &TeamInvitee,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let uv = invitee.user_version();
        let req = MembershipChangeRequest::for_role(uv.clone(), invitee.role)?
            .with_completed_invite(invitee.invite_id.clone(), uv.percent_form());

        let team = self
            .loader
            .load(LoadTeamArg::by_id(team_id.clone()).with_force_repoll(), cancel)
            .await?;

        let invite = team
            .chain()
            .find_active_invite_by_id(&invitee.invite_id)
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "Invite '{}' is not active in team '{}'",
                    invitee.invite_id, team_id
                ))
            })?;

        let category = invite
            .category()
            .map_err(|e| DomainError::unsupported(format!("Invite '{}': {}", invite.id, e)))?;
        debug!(invite_id = %invite.id, category = %category, uv = %uv, "Verifying invite acceptance");

        match category {
            InviteCategory::Sbs { service } => {
                self.verify_sbs(invite, &service, &invitee.uid, cancel)
                    .await?
            }
            // Email delivery is the trust anchor and the server enforces it
            InviteCategory::Email => {}
            InviteCategory::Keybase => assert_can_accept_keybase_invite(invite, &uv)?,
        }

        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        self.chain.change_membership(&team, &req, cancel).await?;
        info!(invite_id = %invitee.invite_id, uv = %uv, role = %invitee.role, "Completed invite");
        Ok(())
    }

    async fn verify_sbs(
        &self,
        invite: &TeamInvite,
        service: &str,
        uid: &Uid,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let assertion = SbsAssertion::new(invite.name.clone(), service, uid.clone());
        let req = IdentifyRequest::new(assertion.to_string(), self.identify.reason.clone())
            .with_can_suppress_ui(self.identify.can_suppress_ui)
            .with_behavior(IdentifyBehavior::ChatGui);

        debug!(assertion = %assertion, "Identifying SBS assertion");
        self.identity.resolve_and_verify(&req, cancel).await
    }
}

/// Check a claimed user version against the one a keybase invite was issued
/// to. The uid must match. The eldest seqno must match too, unless the
/// invite was issued to a reset account (eldest seqno zero).
pub fn assert_can_accept_keybase_invite(
    invite: &TeamInvite,
    claimed: &UserVersion,
) -> Result<(), DomainError> {
    let recorded = invite
        .keybase_user_version()
        .map_err(|e| DomainError::validation(format!("Invite '{}': {}", invite.id, e)))?;

    if recorded.uid != claimed.uid {
        return Err(DomainError::policy_violation(format!(
            "Invite '{}' was issued to {}, not {}",
            invite.id, recorded.uid, claimed.uid
        )));
    }

    if recorded.eldest_seqno == claimed.eldest_seqno {
        return Ok(());
    }

    if recorded.is_reset() {
        debug!(invite_id = %invite.id, claimed = %claimed, "Accepting keybase invite issued to a reset account");
        return Ok(());
    }

    Err(DomainError::policy_violation(format!(
        "Invite '{}' was issued to {}, claimed by {}",
        invite.id, recorded, claimed
    )))
}
