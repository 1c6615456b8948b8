//! Team event dispatcher - Routes inbound events to their handler

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::change_service::ChangeNotificationService;
use super::invite_service::InviteService;
use super::rotation_service::{RotationOutcome, RotationService};
use crate::domain::{BatchError, BatchReport, DomainError, InviteId, TeamEvent, TeamId};

/// What handling one event did
#[derive(Debug)]
pub enum DispatchOutcome {
    Rotation(RotationOutcome),
    Changed(BatchReport<TeamId>),
    Deleted(BatchReport<TeamId>),
    Sbs(BatchReport<InviteId>),
}

/// Failure of one dispatched event
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rotation(#[from] DomainError),

    #[error(transparent)]
    Changed(#[from] BatchError<TeamId>),

    #[error(transparent)]
    Sbs(#[from] BatchError<InviteId>),
}

impl DispatchError {
    /// The error that stopped the event
    pub fn first_error(&self) -> &DomainError {
        match self {
            Self::Rotation(e) => e,
            Self::Changed(e) => e.first_error(),
            Self::Sbs(e) => e.first_error(),
        }
    }
}

/// Single entry point for events delivered by the push channel
#[derive(Debug)]
pub struct TeamEventDispatcher {
    rotation: RotationService,
    changes: ChangeNotificationService,
    invites: InviteService,
}

impl TeamEventDispatcher {
    pub fn new(
        rotation: RotationService,
        changes: ChangeNotificationService,
        invites: InviteService,
    ) -> Self {
        Self {
            rotation,
            changes,
            invites,
        }
    }

    #[instrument(name = "team.dispatch", skip_all, fields(kind = event.kind()))]
    pub async fn dispatch(
        &self,
        event: TeamEvent,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        debug!("Dispatching team event");

        let outcome = match event {
            TeamEvent::RotateRequest {
                team_id,
                generation,
            } => DispatchOutcome::Rotation(
                self.rotation
                    .handle_rotate_request(&team_id, generation, cancel)
                    .await?,
            ),
            TeamEvent::Changed { rows, changes } => DispatchOutcome::Changed(
                self.changes
                    .handle_change_notification(&rows, changes, cancel)
                    .await?,
            ),
            TeamEvent::Deleted { rows } => DispatchOutcome::Deleted(
                self.changes.handle_delete_notification(&rows, cancel).await,
            ),
            TeamEvent::Sbs(msg) => {
                DispatchOutcome::Sbs(self.invites.handle_sbs_request(&msg, cancel).await?)
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::notify::MockNotifyRouter;
    use crate::domain::{
        PerTeamKeyGeneration, Seqno, TeamChangeRow, TeamChangeSet, TeamName, TeamSbsMsg,
        VerifiedChain,
    };
    use crate::infrastructure::chain::InMemoryChainStore;
    use crate::infrastructure::identity::InMemoryIdentityResolver;
    use crate::infrastructure::team::CachingTeamLoader;

    fn team_id() -> TeamId {
        TeamId::new("0123456789abcdef0123456789abcd24").unwrap()
    }

    async fn dispatcher(notify: MockNotifyRouter) -> (Arc<InMemoryChainStore>, TeamEventDispatcher) {
        let store = Arc::new(InMemoryChainStore::new());
        store
            .create_team(VerifiedChain::new(team_id(), TeamName::new("acme").unwrap()))
            .await
            .unwrap();

        let loader = Arc::new(CachingTeamLoader::new(store.clone()));
        let notify = Arc::new(notify);
        let dispatcher = TeamEventDispatcher::new(
            RotationService::new(loader.clone(), store.clone()),
            ChangeNotificationService::new(loader.clone(), notify),
            InviteService::new(loader, store.clone(), Arc::new(InMemoryIdentityResolver::new())),
        );
        (store, dispatcher)
    }

    #[tokio::test]
    async fn test_rotate_request_routed() {
        let (store, dispatcher) = dispatcher(MockNotifyRouter::new()).await;

        let outcome = dispatcher
            .dispatch(
                TeamEvent::RotateRequest {
                    team_id: team_id(),
                    generation: PerTeamKeyGeneration(1),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Rotation(RotationOutcome::Rotated { .. })));
        assert_eq!(store.rotation_count(&team_id()), 1);
    }

    #[tokio::test]
    async fn test_changed_and_deleted_routed() {
        let mut notify = MockNotifyRouter::new();
        notify.expect_on_team_changed().times(1).returning(|_| ());
        notify.expect_on_team_deleted().times(1).returning(|_| ());
        let (_, dispatcher) = dispatcher(notify).await;
        let cancel = CancellationToken::new();
        let rows = vec![TeamChangeRow::new(team_id(), TeamName::new("acme").unwrap(), Seqno(2))];

        let changed = dispatcher
            .dispatch(
                TeamEvent::Changed {
                    rows: rows.clone(),
                    changes: TeamChangeSet::default(),
                },
                &cancel,
            )
            .await
            .unwrap();
        assert!(matches!(changed, DispatchOutcome::Changed(r) if r.succeeded == vec![team_id()]));

        let deleted = dispatcher
            .dispatch(TeamEvent::Deleted { rows }, &cancel)
            .await
            .unwrap();
        assert!(matches!(deleted, DispatchOutcome::Deleted(r) if r.is_complete()));
    }

    #[tokio::test]
    async fn test_sbs_failure_surfaces_first_error() {
        let (_, dispatcher) = dispatcher(MockNotifyRouter::new()).await;
        let invitee = crate::domain::TeamInvitee::new(
            InviteId::new("aabbccdd27").unwrap(),
            crate::domain::Uid::new("0123456789abcdef0123456789abcd19").unwrap(),
            Seqno(1),
            crate::domain::TeamRole::Writer,
        );

        let err = dispatcher
            .dispatch(
                TeamEvent::Sbs(TeamSbsMsg::new(team_id(), vec![invitee])),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Sbs(_)));
        assert!(err.first_error().is_not_found());
    }
}
