//! Change notification service - Reconciles teams named in change and
//! deletion notifications

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    BatchError, BatchMode, BatchReport, DomainError, LoadTeamArg, NotifyRouter, TeamChangeRow,
    TeamChangeSet, TeamChangedEvent, TeamId, TeamLoader,
};

/// Applies change notification rows in order, refreshing the loader and
/// telling the notify router about every team it reconciled
#[derive(Debug)]
pub struct ChangeNotificationService {
    loader: Arc<dyn TeamLoader>,
    notify: Arc<dyn NotifyRouter>,
    mode: BatchMode,
}

impl ChangeNotificationService {
    pub fn new(loader: Arc<dyn TeamLoader>, notify: Arc<dyn NotifyRouter>) -> Self {
        Self {
            loader,
            notify,
            mode: BatchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reconcile every row of a change batch, in order.
    ///
    /// Under `BatchMode::FailFast` the first failing row stops the batch and
    /// the rows after it come back as skipped. Cancellation always stops the
    /// batch.
    #[instrument(
        name = "team.change",
        skip(self, rows, cancel),
        fields(log_tag = "CLKR", rows = rows.len(), mode = ?self.mode)
    )]
    pub async fn handle_change_notification(
        &self,
        rows: &[TeamChangeRow],
        changes: TeamChangeSet,
        cancel: &CancellationToken,
    ) -> Result<BatchReport<TeamId>, BatchError<TeamId>> {
        let mut report = BatchReport::new();
        let mut remaining = rows.iter();

        while let Some(row) = remaining.next() {
            let result = self.handle_change_single(row, changes, cancel).await;
            let cancelled = matches!(result, Err(DomainError::Cancelled));
            if let Err(e) = &result {
                warn!(team_id = %row.id, error = %e, "Failed to apply team change");
            }

            if report.record(row.id.clone(), result, self.mode).is_break() || cancelled {
                report.skip_remaining(remaining.by_ref().map(|r| r.id.clone()));
                break;
            }
        }

        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "Stopped change batch early");
        }
        report.into_result()
    }

    async fn handle_change_single(
        &self,
        row: &TeamChangeRow,
        changes: TeamChangeSet,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let changes = changes.for_row(row);
        debug!(
            team_id = %row.id,
            team_name = %row.name,
            latest_seqno = %row.latest_seqno,
            ?changes,
            "Applying team change"
        );

        if changes.renamed {
            self.loader
                .notify_team_rename(&row.id, &row.name, cancel)
                .await?;
        } else {
            self.loader
                .load(LoadTeamArg::by_id(row.id.clone()).with_force_repoll(), cancel)
                .await?;
        }

        self.notify
            .on_team_changed(TeamChangedEvent {
                team_id: row.id.clone(),
                team_name: row.name.clone(),
                latest_seqno: row.latest_seqno,
                changes,
            })
            .await;
        Ok(())
    }

    /// Tell the notify router about every deleted team. Nothing is reloaded
    /// and no row can fail; only cancellation leaves rows skipped.
    #[instrument(
        name = "team.delete",
        skip(self, rows, cancel),
        fields(log_tag = "CLKR", rows = rows.len())
    )]
    pub async fn handle_delete_notification(
        &self,
        rows: &[TeamChangeRow],
        cancel: &CancellationToken,
    ) -> BatchReport<TeamId> {
        let mut report = BatchReport::new();
        let mut remaining = rows.iter();

        while let Some(row) = remaining.next() {
            if cancel.is_cancelled() {
                report.skip_remaining(std::iter::once(row).chain(remaining.by_ref()).map(|r| r.id.clone()));
                break;
            }
            info!(team_id = %row.id, team_name = %row.name, "Team deleted");
            self.notify.on_team_deleted(&row.id).await;
            report.succeeded.push(row.id.clone());
        }

        report
    }
}
