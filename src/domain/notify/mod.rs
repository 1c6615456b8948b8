//! Local team notifications

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::domain::team::{Seqno, TeamChangeSet, TeamId, TeamName};

/// A team changed and its local state has been refreshed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChangedEvent {
    pub team_id: TeamId,
    pub team_name: TeamName,
    pub latest_seqno: Seqno,
    pub changes: TeamChangeSet,
}

/// Notification delivered to local subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamNotification {
    Changed(TeamChangedEvent),
    Deleted { team_id: TeamId },
}

impl TeamNotification {
    pub fn team_id(&self) -> &TeamId {
        match self {
            Self::Changed(event) => &event.team_id,
            Self::Deleted { team_id } => team_id,
        }
    }
}

/// Fans team events out to local observers. Delivery is fire-and-forget.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotifyRouter: Send + Sync + std::fmt::Debug {
    async fn on_team_changed(&self, event: TeamChangedEvent);

    async fn on_team_deleted(&self, team_id: &TeamId);
}
