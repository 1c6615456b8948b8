//! Broadcast notify router

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::domain::{NotifyRouter, TeamChangedEvent, TeamId, TeamNotification};

const DEFAULT_CAPACITY: usize = 256;

/// Fans team notifications out to every local subscriber.
///
/// Subscribers that fall more than `capacity` messages behind observe a
/// `Lagged` error on their receiver and skip ahead.
#[derive(Debug, Clone)]
pub struct BroadcastNotifyRouter {
    sender: broadcast::Sender<TeamNotification>,
}

impl Default for BroadcastNotifyRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastNotifyRouter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TeamNotification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn publish(&self, notification: TeamNotification) {
        let team_id = notification.team_id().clone();
        match self.sender.send(notification) {
            Ok(receivers) => debug!(team_id = %team_id, receivers, "Published team notification"),
            Err(_) => trace!(team_id = %team_id, "No subscribers for team notification"),
        }
    }
}

#[async_trait]
impl NotifyRouter for BroadcastNotifyRouter {
    async fn on_team_changed(&self, event: TeamChangedEvent) {
        self.publish(TeamNotification::Changed(event));
    }

    async fn on_team_deleted(&self, team_id: &TeamId) {
        self.publish(TeamNotification::Deleted {
            team_id: team_id.clone(),
        });
    }
}
