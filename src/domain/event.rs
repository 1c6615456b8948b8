//! Inbound team events

use serde::{Deserialize, Serialize};

use crate::domain::invite::TeamSbsMsg;
use crate::domain::team::{PerTeamKeyGeneration, TeamChangeRow, TeamChangeSet, TeamId};

/// An event delivered by the server push channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamEvent {
    /// Someone asked for the team key to move past `generation`
    RotateRequest {
        team_id: TeamId,
        generation: PerTeamKeyGeneration,
    },
    Changed {
        rows: Vec<TeamChangeRow>,
        #[serde(default)]
        changes: TeamChangeSet,
    },
    Deleted {
        rows: Vec<TeamChangeRow>,
    },
    Sbs(TeamSbsMsg),
}

impl TeamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RotateRequest { .. } => "rotate_request",
            Self::Changed { .. } => "changed",
            Self::Deleted { .. } => "deleted",
            Self::Sbs(_) => "sbs",
        }
    }
}
