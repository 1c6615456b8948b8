//! Team change notification rows

use serde::{Deserialize, Serialize};

use super::entity::{Seqno, TeamId, TeamName};

/// One team entry of a change or deletion notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChangeRow {
    pub id: TeamId,
    pub name: TeamName,
    pub latest_seqno: Seqno,
    #[serde(default)]
    pub key_rotated: bool,
    #[serde(default)]
    pub membership_changed: bool,
}

impl TeamChangeRow {
    pub fn new(id: TeamId, name: TeamName, latest_seqno: Seqno) -> Self {
        Self {
            id,
            name,
            latest_seqno,
            key_rotated: false,
            membership_changed: false,
        }
    }

    pub fn with_key_rotated(mut self, key_rotated: bool) -> Self {
        self.key_rotated = key_rotated;
        self
    }

    pub fn with_membership_changed(mut self, membership_changed: bool) -> Self {
        self.membership_changed = membership_changed;
        self
    }
}

/// Categories of change described by a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamChangeSet {
    #[serde(default)]
    pub renamed: bool,
    #[serde(default)]
    pub key_rotated: bool,
    #[serde(default)]
    pub membership_changed: bool,
}

impl TeamChangeSet {
    pub fn renamed() -> Self {
        Self {
            renamed: true,
            ..Self::default()
        }
    }

    /// Change set for a single row: the batch-wide `renamed` flag plus the
    /// row's own key rotation and membership flags.
    pub fn for_row(&self, row: &TeamChangeRow) -> Self {
        Self {
            renamed: self.renamed,
            key_rotated: row.key_rotated,
            membership_changed: row.membership_changed,
        }
    }
}
