//! Team roles

use serde::{Deserialize, Serialize};

/// Role of a user within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// No role, used to remove a member
    #[default]
    None,
    Reader,
    Writer,
    Admin,
    Owner,
}

impl TeamRole {
    /// Check if this role can manage team members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Check if this role can write team data
    pub fn is_writer_or_above(&self) -> bool {
        matches!(self, Self::Writer | Self::Admin | Self::Owner)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Reader => write!(f, "reader"),
            Self::Writer => write!(f, "writer"),
            Self::Admin => write!(f, "admin"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering_and_privileges() {
        assert!(TeamRole::Owner > TeamRole::Admin);
        assert!(TeamRole::Reader > TeamRole::None);
        assert!(TeamRole::Admin.can_manage_members());
        assert!(!TeamRole::Writer.can_manage_members());
        assert!(TeamRole::Writer.is_writer_or_above());
        assert!(!TeamRole::Reader.is_writer_or_above());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&TeamRole::Writer).unwrap(), "\"writer\"");
        let parsed: TeamRole = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(parsed, TeamRole::Owner);
    }
}
