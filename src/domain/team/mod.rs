//! Team domain - identifiers, snapshots, change rows and the loader contract

mod change;
mod entity;
mod loader;
mod validation;

pub use change::{TeamChangeRow, TeamChangeSet};
pub use entity::{PerTeamKeyGeneration, Seqno, Team, TeamId, TeamName};
#[cfg(test)]
pub use loader::MockTeamLoader;
pub use loader::{LoadTeamArg, TeamLoader, TeamTarget};
pub use validation::{
    validate_team_id, validate_team_name, validate_team_name_part, TeamValidationError,
    ROOT_TEAM_ID_SUFFIX, SUB_TEAM_ID_SUFFIX, TEAM_ID_BYTE_LEN,
};
