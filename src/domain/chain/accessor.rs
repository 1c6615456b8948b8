//! Chain accessor contract

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
use mockall::automock;

use super::entity::VerifiedChain;
use crate::domain::membership::MembershipChangeRequest;
use crate::domain::team::{Team, TeamId, TeamName};
use crate::domain::DomainError;

/// Access to verified team chains and the operations that append to them.
///
/// Implementations verify signatures and link integrity before returning a
/// chain. Expected failures: `NotFound` for unknown teams, `NotLoaded` when
/// the caller may not read the team, `VerificationFailed` when the chain does
/// not verify.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainAccessor: Send + Sync + std::fmt::Debug {
    /// Fetch and verify the full chain of a team
    async fn get_chain(
        &self,
        team_id: &TeamId,
        cancel: &CancellationToken,
    ) -> Result<VerifiedChain, DomainError>;

    /// Resolve a team name to its ID
    async fn resolve_name(
        &self,
        name: &TeamName,
        cancel: &CancellationToken,
    ) -> Result<TeamId, DomainError>;

    /// Rotate the team key, appending a new key generation
    async fn rotate(&self, team: &Team, cancel: &CancellationToken) -> Result<(), DomainError>;

    /// Append a membership change link
    async fn change_membership(
        &self,
        team: &Team,
        req: &MembershipChangeRequest,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;
}
