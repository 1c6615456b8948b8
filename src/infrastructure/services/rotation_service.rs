//! Rotation service - Handles requests to rotate a team key

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::domain::{
    ChainAccessor, DomainError, LoadTeamArg, PerTeamKeyGeneration, TeamId, TeamLoader,
};

/// Result of a rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// A new key generation was appended on top of `from`
    Rotated { from: PerTeamKeyGeneration },
    /// The team had already moved past the requested generation
    Stale { current: PerTeamKeyGeneration },
}

impl RotationOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Decides whether a rotation request still applies and rotates when it does
#[derive(Debug)]
pub struct RotationService {
    loader: Arc<dyn TeamLoader>,
    chain: Arc<dyn ChainAccessor>,
}

impl RotationService {
    pub fn new(loader: Arc<dyn TeamLoader>, chain: Arc<dyn ChainAccessor>) -> Self {
        Self { loader, chain }
    }

    /// Rotate the team key unless the team is already past `generation`.
    ///
    /// The team is always force-reloaded first, so a delayed or redelivered
    /// request for an old generation is answered with `Stale` and no rotation.
    #[instrument(
        name = "team.rotate",
        skip(self, cancel),
        fields(log_tag = "CLKR", team_id = %team_id, generation = %generation)
    )]
    pub async fn handle_rotate_request(
        &self,
        team_id: &TeamId,
        generation: PerTeamKeyGeneration,
        cancel: &CancellationToken,
    ) -> Result<RotationOutcome, DomainError> {
        let team = self
            .loader
            .load(LoadTeamArg::by_id(team_id.clone()).with_force_repoll(), cancel)
            .await?;

        let current = team.generation();
        if current > generation {
            debug!(current = %current, "Team is past the requested generation, not rotating");
            return Ok(RotationOutcome::Stale { current });
        }

        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        self.chain.rotate(&team, cancel).await?;
        info!(from = %current, "Rotated team key");

        Ok(RotationOutcome::Rotated { from: current })
    }
}
