//! In-memory chain store

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{
    ChainAccessor, DomainError, InviteId, MembershipChangeRequest, Team, TeamId, TeamInvite,
    TeamName, VerifiedChain,
};

#[derive(Debug, Default)]
struct FetchStats {
    fetches: HashMap<TeamId, usize>,
    in_flight: HashMap<TeamId, usize>,
    max_in_flight: HashMap<TeamId, usize>,
    resolves: usize,
    rotations: HashMap<TeamId, usize>,
    membership_changes: HashMap<TeamId, Vec<MembershipChangeRequest>>,
}

/// Thread-safe in-memory chain backend
///
/// Chains are stored already verified. Useful for testing and development;
/// it also records per-team call statistics so tests can assert on how the
/// chain was accessed.
#[derive(Debug, Default)]
pub struct InMemoryChainStore {
    chains: RwLock<HashMap<TeamId, VerifiedChain>>,
    unverifiable: RwLock<HashSet<TeamId>>,
    restricted: RwLock<HashSet<TeamId>>,
    fetch_delay: Option<Duration>,
    stats: Mutex<FetchStats>,
}

/// Decrements the in-flight counter even when the fetch future is dropped
struct InFlightGuard<'a> {
    store: &'a InMemoryChainStore,
    team_id: TeamId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut stats) = self.store.stats.lock() {
            if let Some(count) = stats.in_flight.get_mut(&self.team_id) {
                *count = count.saturating_sub(1);
            }
        }
    }
}

impl InMemoryChainStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every chain fetch, simulating network and verification time
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub async fn create_team(&self, chain: VerifiedChain) -> Result<(), DomainError> {
        let mut chains = self.write_chains()?;

        if chains.contains_key(chain.team_id()) {
            return Err(DomainError::validation(format!(
                "Team '{}' already exists",
                chain.team_id()
            )));
        }
        if chains.values().any(|c| c.name() == chain.name()) {
            return Err(DomainError::validation(format!(
                "Team name '{}' is taken",
                chain.name()
            )));
        }

        chains.insert(chain.team_id().clone(), chain);
        Ok(())
    }

    pub async fn rename_team(&self, id: &TeamId, name: TeamName) -> Result<(), DomainError> {
        self.update_chain(id, |chain| Ok(chain.renamed(name)))
    }

    pub async fn add_invite(&self, id: &TeamId, invite: TeamInvite) -> Result<(), DomainError> {
        self.update_chain(id, |chain| Ok(chain.clone().with_invite(invite)))
    }

    /// Remove a team, as if it had been deleted server-side
    pub async fn delete_team(&self, id: &TeamId) -> Result<bool, DomainError> {
        Ok(self.write_chains()?.remove(id).is_some())
    }

    /// Make every later fetch of this team fail verification
    pub fn mark_unverifiable(&self, id: &TeamId) {
        if let Ok(mut set) = self.unverifiable.write() {
            set.insert(id.clone());
        }
    }

    /// Make every later fetch of this team fail as not readable by the caller
    pub fn mark_restricted(&self, id: &TeamId) {
        if let Ok(mut set) = self.restricted.write() {
            set.insert(id.clone());
        }
    }

    /// Current stored chain, bypassing fetch accounting
    pub fn snapshot(&self, id: &TeamId) -> Option<VerifiedChain> {
        self.chains.read().ok()?.get(id).cloned()
    }

    pub fn is_invite_active(&self, team_id: &TeamId, invite_id: &InviteId) -> bool {
        self.snapshot(team_id)
            .is_some_and(|c| c.find_active_invite_by_id(invite_id).is_some())
    }

    pub fn fetch_count(&self, id: &TeamId) -> usize {
        self.with_stats(|s| s.fetches.get(id).copied().unwrap_or(0))
    }

    pub fn max_concurrent_fetches(&self, id: &TeamId) -> usize {
        self.with_stats(|s| s.max_in_flight.get(id).copied().unwrap_or(0))
    }

    pub fn resolve_count(&self) -> usize {
        self.with_stats(|s| s.resolves)
    }

    pub fn rotation_count(&self, id: &TeamId) -> usize {
        self.with_stats(|s| s.rotations.get(id).copied().unwrap_or(0))
    }

    pub fn membership_changes(&self, id: &TeamId) -> Vec<MembershipChangeRequest> {
        self.with_stats(|s| s.membership_changes.get(id).cloned().unwrap_or_default())
    }

    fn with_stats<T>(&self, f: impl FnOnce(&mut FetchStats) -> T) -> T
    where
        T: Default,
    {
        match self.stats.lock() {
            Ok(mut stats) => f(&mut stats),
            Err(_) => T::default(),
        }
    }

    fn write_chains(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<TeamId, VerifiedChain>>, DomainError> {
        self.chains
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn update_chain(
        &self,
        id: &TeamId,
        f: impl FnOnce(&VerifiedChain) -> Result<VerifiedChain, DomainError>,
    ) -> Result<(), DomainError> {
        let mut chains = self.write_chains()?;
        let current = chains
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))?;
        let next = f(current)?;
        chains.insert(id.clone(), next);
        Ok(())
    }

    fn begin_fetch(&self, id: &TeamId) -> InFlightGuard<'_> {
        self.with_stats(|s| {
            *s.fetches.entry(id.clone()).or_default() += 1;
            let in_flight = s.in_flight.entry(id.clone()).or_default();
            *in_flight += 1;
            let current = *in_flight;
            let max = s.max_in_flight.entry(id.clone()).or_default();
            *max = (*max).max(current);
        });
        InFlightGuard {
            store: self,
            team_id: id.clone(),
        }
    }

    fn contains(set: &RwLock<HashSet<TeamId>>, id: &TeamId) -> bool {
        set.read().map(|s| s.contains(id)).unwrap_or(false)
    }
}

#[async_trait]
impl ChainAccessor for InMemoryChainStore {
    async fn get_chain(
        &self,
        team_id: &TeamId,
        cancel: &CancellationToken,
    ) -> Result<VerifiedChain, DomainError> {
        let _guard = self.begin_fetch(team_id);

        if let Some(delay) = self.fetch_delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(DomainError::Cancelled),
            }
        }

        if Self::contains(&self.restricted, team_id) {
            return Err(DomainError::not_loaded(format!(
                "Not a member of team '{}'",
                team_id
            )));
        }
        if Self::contains(&self.unverifiable, team_id) {
            return Err(DomainError::verification_failed(format!(
                "Chain of team '{}' failed verification",
                team_id
            )));
        }

        self.snapshot(team_id)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team_id)))
    }

    async fn resolve_name(
        &self,
        name: &TeamName,
        _cancel: &CancellationToken,
    ) -> Result<TeamId, DomainError> {
        self.with_stats(|s| s.resolves += 1);

        let chains = self
            .chains
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        chains
            .values()
            .find(|c| c.name() == name)
            .map(|c| c.team_id().clone())
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", name)))
    }

    async fn rotate(&self, team: &Team, cancel: &CancellationToken) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        self.update_chain(team.id(), |chain| Ok(chain.rotated()))?;
        self.with_stats(|s| *s.rotations.entry(team.id().clone()).or_default() += 1);
        debug!(team_id = %team.id(), "Appended rotation link");
        Ok(())
    }

    async fn change_membership(
        &self,
        team: &Team,
        req: &MembershipChangeRequest,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        self.update_chain(team.id(), |chain| chain.with_membership_change(req))?;
        self.with_stats(|s| {
            s.membership_changes
                .entry(team.id().clone())
                .or_default()
                .push(req.clone())
        });
        debug!(team_id = %team.id(), "Appended membership change link");
        Ok(())
    }
}
