//! Caching team loader with single-flight rebuilds

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use moka::future::Cache;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::LoaderConfig;
use crate::domain::{
    ChainAccessor, DomainError, LoadTeamArg, PerTeamKeyGeneration, Team, TeamId, TeamLoader,
    TeamName, TeamTarget,
};

/// Serializes rebuilds of one team. `epoch` counts completed rebuilds so a
/// caller that waited behind another rebuild can reuse its result.
#[derive(Debug, Default)]
struct LoadSlot {
    lock: tokio::sync::Mutex<()>,
    epoch: AtomicU64,
}

#[derive(Debug)]
struct SlotEntry {
    slot: Arc<LoadSlot>,
    users: usize,
}

type SlotMap = Mutex<HashMap<TeamId, SlotEntry>>;

/// Holds a team's slot for one load and releases it on drop, including when
/// the load future is dropped mid-rebuild.
struct SlotGuard<'a> {
    slots: &'a SlotMap,
    id: &'a TeamId,
    slot: Arc<LoadSlot>,
}

impl Deref for SlotGuard<'_> {
    type Target = LoadSlot;

    fn deref(&self) -> &LoadSlot {
        &self.slot
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.slots.lock() {
            let released = match slots.get_mut(self.id) {
                Some(entry) => {
                    entry.users = entry.users.saturating_sub(1);
                    entry.users == 0
                }
                None => false,
            };
            if released {
                slots.remove(self.id);
            }
        }
    }
}

/// Team loader that owns the cached `Team` projection per team.
///
/// At most one chain fetch per team is in flight. Every load of a team goes
/// through that team's slot: a caller that arrives while a rebuild is
/// running waits for it and reads the cache afterwards, so nobody observes
/// the pre-rebuild snapshot once a rebuild has started. Unrelated teams
/// rebuild in parallel. The cache is only written after a rebuild fully
/// succeeds, so a cancelled or failed load leaves the previous snapshot in
/// place.
#[derive(Debug)]
pub struct CachingTeamLoader {
    chain: Arc<dyn ChainAccessor>,
    teams: Cache<TeamId, Team>,
    names: Cache<TeamName, TeamId>,
    slots: SlotMap,
    /// Highest generation observed per team. Bounded by capacity only, so it
    /// outlives snapshot TTL expiry.
    high_water: Cache<TeamId, PerTeamKeyGeneration>,
}

impl CachingTeamLoader {
    pub fn new(chain: Arc<dyn ChainAccessor>) -> Self {
        Self::with_config(chain, &LoaderConfig::default())
    }

    pub fn with_config(chain: Arc<dyn ChainAccessor>, config: &LoaderConfig) -> Self {
        let teams = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl())
            .build();
        let names = Cache::builder()
            .max_capacity(config.name_cache_capacity)
            .build();
        let high_water = Cache::builder()
            .max_capacity(config.high_water_capacity)
            .build();

        Self {
            chain,
            teams,
            names,
            slots: Mutex::new(HashMap::new()),
            high_water,
        }
    }

    /// Cached snapshot without touching the chain
    pub async fn cached(&self, id: &TeamId) -> Option<Team> {
        self.teams.get(id).await
    }

    /// Cached name mapping without touching the chain
    pub async fn cached_id_for_name(&self, name: &TeamName) -> Option<TeamId> {
        self.names.get(name).await
    }

    /// Drop the cached snapshot of a team
    pub async fn invalidate(&self, id: &TeamId) {
        if let Some(team) = self.teams.get(id).await {
            self.names.invalidate(team.name()).await;
        }
        self.teams.invalidate(id).await;
    }

    fn acquire_slot<'a>(&'a self, id: &'a TeamId) -> Result<SlotGuard<'a>, DomainError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| DomainError::internal("team loader slot map poisoned"))?;
        let entry = slots.entry(id.clone()).or_insert_with(|| SlotEntry {
            slot: Arc::default(),
            users: 0,
        });
        entry.users += 1;

        Ok(SlotGuard {
            slots: &self.slots,
            id,
            slot: entry.slot.clone(),
        })
    }

    async fn load_by_id(
        &self,
        id: &TeamId,
        force_repoll: bool,
        cancel: &CancellationToken,
    ) -> Result<Team, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let slot = self.acquire_slot(id)?;

        // Cache hits skip the queue only while no rebuild holds the slot
        if !force_repoll {
            if let Ok(_idle) = slot.lock.try_lock() {
                if let Some(team) = self.teams.get(id).await {
                    debug!(team_id = %id, generation = %team.generation(), "Team cache hit");
                    return Ok(team);
                }
            }
        }

        let observed_epoch = slot.epoch.load(Ordering::Acquire);
        self.rebuild(&slot, id, observed_epoch, force_repoll, cancel)
            .await
    }

    async fn rebuild(
        &self,
        slot: &LoadSlot,
        id: &TeamId,
        observed_epoch: u64,
        force_repoll: bool,
        cancel: &CancellationToken,
    ) -> Result<Team, DomainError> {
        let _guard = tokio::select! {
            guard = slot.lock.lock() => guard,
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        };

        // A rebuild completed while we were waiting; its snapshot is at least
        // as fresh as anything we were asked for.
        if slot.epoch.load(Ordering::Acquire) != observed_epoch || !force_repoll {
            if let Some(team) = self.teams.get(id).await {
                debug!(team_id = %id, "Sharing snapshot from concurrent rebuild");
                return Ok(team);
            }
        }

        debug!(team_id = %id, force_repoll, "Rebuilding team from chain");
        let chain = tokio::select! {
            chain = self.chain.get_chain(id, cancel) => chain?,
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        };

        if chain.team_id() != id {
            return Err(DomainError::verification_failed(format!(
                "chain for team {} reports team id {}",
                id,
                chain.team_id()
            )));
        }

        self.check_generation(id, chain.generation()).await?;

        let team = Team::from_chain(chain);
        let previous = self.teams.get(id).await;
        if let Some(previous) = previous.as_ref().filter(|p| p.name() != team.name()) {
            self.names.invalidate(previous.name()).await;
        }

        self.teams.insert(id.clone(), team.clone()).await;
        self.names.insert(team.name().clone(), id.clone()).await;
        slot.epoch.fetch_add(1, Ordering::AcqRel);

        info!(
            team_id = %id,
            name = %team.name(),
            generation = %team.generation(),
            seqno = %team.latest_seqno(),
            "Team loaded"
        );
        Ok(team)
    }

    /// Caller holds the team's slot lock, so the read and the write below
    /// cannot interleave with another rebuild of the same team.
    async fn check_generation(
        &self,
        id: &TeamId,
        generation: PerTeamKeyGeneration,
    ) -> Result<(), DomainError> {
        match self.high_water.get(id).await {
            Some(seen) if generation < seen => Err(DomainError::verification_failed(format!(
                "team {} generation went backwards: {} < {}",
                id, generation, seen
            ))),
            _ => {
                self.high_water.insert(id.clone(), generation).await;
                Ok(())
            }
        }
    }

    async fn resolve_name(
        &self,
        name: &TeamName,
        cancel: &CancellationToken,
    ) -> Result<TeamId, DomainError> {
        tokio::select! {
            id = self.chain.resolve_name(name, cancel) => id,
            _ = cancel.cancelled() => Err(DomainError::Cancelled),
        }
    }

    async fn load_by_name(
        &self,
        name: &TeamName,
        force_repoll: bool,
        cancel: &CancellationToken,
    ) -> Result<Team, DomainError> {
        let id = match self.names.get(name).await {
            Some(id) => id,
            None => self.resolve_name(name, cancel).await?,
        };

        let team = self.load_by_id(&id, force_repoll, cancel).await?;
        if team.name() == name {
            return Ok(team);
        }

        // The mapping outlived a rename; ask the server again.
        debug!(name = %name, stale_id = %id, current = %team.name(), "Stale team name mapping");
        self.names.invalidate(name).await;

        let id = self.resolve_name(name, cancel).await?;
        let team = self.load_by_id(&id, true, cancel).await?;
        if team.name() != name {
            return Err(DomainError::not_found(format!(
                "Team '{}' resolves to team {} now named '{}'",
                name,
                id,
                team.name()
            )));
        }
        Ok(team)
    }
}

#[async_trait]
impl TeamLoader for CachingTeamLoader {
    #[instrument(
        name = "team.load",
        skip(self, arg, cancel),
        fields(target = %arg.target, force_repoll = arg.force_repoll)
    )]
    async fn load(
        &self,
        arg: LoadTeamArg,
        cancel: &CancellationToken,
    ) -> Result<Team, DomainError> {
        match &arg.target {
            TeamTarget::Id(id) => self.load_by_id(id, arg.force_repoll, cancel).await,
            TeamTarget::Name(name) => self.load_by_name(name, arg.force_repoll, cancel).await,
        }
    }

    #[instrument(name = "team.rename", skip(self, cancel), fields(team_id = %id, new_name = %new_name))]
    async fn notify_team_rename(
        &self,
        id: &TeamId,
        new_name: &TeamName,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        self.names.invalidate(new_name).await;

        let team = self.load_by_id(id, true, cancel).await?;
        if team.name() != new_name {
            warn!(
                announced = %new_name,
                loaded = %team.name(),
                "Renamed team loaded with a different name, keeping the chain's"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::MockChainAccessor;
    use crate::domain::VerifiedChain;
    use crate::infrastructure::chain::InMemoryChainStore;
    use std::time::Duration;

    const TEAM_A: &str = "0123456789abcdef0123456789abcd24";
    const TEAM_B: &str = "fedcba9876543210fedcba9876543224";

    fn team_id(raw: &str) -> TeamId {
        TeamId::new(raw).unwrap()
    }

    fn name(raw: &str) -> TeamName {
        TeamName::new(raw).unwrap()
    }

    async fn store_with_team() -> Arc<InMemoryChainStore> {
        let store = Arc::new(InMemoryChainStore::new());
        store
            .create_team(VerifiedChain::new(team_id(TEAM_A), name("acme")))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_load_caches_until_forced() {
        let store = store_with_team().await;
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();

        let arg = LoadTeamArg::by_id(team_id(TEAM_A));
        loader.load(arg.clone(), &cancel).await.unwrap();
        loader.load(arg.clone(), &cancel).await.unwrap();
        assert_eq!(store.fetch_count(&team_id(TEAM_A)), 1);

        loader.load(arg.with_force_repoll(), &cancel).await.unwrap();
        assert_eq!(store.fetch_count(&team_id(TEAM_A)), 2);
    }

    #[tokio::test]
    async fn test_forced_reload_sees_new_generation() {
        let store = store_with_team().await;
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();
        let arg = LoadTeamArg::by_id(team_id(TEAM_A));

        let before = loader.load(arg.clone(), &cancel).await.unwrap();
        assert_eq!(before.generation(), PerTeamKeyGeneration(1));

        store.rotate(&before, &cancel).await.unwrap();

        let cached = loader.load(arg.clone(), &cancel).await.unwrap();
        assert_eq!(cached.generation(), PerTeamKeyGeneration(1));

        let fresh = loader.load(arg.with_force_repoll(), &cancel).await.unwrap();
        assert_eq!(fresh.generation(), PerTeamKeyGeneration(2));
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let store = Arc::new(InMemoryChainStore::new());
        let loader = CachingTeamLoader::new(store);

        let result = loader
            .load(LoadTeamArg::by_id(team_id(TEAM_B)), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_verification_failure_propagates() {
        let mut chain = MockChainAccessor::new();
        chain
            .expect_get_chain()
            .times(1)
            .returning(|_, _| Err(DomainError::verification_failed("bad signature")));
        let loader = CachingTeamLoader::new(Arc::new(chain));

        let result = loader
            .load(LoadTeamArg::by_id(team_id(TEAM_A)), &CancellationToken::new())
            .await;
        assert!(result.unwrap_err().is_verification_failed());
        assert!(loader.cached(&team_id(TEAM_A)).await.is_none());
    }

    #[tokio::test]
    async fn test_generation_going_backwards_is_rejected() {
        let mut chain = MockChainAccessor::new();
        let mut generation = 3;
        chain.expect_get_chain().times(2).returning(move |id, _| {
            let chain = VerifiedChain::new(id.clone(), TeamName::new("acme").unwrap())
                .with_generation(PerTeamKeyGeneration(generation));
            generation -= 1;
            Ok(chain)
        });
        let loader = CachingTeamLoader::new(Arc::new(chain));
        let cancel = CancellationToken::new();
        let arg = LoadTeamArg::by_id(team_id(TEAM_A)).with_force_repoll();

        let first = loader.load(arg.clone(), &cancel).await.unwrap();
        assert_eq!(first.generation(), PerTeamKeyGeneration(3));

        let second = loader.load(arg, &cancel).await;
        assert!(second.unwrap_err().is_verification_failed());

        let cached = loader.cached(&team_id(TEAM_A)).await.unwrap();
        assert_eq!(cached.generation(), PerTeamKeyGeneration(3));
    }

    #[tokio::test]
    async fn test_mismatched_team_id_is_rejected() {
        let mut chain = MockChainAccessor::new();
        chain.expect_get_chain().returning(|_, _| {
            Ok(VerifiedChain::new(
                TeamId::new(TEAM_B).unwrap(),
                TeamName::new("other").unwrap(),
            ))
        });
        let loader = CachingTeamLoader::new(Arc::new(chain));

        let result = loader
            .load(LoadTeamArg::by_id(team_id(TEAM_A)), &CancellationToken::new())
            .await;
        assert!(result.unwrap_err().is_verification_failed());
    }

    #[tokio::test]
    async fn test_concurrent_forced_loads_share_one_fetch() {
        let store = Arc::new(InMemoryChainStore::new().with_fetch_delay(Duration::from_millis(50)));
        store
            .create_team(VerifiedChain::new(team_id(TEAM_A), name("acme")))
            .await
            .unwrap();
        let loader = Arc::new(CachingTeamLoader::new(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move {
                    loader
                        .load(
                            LoadTeamArg::by_id(team_id(TEAM_A)).with_force_repoll(),
                            &CancellationToken::new(),
                        )
                        .await
                })
            })
            .collect();

        let mut generations = Vec::new();
        for handle in handles {
            generations.push(handle.await.unwrap().unwrap().generation());
        }

        assert!(generations.iter().all(|g| *g == PerTeamKeyGeneration(1)));
        assert_eq!(store.max_concurrent_fetches(&team_id(TEAM_A)), 1);
        assert!(store.fetch_count(&team_id(TEAM_A)) < 8);
    }

    #[tokio::test]
    async fn test_plain_load_waits_for_inflight_forced_rebuild() {
        let store = Arc::new(InMemoryChainStore::new().with_fetch_delay(Duration::from_millis(100)));
        store
            .create_team(VerifiedChain::new(team_id(TEAM_A), name("acme")))
            .await
            .unwrap();
        let loader = Arc::new(CachingTeamLoader::new(store.clone()));
        let cancel = CancellationToken::new();

        let first = loader
            .load(LoadTeamArg::by_id(team_id(TEAM_A)), &cancel)
            .await
            .unwrap();
        store.rotate(&first, &cancel).await.unwrap();

        let forced = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .load(
                        LoadTeamArg::by_id(team_id(TEAM_A)).with_force_repoll(),
                        &CancellationToken::new(),
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let plain = loader
            .load(LoadTeamArg::by_id(team_id(TEAM_A)), &cancel)
            .await
            .unwrap();
        let forced = forced.await.unwrap().unwrap();

        assert_eq!(forced.generation(), PerTeamKeyGeneration(2));
        assert_eq!(plain.generation(), PerTeamKeyGeneration(2));
        assert_eq!(store.fetch_count(&team_id(TEAM_A)), 2);
    }

    #[tokio::test]
    async fn test_dropped_load_releases_slot() {
        let store = Arc::new(InMemoryChainStore::new().with_fetch_delay(Duration::from_millis(200)));
        store
            .create_team(VerifiedChain::new(team_id(TEAM_A), name("acme")))
            .await
            .unwrap();
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            loader.load(LoadTeamArg::by_id(team_id(TEAM_A)), &cancel),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(loader.slots.lock().unwrap().is_empty());

        loader
            .load(LoadTeamArg::by_id(team_id(TEAM_A)), &cancel)
            .await
            .unwrap();
        assert!(loader.slots.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_high_water_is_bounded() {
        let store = Arc::new(InMemoryChainStore::new());
        let ids: Vec<TeamId> = (0..6).map(|i| team_id(&format!("{:030x}24", i + 1))).collect();
        for (i, id) in ids.iter().enumerate() {
            store
                .create_team(VerifiedChain::new(id.clone(), name(&format!("team{}", i))))
                .await
                .unwrap();
        }
        let config = LoaderConfig {
            high_water_capacity: 2,
            ..LoaderConfig::default()
        };
        let loader = CachingTeamLoader::with_config(store, &config);
        let cancel = CancellationToken::new();

        for id in &ids {
            loader
                .load(LoadTeamArg::by_id(id.clone()), &cancel)
                .await
                .unwrap();
        }

        loader.high_water.run_pending_tasks().await;
        assert!(loader.high_water.entry_count() <= 2);
    }

    #[tokio::test]
    async fn test_unrelated_teams_rebuild_in_parallel() {
        let store = Arc::new(InMemoryChainStore::new().with_fetch_delay(Duration::from_millis(100)));
        store
            .create_team(VerifiedChain::new(team_id(TEAM_A), name("acme")))
            .await
            .unwrap();
        store
            .create_team(VerifiedChain::new(team_id(TEAM_B), name("globex")))
            .await
            .unwrap();
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();

        let started = std::time::Instant::now();
        let (a, b) = tokio::join!(
            loader.load(LoadTeamArg::by_id(team_id(TEAM_A)), &cancel),
            loader.load(LoadTeamArg::by_id(team_id(TEAM_B)), &cancel),
        );
        a.unwrap();
        b.unwrap();
        assert!(started.elapsed() < Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_cancelled_load_keeps_previous_snapshot() {
        let store = Arc::new(InMemoryChainStore::new().with_fetch_delay(Duration::from_millis(200)));
        store
            .create_team(VerifiedChain::new(team_id(TEAM_A), name("acme")))
            .await
            .unwrap();
        let loader = CachingTeamLoader::new(store.clone());

        let first = loader
            .load(LoadTeamArg::by_id(team_id(TEAM_A)), &CancellationToken::new())
            .await
            .unwrap();
        store.rotate(&first, &CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = loader
            .load(
                LoadTeamArg::by_id(team_id(TEAM_A)).with_force_repoll(),
                &cancel,
            )
            .await;
        assert!(result.unwrap_err().is_cancelled());

        let cached = loader.cached(&team_id(TEAM_A)).await.unwrap();
        assert_eq!(cached.generation(), PerTeamKeyGeneration(1));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_fails_fast() {
        let store = store_with_team().await;
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = loader.load(LoadTeamArg::by_id(team_id(TEAM_A)), &cancel).await;
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(store.fetch_count(&team_id(TEAM_A)), 0);
    }

    #[tokio::test]
    async fn test_load_by_name_uses_index() {
        let store = store_with_team().await;
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();

        let team = loader
            .load(LoadTeamArg::by_name(name("acme")), &cancel)
            .await
            .unwrap();
        assert_eq!(team.id(), &team_id(TEAM_A));
        assert_eq!(
            loader.cached_id_for_name(&name("acme")).await,
            Some(team_id(TEAM_A))
        );
        assert_eq!(store.resolve_count(), 1);

        loader
            .load(LoadTeamArg::by_name(name("acme")), &cancel)
            .await
            .unwrap();
        assert_eq!(store.resolve_count(), 1);
    }

    #[tokio::test]
    async fn test_notify_team_rename_refreshes_name_mapping() {
        let store = store_with_team().await;
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();

        loader
            .load(LoadTeamArg::by_name(name("acme")), &cancel)
            .await
            .unwrap();

        store.rename_team(&team_id(TEAM_A), name("acmecorp")).await.unwrap();
        loader
            .notify_team_rename(&team_id(TEAM_A), &name("acmecorp"), &cancel)
            .await
            .unwrap();

        let cached = loader.cached(&team_id(TEAM_A)).await.unwrap();
        assert_eq!(cached.name(), &name("acmecorp"));
        assert_eq!(loader.cached_id_for_name(&name("acme")).await, None);
        assert_eq!(
            loader.cached_id_for_name(&name("acmecorp")).await,
            Some(team_id(TEAM_A))
        );
    }

    #[tokio::test]
    async fn test_load_by_stale_name_after_rename_is_not_found() {
        let store = store_with_team().await;
        let loader = CachingTeamLoader::new(store.clone());
        let cancel = CancellationToken::new();

        loader
            .load(LoadTeamArg::by_name(name("acme")), &cancel)
            .await
            .unwrap();
        store.rename_team(&team_id(TEAM_A), name("acmecorp")).await.unwrap();

        let result = loader
            .load(LoadTeamArg::by_name(name("acme")).with_force_repoll(), &cancel)
            .await;
        assert!(result.unwrap_err().is_not_found());
    }
}
