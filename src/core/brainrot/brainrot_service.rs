// Brainrot game core - the action resolver
//
// Takes a (username, action) pair coming from the chat bot, applies the game
// rules and returns the chat reply. Like the rest of `core`, this knows
// nothing about HTTP.

use super::brainrot_models::{Action, BrainrotError, GameConfig, Player};
use super::catalog::{draw_random_item, NewCatalogItem};
use super::game_store::GameStore;
use super::inventory::{Inventory, Stashed};
use super::player_directory::{get_or_create_player, normalize_username};
use super::player_locks::{PlayerGuard, PlayerLocks};
use super::replies;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Time left before an action is available again, if any.
fn remaining_cooldown(
    last: Option<DateTime<Utc>>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let elapsed = now - last?;
    if elapsed < cooldown {
        Some(cooldown - elapsed)
    } else {
        None
    }
}

/// Usable probability for `gen_bool`. Anything that isn't a number means the
/// default coin flip.
fn steal_chance(configured: f64) -> f64 {
    if configured.is_finite() {
        configured.clamp(0.0, 1.0)
    } else {
        GameConfig::default().steal_success_chance
    }
}

/// The main service for brainrot actions.
///
/// Generic over S: GameStore so tests can run against the in-memory store.
pub struct BrainrotService<S: GameStore> {
    store: S,
    config: GameConfig,
    locks: PlayerLocks,
    // StdRng is Send, unlike thread_rng, so handlers stay spawnable.
    rng: Mutex<StdRng>,
}

impl<S: GameStore> BrainrotService<S> {
    /// Create a new service with custom rules.
    pub fn new_with_config(store: S, config: GameConfig) -> Self {
        Self {
            store,
            config,
            locks: PlayerLocks::new(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fill an empty catalog. Returns how many entries were inserted.
    pub async fn seed_catalog(&self, entries: &[NewCatalogItem]) -> Result<usize, BrainrotError> {
        self.store.seed_catalog(entries).await
    }

    /// Apply an action as of now.
    pub async fn execute(&self, username: &str, action: Action) -> Result<String, BrainrotError> {
        self.execute_at(username, action, Utc::now()).await
    }

    /// Apply an action as of `now`.
    ///
    /// `Ok` carries the chat reply for every game outcome, including rule
    /// violations. `Err` means the store failed.
    pub async fn execute_at(
        &self,
        username: &str,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<String, BrainrotError> {
        let username = normalize_username(username);
        tracing::debug!(username = %username, action = action.name(), "Resolving action");

        match action {
            Action::Help => Ok(replies::help()),
            Action::Farm => {
                let (_guard, player) = self.begin(&username, now).await?;
                self.farm(&player, now).await
            }
            Action::Steal { target } => {
                let _gate = self.locks.steal_gate().await;
                let (_guard, player) = self.begin(&username, now).await?;
                self.steal(&player, target.as_deref(), now).await
            }
            Action::Inventory => {
                let (_guard, player) = self.begin(&username, now).await?;
                self.show_inventory(&player, now).await
            }
            Action::Discard { slot } => {
                let (_guard, player) = self.begin(&username, now).await?;
                self.discard(&player, slot.as_deref()).await
            }
            Action::Replace { slot } => {
                let (_guard, player) = self.begin(&username, now).await?;
                self.replace(&player, slot.as_deref()).await
            }
        }
    }

    /// Shared prologue: lock the player, load or create them, and drop their
    /// pending item if its window has closed.
    async fn begin(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<(PlayerGuard<'_>, Player), BrainrotError> {
        let guard = self.locks.lock(username).await;
        let player = get_or_create_player(&self.store, username, now).await?;
        self.inventory()
            .sweep_expired_pending(&player.username, now)
            .await?;
        Ok((guard, player))
    }

    fn inventory(&self) -> Inventory<'_, S> {
        Inventory::new(&self.store, &self.config)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    async fn farm(&self, player: &Player, now: DateTime<Utc>) -> Result<String, BrainrotError> {
        let username = &player.username;

        if let Some(wait) = remaining_cooldown(player.last_farmed_at, self.config.farm_cooldown, now)
        {
            return Ok(replies::farm_cooldown(username, wait));
        }

        let catalog = self.store.catalog().await?;
        let item = match self.with_rng(|rng| draw_random_item(&catalog, rng).cloned()) {
            Ok(item) => item,
            Err(BrainrotError::EmptyCatalog) => return Ok(replies::nothing_to_farm()),
            Err(e) => return Err(e),
        };

        let stashed = self.inventory().stash(username, item.id, now).await?;
        self.store.set_last_farmed(username, now).await?;

        tracing::info!(
            username = %username,
            item = %item.name,
            rarity = %item.rarity,
            slot_id = stashed.slot().id,
            pending = matches!(stashed, Stashed::Pending(_)),
            "Brainrot farmed"
        );

        Ok(match stashed {
            Stashed::Kept(_) => replies::farmed(username, &item),
            Stashed::Pending(_) => replies::farmed_overflow(
                username,
                &item,
                self.config.inventory_capacity,
                self.config.replace_timeout,
            ),
        })
    }

    async fn steal(
        &self,
        thief: &Player,
        target: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, BrainrotError> {
        let username = &thief.username;

        if let Some(wait) = remaining_cooldown(thief.last_stole_at, self.config.steal_cooldown, now)
        {
            return Ok(replies::steal_cooldown(username, wait));
        }

        let victim_name = match target.map(normalize_username) {
            Some(name) if name == *username => return Ok(replies::self_steal(username)),
            Some(name) if !name.is_empty() => name,
            _ => {
                let candidates: Vec<String> = self
                    .store
                    .owners_with_items()
                    .await?
                    .into_iter()
                    .filter(|owner| owner != username)
                    .collect();
                match self.with_rng(|rng| candidates.choose(rng).cloned()) {
                    Some(name) => name,
                    None => return Ok(replies::no_victims(username)),
                }
            }
        };

        // The steal gate is held, so taking a second player lock can't deadlock.
        let _victim_guard = self.locks.lock(&victim_name).await;
        let victim = get_or_create_player(&self.store, &victim_name, now).await?;

        // From here on the attempt counts, whatever happens next.
        self.store.set_last_stole(username, now).await?;

        let inventory = self.inventory();
        let loot = inventory.view(&victim.username).await?.permanent;
        let Some(stolen) = self.with_rng(|rng| loot.choose(rng).cloned()) else {
            return Ok(replies::victim_is_broke(username, &victim.username));
        };

        let success_chance = steal_chance(self.config.steal_success_chance);
        if !self.with_rng(|rng| rng.gen_bool(success_chance)) {
            tracing::debug!(thief = %username, victim = %victim.username, "Steal failed");
            return Ok(replies::steal_failed(username, &victim.username));
        }

        let Some(stashed) = inventory.take_slot(username, stolen.id, now).await? else {
            return Ok(replies::victim_is_broke(username, &victim.username));
        };

        tracing::info!(
            thief = %username,
            victim = %victim.username,
            item = %stolen.item.name,
            "Brainrot stolen"
        );

        Ok(match stashed {
            Stashed::Kept(_) => replies::steal_succeeded(username, &victim.username, &stolen.item),
            Stashed::Pending(_) => replies::steal_succeeded_overflow(
                username,
                &victim.username,
                &stolen.item,
                self.config.replace_timeout,
            ),
        })
    }

    async fn show_inventory(
        &self,
        player: &Player,
        now: DateTime<Utc>,
    ) -> Result<String, BrainrotError> {
        let view = self.inventory().view(&player.username).await?;

        if view.permanent.is_empty() && view.pending.is_none() {
            return Ok(replies::empty_inventory(
                &player.username,
                self.config.inventory_capacity,
            ));
        }

        Ok(replies::inventory(
            &player.username,
            &view,
            self.config.inventory_capacity,
            now,
            self.config.replace_timeout,
        ))
    }

    async fn discard(&self, player: &Player, slot: Option<&str>) -> Result<String, BrainrotError> {
        let inventory = self.inventory();
        let view = inventory.view(&player.username).await?;

        let Some(target) = slot.and_then(|raw| view.slot_at(raw)).cloned() else {
            return Ok(replies::discard_hint(&player.username, &view));
        };

        inventory.remove_slot(target.id).await?;
        tracing::info!(username = %player.username, item = %target.item.name, "Brainrot discarded");

        Ok(replies::discarded(&player.username, &target.item))
    }

    async fn replace(&self, player: &Player, slot: Option<&str>) -> Result<String, BrainrotError> {
        let inventory = self.inventory();
        let view = inventory.view(&player.username).await?;

        let Some(pending) = view.pending.clone() else {
            return Ok(replies::nothing_to_replace(&player.username));
        };
        let Some(old) = slot.and_then(|raw| view.slot_at(raw)).cloned() else {
            return Ok(replies::replace_hint(&player.username, &view));
        };

        if !inventory.promote_pending(&player.username, old.id).await? {
            return Ok(replies::nothing_to_replace(&player.username));
        }

        tracing::info!(
            username = %player.username,
            dropped = %old.item.name,
            kept = %pending.item.name,
            "Pending brainrot swapped in"
        );

        Ok(replies::replaced(&player.username, &old.item, &pending.item))
    }
}

#[cfg(test)]
impl<S: GameStore> BrainrotService<S> {
    /// Create a new service with the default rules.
    pub fn new(store: S) -> Self {
        Self::new_with_config(store, GameConfig::default())
    }

    fn with_seed(store: S, config: GameConfig, seed: u64) -> Self {
        let service = Self::new_with_config(store, config);
        *service.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
        service
    }

    fn store(&self) -> &S {
        &self.store
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::brainrot::catalog::{CatalogItem, Rarity};
    use crate::core::brainrot::InventorySlot;
    use crate::infra::brainrot::InMemoryGameStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    async fn service_with(config: GameConfig) -> BrainrotService<InMemoryGameStore> {
        let service = BrainrotService::with_seed(InMemoryGameStore::new(), config, 7);
        service
            .seed_catalog(&[
                NewCatalogItem::new("Lirili Larila", Rarity::Common),
                NewCatalogItem::new("Tralalero Tralala", Rarity::Legendary),
            ])
            .await
            .unwrap();
        service
    }

    async fn fill(service: &BrainrotService<InMemoryGameStore>, owner: &str, count: usize) {
        let now = Utc::now();
        for _ in 0..count {
            service.store().add_slot(owner, 1, now).await.unwrap();
        }
    }

    fn always_succeeds() -> GameConfig {
        GameConfig {
            steal_success_chance: 1.0,
            ..GameConfig::default()
        }
    }

    fn always_fails() -> GameConfig {
        GameConfig {
            steal_success_chance: 0.0,
            ..GameConfig::default()
        }
    }

    #[tokio::test]
    async fn test_farm_cooldown_cycle() {
        let service = service_with(GameConfig::default()).await;
        let t0 = Utc::now();

        let first = service.execute_at("alice", Action::Farm, t0).await.unwrap();
        assert!(first.contains("ha farmeado un"), "{first}");
        assert!(
            first.contains("(Common)") || first.contains("(Legendary)"),
            "{first}"
        );

        let second = service
            .execute_at("Alice", Action::Farm, t0 + Duration::seconds(1))
            .await
            .unwrap();
        assert!(second.contains("Vuelve en"), "{second}");

        let player = service.store().find_player("alice").await.unwrap().unwrap();
        assert_eq!(player.last_farmed_at, Some(t0));
        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 1);

        let third = service
            .execute_at("alice", Action::Farm, t0 + Duration::minutes(61))
            .await
            .unwrap();
        assert!(third.contains("ha farmeado un"), "{third}");
        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_farm_with_empty_catalog_keeps_cooldown() {
        let service = BrainrotService::new(InMemoryGameStore::new());
        let reply = service.execute("alice", Action::Farm).await.unwrap();
        assert_eq!(reply, "No hay brainrots para farmear.");

        let player = service.store().find_player("alice").await.unwrap().unwrap();
        assert!(player.last_farmed_at.is_none());
    }

    #[tokio::test]
    async fn test_farm_when_full_overwrites_pending() {
        let config = GameConfig {
            farm_cooldown: Duration::zero(),
            ..GameConfig::default()
        };
        let service = service_with(config).await;
        fill(&service, "alice", 10).await;
        let now = Utc::now();

        let reply = service.execute_at("alice", Action::Farm, now).await.unwrap();
        assert!(reply.contains("inventario está lleno (10/10)"), "{reply}");
        let player = service.store().find_player("alice").await.unwrap().unwrap();
        assert_eq!(player.last_farmed_at, Some(now));

        service.execute_at("alice", Action::Farm, now).await.unwrap();

        let slots = service.store().slots("alice").await.unwrap();
        assert_eq!(slots.len(), 11);
        assert_eq!(slots.iter().filter(|s| s.is_pending()).count(), 1);
        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_full_inventory_then_replace() {
        let service = service_with(GameConfig::default()).await;
        fill(&service, "alice", 10).await;
        let now = Utc::now();

        let reply = service.execute_at("alice", Action::Farm, now).await.unwrap();
        assert!(reply.contains("lleno"), "{reply}");

        let listing = service
            .execute_at("alice", Action::Inventory, now)
            .await
            .unwrap();
        assert!(listing.contains("(10/10)"), "{listing}");
        assert!(listing.contains("Pendiente:"), "{listing}");

        let first_slot = service.store().slots("alice").await.unwrap()[0].id;
        let swapped = service
            .execute_at(
                "alice",
                Action::Replace {
                    slot: Some("1".to_string()),
                },
                now + Duration::minutes(2),
            )
            .await
            .unwrap();
        assert!(swapped.contains("Lirili Larila (Common)"), "{swapped}");

        let slots = service.store().slots("alice").await.unwrap();
        assert_eq!(slots.len(), 10);
        assert!(slots.iter().all(|s| !s.is_pending()));
        assert!(slots.iter().all(|s| s.id != first_slot));
    }

    #[tokio::test]
    async fn test_replace_without_pending_changes_nothing() {
        let service = service_with(GameConfig::default()).await;
        fill(&service, "alice", 3).await;

        let reply = service
            .execute(
                "alice",
                Action::Replace {
                    slot: Some("1".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(reply.contains("no tiene ningún brainrot pendiente"), "{reply}");
        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_replace_with_bad_slot_lists_inventory() {
        let service = service_with(GameConfig::default()).await;
        fill(&service, "alice", 10).await;
        service.execute("alice", Action::Farm).await.unwrap();

        for slot in [None, Some("11"), Some("cero")] {
            let reply = service
                .execute(
                    "alice",
                    Action::Replace {
                        slot: slot.map(str::to_string),
                    },
                )
                .await
                .unwrap();
            assert!(reply.contains("remplazo <número>"), "{reply}");
        }

        let slots = service.store().slots("alice").await.unwrap();
        assert_eq!(slots.len(), 11);
    }

    #[tokio::test]
    async fn test_pending_item_expires_before_next_action() {
        let service = service_with(GameConfig::default()).await;
        fill(&service, "alice", 10).await;
        let t0 = Utc::now();
        service.execute_at("alice", Action::Farm, t0).await.unwrap();

        let later = t0 + Duration::minutes(11);
        let listing = service
            .execute_at("alice", Action::Inventory, later)
            .await
            .unwrap();
        assert!(!listing.contains("Pendiente"), "{listing}");

        let reply = service
            .execute_at(
                "alice",
                Action::Replace {
                    slot: Some("1".to_string()),
                },
                later,
            )
            .await
            .unwrap();
        assert!(reply.contains("no tiene ningún brainrot pendiente"), "{reply}");
    }

    #[tokio::test]
    async fn test_inventory_listing() {
        let service = service_with(GameConfig::default()).await;

        let empty = service.execute("Bob", Action::Inventory).await.unwrap();
        assert_eq!(empty, "El inventario de bob está vacío (0/10).");

        let now = Utc::now();
        service.store().add_slot("bob", 1, now).await.unwrap();
        service.store().add_slot("bob", 2, now).await.unwrap();

        let listing = service.execute("bob", Action::Inventory).await.unwrap();
        assert_eq!(
            listing,
            "Inventario de bob (2/10): 1. Lirili Larila (Common), 2. Tralalero Tralala (Legendary)"
        );
    }

    #[tokio::test]
    async fn test_discard() {
        let service = service_with(GameConfig::default()).await;
        let now = Utc::now();
        service.store().add_slot("alice", 1, now).await.unwrap();
        service.store().add_slot("alice", 2, now).await.unwrap();

        let hint = service
            .execute(
                "alice",
                Action::Discard {
                    slot: Some("x".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(hint.contains("1. Lirili Larila"), "{hint}");
        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 2);

        let done = service
            .execute(
                "alice",
                Action::Discard {
                    slot: Some("2".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(done, "alice ha descartado su Tralalero Tralala (Legendary).");

        let slots = service.store().slots("alice").await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].item.name, "Lirili Larila");
    }

    #[tokio::test]
    async fn test_steal_from_empty_victim_consumes_cooldown_only() {
        let service = service_with(always_succeeds()).await;
        let t0 = Utc::now();

        let reply = service
            .execute_at(
                "alice",
                Action::Steal {
                    target: Some("Bob".to_string()),
                },
                t0,
            )
            .await
            .unwrap();
        assert!(reply.contains("BOB no tiene brainrots"), "{reply}");
        assert!(service.store().slots("alice").await.unwrap().is_empty());
        assert!(service.store().slots("bob").await.unwrap().is_empty());

        let again = service
            .execute_at(
                "alice",
                Action::Steal {
                    target: Some("bob".to_string()),
                },
                t0 + Duration::minutes(5),
            )
            .await
            .unwrap();
        assert!(again.contains("Podrás volver a robar"), "{again}");
    }

    #[tokio::test]
    async fn test_steal_without_victims_is_free() {
        let service = service_with(always_succeeds()).await;
        fill(&service, "alice", 2).await;

        let reply = service
            .execute("alice", Action::Steal { target: None })
            .await
            .unwrap();
        assert!(reply.contains("No hay víctimas"), "{reply}");

        let player = service.store().find_player("alice").await.unwrap().unwrap();
        assert!(player.last_stole_at.is_none());
    }

    #[tokio::test]
    async fn test_steal_from_self() {
        let service = service_with(always_succeeds()).await;
        let reply = service
            .execute(
                "alice",
                Action::Steal {
                    target: Some("@ALICE".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(reply.contains("robarse a sí mismo"), "{reply}");
        let player = service.store().find_player("alice").await.unwrap().unwrap();
        assert!(player.last_stole_at.is_none());
    }

    #[tokio::test]
    async fn test_successful_steal_moves_item() {
        let service = service_with(always_succeeds()).await;
        fill(&service, "bob", 1).await;

        let reply = service
            .execute("alice", Action::Steal { target: None })
            .await
            .unwrap();
        assert!(reply.contains("¡ROBO EXITOSO!"), "{reply}");
        assert!(reply.contains("a bob"), "{reply}");

        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 1);
        assert_eq!(service.store().count_permanent("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_steal_keeps_inventories() {
        let service = service_with(always_fails()).await;
        fill(&service, "bob", 2).await;
        let t0 = Utc::now();

        let reply = service
            .execute_at(
                "alice",
                Action::Steal {
                    target: Some("bob".to_string()),
                },
                t0,
            )
            .await
            .unwrap();
        assert!(reply.contains("¡Robo fallido!"), "{reply}");
        assert_eq!(service.store().count_permanent("bob").await.unwrap(), 2);
        assert!(service.store().slots("alice").await.unwrap().is_empty());

        let player = service.store().find_player("alice").await.unwrap().unwrap();
        assert_eq!(player.last_stole_at, Some(t0));
    }

    #[tokio::test]
    async fn test_steal_into_full_inventory_goes_pending() {
        let service = service_with(always_succeeds()).await;
        fill(&service, "alice", 10).await;
        fill(&service, "bob", 1).await;
        let now = Utc::now();
        service.store().put_pending("alice", 2, now).await.unwrap();

        let reply = service
            .execute_at(
                "alice",
                Action::Steal {
                    target: Some("bob".to_string()),
                },
                now,
            )
            .await
            .unwrap();
        assert!(reply.contains("no le cabe"), "{reply}");

        let slots = service.store().slots("alice").await.unwrap();
        let pending: Vec<_> = slots.iter().filter(|s| s.is_pending()).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].item.name, "Lirili Larila");
        assert_eq!(service.store().count_permanent("alice").await.unwrap(), 10);
        assert_eq!(service.store().count_permanent("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_help_touches_nothing() {
        let service = service_with(GameConfig::default()).await;
        let reply = service.execute("alice", Action::Help).await.unwrap();
        assert_eq!(reply, replies::HELP);
        assert!(service.store().find_player("alice").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_farms_respect_capacity() {
        let config = GameConfig {
            farm_cooldown: Duration::zero(),
            ..GameConfig::default()
        };
        let service = Arc::new(service_with(config).await);
        let now = Utc::now();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.execute_at("alice", Action::Farm, now).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let slots = service.store().slots("alice").await.unwrap();
        assert_eq!(slots.iter().filter(|s| !s.is_pending()).count(), 10);
        assert_eq!(slots.iter().filter(|s| s.is_pending()).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_actions_by_different_players() {
        let config = GameConfig {
            farm_cooldown: Duration::zero(),
            inventory_capacity: 2,
            ..GameConfig::default()
        };
        let service = Arc::new(service_with(config).await);
        let start = Utc::now();
        let players: Vec<String> = (0..8).map(|i| format!("player{}", i)).collect();

        let mut handles = Vec::new();
        for name in &players {
            for _ in 0..4 {
                let service = Arc::clone(&service);
                let name = name.clone();
                handles.push(tokio::spawn(async move {
                    service.execute_at(&name, Action::Farm, start).await?;
                    service.execute_at(&name, Action::Inventory, start).await
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for name in &players {
            let slots = service.store().slots(name).await.unwrap();
            assert_eq!(slots.iter().filter(|s| !s.is_pending()).count(), 2, "{name}");
            assert_eq!(slots.iter().filter(|s| s.is_pending()).count(), 1, "{name}");
        }
        assert_eq!(service.locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_steal_only_sweeps_the_thief() {
        let service = service_with(always_fails()).await;
        let t0 = Utc::now();
        fill(&service, "bob", 1).await;
        service.store().put_pending("bob", 2, t0).await.unwrap();

        let later = t0 + Duration::minutes(30);
        service
            .execute_at(
                "alice",
                Action::Steal {
                    target: Some("bob".to_string()),
                },
                later,
            )
            .await
            .unwrap();
        assert_eq!(service.store().slots("bob").await.unwrap().len(), 2);

        service.execute_at("bob", Action::Inventory, later).await.unwrap();
        assert_eq!(service.store().slots("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_steal_with_nan_chance_falls_back_to_coin_flip() {
        let config = GameConfig {
            steal_success_chance: f64::NAN,
            ..GameConfig::default()
        };
        let service = service_with(config).await;
        fill(&service, "bob", 1).await;

        let reply = service
            .execute(
                "alice",
                Action::Steal {
                    target: Some("bob".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(
            reply.contains("¡ROBO EXITOSO!") || reply.contains("¡Robo fallido!"),
            "{reply}"
        );
        let held = service.store().count_permanent("alice").await.unwrap()
            + service.store().count_permanent("bob").await.unwrap();
        assert_eq!(held, 1);
    }

    /// Works like the in-memory store until something is handed to a player.
    struct GiveFailsStore {
        inner: InMemoryGameStore,
    }

    fn refused<T>() -> Result<T, BrainrotError> {
        Err(BrainrotError::Store("disk I/O error".to_string()))
    }

    #[async_trait]
    impl GameStore for GiveFailsStore {
        async fn find_player(&self, username: &str) -> Result<Option<Player>, BrainrotError> {
            self.inner.find_player(username).await
        }
        async fn create_player(
            &self,
            username: &str,
            now: DateTime<Utc>,
        ) -> Result<Player, BrainrotError> {
            self.inner.create_player(username, now).await
        }
        async fn set_last_farmed(
            &self,
            username: &str,
            at: DateTime<Utc>,
        ) -> Result<(), BrainrotError> {
            self.inner.set_last_farmed(username, at).await
        }
        async fn set_last_stole(
            &self,
            username: &str,
            at: DateTime<Utc>,
        ) -> Result<(), BrainrotError> {
            self.inner.set_last_stole(username, at).await
        }
        async fn catalog(&self) -> Result<Vec<CatalogItem>, BrainrotError> {
            self.inner.catalog().await
        }
        async fn seed_catalog(&self, entries: &[NewCatalogItem]) -> Result<usize, BrainrotError> {
            self.inner.seed_catalog(entries).await
        }
        async fn slots(&self, owner: &str) -> Result<Vec<InventorySlot>, BrainrotError> {
            self.inner.slots(owner).await
        }
        async fn count_permanent(&self, owner: &str) -> Result<usize, BrainrotError> {
            self.inner.count_permanent(owner).await
        }
        async fn add_slot(
            &self,
            _: &str,
            _: i64,
            _: DateTime<Utc>,
        ) -> Result<InventorySlot, BrainrotError> {
            refused()
        }
        async fn put_pending(
            &self,
            _: &str,
            _: i64,
            _: DateTime<Utc>,
        ) -> Result<InventorySlot, BrainrotError> {
            refused()
        }
        async fn transfer_slot(
            &self,
            _: i64,
            _: &str,
            _: DateTime<Utc>,
            _: bool,
        ) -> Result<Option<InventorySlot>, BrainrotError> {
            refused()
        }
        async fn remove_slot(&self, slot_id: i64) -> Result<bool, BrainrotError> {
            self.inner.remove_slot(slot_id).await
        }
        async fn promote_pending(
            &self,
            owner: &str,
            slot_id: i64,
        ) -> Result<bool, BrainrotError> {
            self.inner.promote_pending(owner, slot_id).await
        }
        async fn purge_pending_before(
            &self,
            owner: &str,
            cutoff: DateTime<Utc>,
        ) -> Result<u64, BrainrotError> {
            self.inner.purge_pending_before(owner, cutoff).await
        }
        async fn owners_with_items(&self) -> Result<Vec<String>, BrainrotError> {
            self.inner.owners_with_items().await
        }
    }

    #[tokio::test]
    async fn test_failed_handover_leaves_victim_item_in_place() {
        let inner = InMemoryGameStore::new();
        inner
            .seed_catalog(&[NewCatalogItem::new("Tim Cheese", Rarity::Common)])
            .await
            .unwrap();
        let loot = inner.add_slot("bob", 1, Utc::now()).await.unwrap();
        let service = BrainrotService::with_seed(GiveFailsStore { inner }, always_succeeds(), 7);

        let result = service
            .execute(
                "alice",
                Action::Steal {
                    target: Some("bob".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(BrainrotError::Store(_))));

        let bobs = service.store().inner.slots("bob").await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, loot.id);
        assert!(service.store().inner.slots("alice").await.unwrap().is_empty());
    }
}
