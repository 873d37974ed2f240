// Storage port for the brainrot game.
//
// The core defines what it needs from persistence; `infra` provides the
// SQLite and in-memory implementations.

use super::brainrot_models::{BrainrotError, InventorySlot, Player};
use super::catalog::{CatalogItem, NewCatalogItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for persisting players, the catalog and inventories.
///
/// Lookups that find nothing return `None`/`false`; `Err` is reserved for
/// backend failures.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Fetch a player by normalized username.
    async fn find_player(&self, username: &str) -> Result<Option<Player>, BrainrotError>;

    /// Create a player with no cooldown history.
    /// If the player already exists the stored record is returned untouched.
    async fn create_player(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<Player, BrainrotError>;

    async fn set_last_farmed(&self, username: &str, at: DateTime<Utc>)
        -> Result<(), BrainrotError>;

    async fn set_last_stole(&self, username: &str, at: DateTime<Utc>)
        -> Result<(), BrainrotError>;

    /// Every catalog entry, ordered by id.
    async fn catalog(&self) -> Result<Vec<CatalogItem>, BrainrotError>;

    /// Insert `entries` if the catalog is empty. Returns how many were added.
    async fn seed_catalog(&self, entries: &[NewCatalogItem]) -> Result<usize, BrainrotError>;

    /// All slots owned by `owner`, pending one included, in creation order.
    async fn slots(&self, owner: &str) -> Result<Vec<InventorySlot>, BrainrotError>;

    /// Number of permanent (non-pending) slots owned by `owner`.
    async fn count_permanent(&self, owner: &str) -> Result<usize, BrainrotError>;

    /// Add a permanent slot.
    async fn add_slot(
        &self,
        owner: &str,
        item_id: i64,
        at: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError>;

    /// Make `item_id` the owner's pending slot, replacing any previous one.
    async fn put_pending(
        &self,
        owner: &str,
        item_id: i64,
        since: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError>;

    /// Hand an existing slot to `new_owner` in one step.
    ///
    /// With `pending` set the slot becomes the new owner's pending slot and
    /// their previous pending slot is deleted. Returns `None` without touching
    /// anything if the slot doesn't exist.
    async fn transfer_slot(
        &self,
        slot_id: i64,
        new_owner: &str,
        at: DateTime<Utc>,
        pending: bool,
    ) -> Result<Option<InventorySlot>, BrainrotError>;

    /// Delete a slot. Returns false if it didn't exist.
    async fn remove_slot(&self, slot_id: i64) -> Result<bool, BrainrotError>;

    /// Delete the permanent slot `replaced_slot_id` and turn the owner's
    /// pending slot into a permanent one, as a single step.
    ///
    /// Returns false without touching anything if either slot is missing.
    async fn promote_pending(
        &self,
        owner: &str,
        replaced_slot_id: i64,
    ) -> Result<bool, BrainrotError>;

    /// Delete the owner's pending slot if it was created at or before `cutoff`.
    async fn purge_pending_before(
        &self,
        owner: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, BrainrotError>;

    /// Usernames owning at least one permanent slot.
    async fn owners_with_items(&self) -> Result<Vec<String>, BrainrotError>;
}
