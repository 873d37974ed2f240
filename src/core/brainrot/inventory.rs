// Inventory rules on top of the game store.
//
// A player holds up to `inventory_capacity` permanent slots plus at most one
// pending slot. The pending slot is where overflow lands while the player
// decides what to throw away.

use super::brainrot_models::{BrainrotError, GameConfig, InventorySlot};
use super::game_store::GameStore;
use chrono::{DateTime, Utc};

/// A player's slots split into permanent and pending.
#[derive(Debug, Clone, Default)]
pub struct InventoryView {
    /// Permanent slots in creation order. Display index = position + 1.
    pub permanent: Vec<InventorySlot>,
    pub pending: Option<InventorySlot>,
}

impl InventoryView {
    fn from_slots(slots: Vec<InventorySlot>) -> Self {
        let mut view = InventoryView::default();
        for slot in slots {
            if slot.is_pending() {
                view.pending = Some(slot);
            } else {
                view.permanent.push(slot);
            }
        }
        view
    }

    /// Resolve a 1-based display index typed by the player.
    pub fn slot_at(&self, raw: &str) -> Option<&InventorySlot> {
        let index: usize = raw.trim().trim_start_matches('#').parse().ok()?;
        index.checked_sub(1).and_then(|i| self.permanent.get(i))
    }
}

/// Where a newly acquired item ended up.
#[derive(Debug, Clone)]
pub enum Stashed {
    /// Added as a permanent slot.
    Kept(InventorySlot),
    /// Inventory was full, so the item is now the player's pending slot.
    Pending(InventorySlot),
}

impl Stashed {
    pub fn slot(&self) -> &InventorySlot {
        match self {
            Stashed::Kept(slot) | Stashed::Pending(slot) => slot,
        }
    }
}

/// Inventory operations for one request.
pub struct Inventory<'a, S: GameStore + ?Sized> {
    store: &'a S,
    config: &'a GameConfig,
}

impl<'a, S: GameStore + ?Sized> Inventory<'a, S> {
    pub fn new(store: &'a S, config: &'a GameConfig) -> Self {
        Self { store, config }
    }

    /// All of the owner's slots in creation order.
    pub async fn list_slots(&self, owner: &str) -> Result<Vec<InventorySlot>, BrainrotError> {
        self.store.slots(owner).await
    }

    pub async fn view(&self, owner: &str) -> Result<InventoryView, BrainrotError> {
        Ok(InventoryView::from_slots(self.list_slots(owner).await?))
    }

    pub async fn count_non_pending(&self, owner: &str) -> Result<usize, BrainrotError> {
        self.store.count_permanent(owner).await
    }

    /// Add a slot. A pending slot overwrites the owner's previous one.
    pub async fn add_slot(
        &self,
        owner: &str,
        item_id: i64,
        pending: bool,
        now: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError> {
        if pending {
            self.store.put_pending(owner, item_id, now).await
        } else {
            self.store.add_slot(owner, item_id, now).await
        }
    }

    /// Give an item to `owner`, falling back to the pending slot when full.
    pub async fn stash(
        &self,
        owner: &str,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Stashed, BrainrotError> {
        let held = self.count_non_pending(owner).await?;
        if held < self.config.inventory_capacity {
            let slot = self.add_slot(owner, item_id, false, now).await?;
            Ok(Stashed::Kept(slot))
        } else {
            let slot = self.add_slot(owner, item_id, true, now).await?;
            Ok(Stashed::Pending(slot))
        }
    }

    /// Move another player's slot to `owner`, falling back to the pending
    /// slot when full. `None` if the slot is gone.
    pub async fn take_slot(
        &self,
        owner: &str,
        slot_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stashed>, BrainrotError> {
        let full = self.count_non_pending(owner).await? >= self.config.inventory_capacity;
        let moved = self.store.transfer_slot(slot_id, owner, now, full).await?;
        Ok(moved.map(|slot| {
            if full {
                Stashed::Pending(slot)
            } else {
                Stashed::Kept(slot)
            }
        }))
    }

    pub async fn remove_slot(&self, slot_id: i64) -> Result<bool, BrainrotError> {
        self.store.remove_slot(slot_id).await
    }

    /// Swap the pending slot in for `replaced_slot_id`.
    pub async fn promote_pending(
        &self,
        owner: &str,
        replaced_slot_id: i64,
    ) -> Result<bool, BrainrotError> {
        self.store.promote_pending(owner, replaced_slot_id).await
    }

    /// Drop the owner's pending slot once its replacement window has closed.
    pub async fn sweep_expired_pending(
        &self,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, BrainrotError> {
        // A window reaching past the start of time can't have closed yet
        let Some(cutoff) = now.checked_sub_signed(self.config.replace_timeout) else {
            return Ok(0);
        };
        let purged = self.store.purge_pending_before(owner, cutoff).await?;
        if purged > 0 {
            tracing::debug!(username = %owner, "Expired pending brainrot discarded");
        }
        Ok(purged)
    }
}
