// This is the infra layer - it implements the GameStore trait from core.
// This file provides an IN-MEMORY implementation.
//
// **Why keep an in-memory store?**
// - The test suite runs the full game rules without a database file
// - `STORE_BACKEND=memory` gives a throwaway deployment for trying the bot
//
// **What it doesn't do:**
// Nothing survives a restart. Use the SQLite store for a real channel.
//
// The per-player locks in core serialize one player's actions, but two
// different players still hit these maps at the same time. Every method must
// stay correct under that, so nothing here reads a map twice and assumes it
// didn't change in between.

use crate::core::brainrot::{
    BrainrotError, CatalogItem, GameStore, InventorySlot, NewCatalogItem, Player,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};

/// Data we store for each slot. The catalog entry is resolved on read.
#[derive(Clone, Debug)]
struct StoredSlot {
    owner: String,
    item_id: i64,
    pending_since: Option<DateTime<Utc>>,
}

/// In-memory implementation of GameStore.
///
/// DashMap lets concurrent requests read and write without a global Mutex.
/// Ids are handed out from atomic counters, so ascending id = creation order.
pub struct InMemoryGameStore {
    players: DashMap<String, Player>,
    catalog: DashMap<i64, CatalogItem>,
    slots: DashMap<i64, StoredSlot>,
    next_item_id: AtomicI64,
    next_slot_id: AtomicI64,
}

impl InMemoryGameStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
            catalog: DashMap::new(),
            slots: DashMap::new(),
            next_item_id: AtomicI64::new(1),
            next_slot_id: AtomicI64::new(1),
        }
    }

    fn resolve(&self, id: i64, slot: &StoredSlot) -> Option<InventorySlot> {
        let item = self.catalog.get(&slot.item_id)?.clone();
        Some(InventorySlot {
            id,
            owner: slot.owner.clone(),
            item,
            pending_since: slot.pending_since,
        })
    }

    fn insert_slot(
        &self,
        owner: &str,
        item_id: i64,
        pending_since: Option<DateTime<Utc>>,
    ) -> Result<InventorySlot, BrainrotError> {
        let stored = StoredSlot {
            owner: owner.to_string(),
            item_id,
            pending_since,
        };
        let id = self.next_slot_id.fetch_add(1, Ordering::SeqCst);
        let slot = self
            .resolve(id, &stored)
            .ok_or_else(|| BrainrotError::Store(format!("Unknown catalog item {}", item_id)))?;
        self.slots.insert(id, stored);
        Ok(slot)
    }

    fn pending_slot_id(&self, owner: &str) -> Option<i64> {
        self.slots
            .iter()
            .find(|entry| entry.owner == owner && entry.pending_since.is_some())
            .map(|entry| *entry.key())
    }

    /// Delete the owner's pending slot, except `keep`.
    fn drop_pending(&self, owner: &str, keep: Option<i64>) {
        self.slots.retain(|id, slot| {
            Some(*id) == keep || !(slot.owner == owner && slot.pending_since.is_some())
        });
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn find_player(&self, username: &str) -> Result<Option<Player>, BrainrotError> {
        Ok(self.players.get(username).map(|entry| entry.clone()))
    }

    async fn create_player(
        &self,
        username: &str,
        _now: DateTime<Utc>,
    ) -> Result<Player, BrainrotError> {
        // entry() makes get-or-insert atomic, so racing creators see one record
        let player = self
            .players
            .entry(username.to_string())
            .or_insert_with(|| Player::new(username))
            .clone();
        Ok(player)
    }

    async fn set_last_farmed(
        &self,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<(), BrainrotError> {
        self.players
            .entry(username.to_string())
            .or_insert_with(|| Player::new(username))
            .last_farmed_at = Some(at);
        Ok(())
    }

    async fn set_last_stole(&self, username: &str, at: DateTime<Utc>) -> Result<(), BrainrotError> {
        self.players
            .entry(username.to_string())
            .or_insert_with(|| Player::new(username))
            .last_stole_at = Some(at);
        Ok(())
    }

    async fn catalog(&self) -> Result<Vec<CatalogItem>, BrainrotError> {
        let mut items: Vec<CatalogItem> = self
            .catalog
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn seed_catalog(&self, entries: &[NewCatalogItem]) -> Result<usize, BrainrotError> {
        if !self.catalog.is_empty() {
            return Ok(0);
        }
        for entry in entries {
            let id = self.next_item_id.fetch_add(1, Ordering::SeqCst);
            self.catalog.insert(
                id,
                CatalogItem {
                    id,
                    name: entry.name.clone(),
                    rarity: entry.rarity.clone(),
                },
            );
        }
        Ok(entries.len())
    }

    async fn slots(&self, owner: &str) -> Result<Vec<InventorySlot>, BrainrotError> {
        let mut slots: Vec<InventorySlot> = self
            .slots
            .iter()
            .filter(|entry| entry.owner == owner)
            .filter_map(|entry| self.resolve(*entry.key(), entry.value()))
            .collect();
        slots.sort_by_key(|slot| slot.id);
        Ok(slots)
    }

    async fn count_permanent(&self, owner: &str) -> Result<usize, BrainrotError> {
        Ok(self
            .slots
            .iter()
            .filter(|entry| entry.owner == owner && entry.pending_since.is_none())
            .count())
    }

    async fn add_slot(
        &self,
        owner: &str,
        item_id: i64,
        _at: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError> {
        self.insert_slot(owner, item_id, None)
    }

    async fn put_pending(
        &self,
        owner: &str,
        item_id: i64,
        since: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError> {
        if !self.catalog.contains_key(&item_id) {
            return Err(BrainrotError::Store(format!(
                "Unknown catalog item {}",
                item_id
            )));
        }
        self.drop_pending(owner, None);
        self.insert_slot(owner, item_id, Some(since))
    }

    async fn transfer_slot(
        &self,
        slot_id: i64,
        new_owner: &str,
        at: DateTime<Utc>,
        pending: bool,
    ) -> Result<Option<InventorySlot>, BrainrotError> {
        if !self.slots.contains_key(&slot_id) {
            return Ok(None);
        }
        if pending {
            self.drop_pending(new_owner, Some(slot_id));
        }

        let stored = {
            let Some(mut slot) = self.slots.get_mut(&slot_id) else {
                return Ok(None);
            };
            slot.owner = new_owner.to_string();
            slot.pending_since = pending.then_some(at);
            slot.clone()
        };
        Ok(self.resolve(slot_id, &stored))
    }

    async fn remove_slot(&self, slot_id: i64) -> Result<bool, BrainrotError> {
        Ok(self.slots.remove(&slot_id).is_some())
    }

    async fn promote_pending(
        &self,
        owner: &str,
        replaced_slot_id: i64,
    ) -> Result<bool, BrainrotError> {
        let Some(pending_id) = self.pending_slot_id(owner) else {
            return Ok(false);
        };
        let replaceable = self
            .slots
            .get(&replaced_slot_id)
            .map(|slot| slot.owner == owner && slot.pending_since.is_none())
            .unwrap_or(false);
        if !replaceable {
            return Ok(false);
        }

        self.slots.remove(&replaced_slot_id);
        if let Some(mut pending) = self.slots.get_mut(&pending_id) {
            pending.pending_since = None;
        }
        Ok(true)
    }

    async fn purge_pending_before(
        &self,
        owner: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, BrainrotError> {
        // Count inside retain: other players' slots come and go meanwhile
        let mut purged = 0;
        self.slots.retain(|_, slot| {
            let expired =
                slot.owner == owner && slot.pending_since.is_some_and(|since| since <= cutoff);
            if expired {
                purged += 1;
            }
            !expired
        });
        Ok(purged)
    }

    async fn owners_with_items(&self) -> Result<Vec<String>, BrainrotError> {
        // BTreeSet keeps the order stable so seeded tests stay deterministic
        let owners: BTreeSet<String> = self
            .slots
            .iter()
            .filter(|entry| entry.pending_since.is_none())
            .map(|entry| entry.owner.clone())
            .collect();
        Ok(owners.into_iter().collect())
    }
}

// Default trait implementation for convenient initialization
impl Default for InMemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}
