// Per-player serialization of read-modify-write sequences.
//
// Every action holds the acting player's lock from its first read to its last
// write. Steals touch a second player, so they also go through one shared gate
// that is always taken before any player lock.
//
// Usernames come straight from chat, so a lock entry only lives while someone
// holds or waits for it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct PlayerLocks {
    players: DashMap<String, Arc<Mutex<()>>>,
    steal_gate: Arc<Mutex<()>>,
}

/// Exclusive access to one player. Dropping it releases the lock and forgets
/// the entry if nobody else is queued on it.
pub struct PlayerGuard<'a> {
    locks: &'a PlayerLocks,
    username: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PlayerGuard<'_> {
    fn drop(&mut self) {
        // Release first: the guard itself holds a reference to the mutex.
        self.guard.take();
        // The map's own Arc is the last one, so no holder and no waiter.
        self.locks
            .players
            .remove_if(&self.username, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one player's state.
    pub async fn lock(&self, username: &str) -> PlayerGuard<'_> {
        // Clone the Arc out so the DashMap shard isn't held across the await.
        let mutex = self
            .players
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        PlayerGuard {
            locks: self,
            username: username.to_string(),
            guard: Some(guard),
        }
    }

    /// Only one steal runs at a time.
    pub async fn steal_gate(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.steal_gate).lock_owned().await
    }

    #[cfg(test)]
    pub(super) fn tracked(&self) -> usize {
        self.players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_player_is_exclusive() {
        let locks = PlayerLocks::new();
        let guard = locks.lock("alice").await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock("alice")).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(50), locks.lock("alice")).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_players_do_not_block() {
        let locks = PlayerLocks::new();
        let _alice = locks.lock("alice").await;

        let bob = tokio::time::timeout(Duration::from_millis(50), locks.lock("bob")).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = PlayerLocks::new();
        for i in 0..100 {
            let _guard = locks.lock(&format!("visitor{}", i)).await;
        }
        assert_eq!(locks.tracked(), 0);

        let alice = locks.lock("alice").await;
        let bob = locks.lock("bob").await;
        assert_eq!(locks.tracked(), 2);
        drop(alice);
        assert_eq!(locks.tracked(), 1);
        drop(bob);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_entry_survives_while_someone_waits() {
        let locks = Arc::new(PlayerLocks::new());
        let first = locks.lock("alice").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("alice").await;
            })
        };
        // Give the waiter time to queue on the same mutex
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(first);
        assert_eq!(locks.tracked(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }
}
