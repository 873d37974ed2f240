// Player lookup.
//
// Players are created lazily the first time any action mentions them.

use super::brainrot_models::{BrainrotError, Player};
use super::game_store::GameStore;
use chrono::{DateTime, Utc};

/// Canonical form of a chat username.
pub fn normalize_username(name: &str) -> String {
    name.trim().trim_start_matches('@').to_lowercase()
}

/// Look up a player, creating an empty record on first reference.
pub async fn get_or_create_player<S: GameStore + ?Sized>(
    store: &S,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Player, BrainrotError> {
    let username = normalize_username(name);

    if let Some(player) = store.find_player(&username).await? {
        return Ok(player);
    }

    tracing::debug!(username = %username, "Creating new player");
    store.create_player(&username, now).await
}
