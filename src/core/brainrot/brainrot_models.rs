// Brainrot domain models
//
// Platform-agnostic types shared by the resolver, the stores and the HTTP
// layer. Nothing in here knows about axum or SQLite.

use super::catalog::CatalogItem;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A player record, keyed by the lower-cased username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub username: String,
    /// Last successful farm. Drives the farm cooldown.
    pub last_farmed_at: Option<DateTime<Utc>>,
    /// Last steal attempt that reached a victim. Drives the steal cooldown.
    pub last_stole_at: Option<DateTime<Utc>>,
}

impl Player {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            last_farmed_at: None,
            last_stole_at: None,
        }
    }
}

/// One owned brainrot.
///
/// A slot with `pending_since` set is the temporary overflow item won while the
/// inventory was full. It doesn't count against capacity and expires unless
/// the owner swaps it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySlot {
    pub id: i64,
    pub owner: String,
    pub item: CatalogItem,
    pub pending_since: Option<DateTime<Utc>>,
}

impl InventorySlot {
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// When the pending window closes, or `None` for permanent slots.
    /// Also `None` if the deadline falls outside the representable range.
    pub fn expires_at(&self, timeout: Duration) -> Option<DateTime<Utc>> {
        self.pending_since.and_then(|since| since.checked_add_signed(timeout))
    }
}

/// What a chat command asks the game to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Farm,
    Steal { target: Option<String> },
    Inventory,
    Discard { slot: Option<String> },
    Replace { slot: Option<String> },
    Help,
}

impl Action {
    /// Map a chat action name plus its optional argument to an action.
    /// Unknown names fall back to `Help`.
    pub fn parse(name: &str, argument: Option<&str>) -> Self {
        let argument = argument
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(str::to_string);

        match name.trim().to_lowercase().as_str() {
            "farmear" | "farm" => Action::Farm,
            "robar" | "steal" => Action::Steal { target: argument },
            "inventario" | "inventory" | "inv" => Action::Inventory,
            "descartar" | "discard" => Action::Discard { slot: argument },
            "remplazo" | "reemplazo" | "replace" => Action::Replace { slot: argument },
            _ => Action::Help,
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Farm => "farm",
            Action::Steal { .. } => "steal",
            Action::Inventory => "inventory",
            Action::Discard { .. } => "discard",
            Action::Replace { .. } => "replace",
            Action::Help => "help",
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failures that are not game outcomes.
///
/// Rule violations (cooldowns, bad slot numbers, nothing to replace) are
/// answered with a chat message instead.
#[derive(Debug, Error)]
pub enum BrainrotError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("The catalog has no items")]
    EmptyCatalog,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tunable game rules.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Minimum time between two farms by the same player.
    pub farm_cooldown: Duration,

    /// Minimum time between two steals by the same player.
    pub steal_cooldown: Duration,

    /// How long a pending item waits for a replacement decision.
    pub replace_timeout: Duration,

    /// Maximum number of permanent slots per player.
    pub inventory_capacity: usize,

    /// Chance (0.0 to 1.0) that a steal succeeds.
    pub steal_success_chance: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            farm_cooldown: Duration::hours(1),
            steal_cooldown: Duration::hours(1),
            replace_timeout: Duration::minutes(10),
            inventory_capacity: 10,
            steal_success_chance: 0.5,
        }
    }
}
