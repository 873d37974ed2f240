// Service configuration, loaded from environment variables (and `.env`).

use crate::core::brainrot::GameConfig;
use chrono::Duration;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Longest cooldown or replacement window accepted from the environment.
const MAX_WINDOW_SECS: u32 = 365 * 24 * 60 * 60;

/// Which GameStore implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// SQLite database file, created on first start.
    pub database_path: String,
    pub store_backend: StoreBackend,
    /// JSON catalog used to seed an empty catalog. Built-in list when unset.
    pub catalog_path: Option<PathBuf>,
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `PORT` (default 3000)
    /// - `DATABASE_PATH` (default `data/brainrot.db`)
    /// - `STORE_BACKEND` - `sqlite` or `memory` (default `sqlite`)
    /// - `CATALOG_PATH` - optional JSON catalog
    /// - `FARM_COOLDOWN_SECS`, `STEAL_COOLDOWN_SECS` (default 3600)
    /// - `REPLACE_TIMEOUT_SECS` (default 600)
    /// - `INVENTORY_CAPACITY` (default 10)
    /// - `STEAL_SUCCESS_CHANCE` (default 0.5, clamped to 0..=1)
    ///
    /// Timings are whole seconds between 0 and one year.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, so tests don't touch the real
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GameConfig::default();

        let store_backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("") => StoreBackend::Sqlite,
            Some(value) if value.eq_ignore_ascii_case("sqlite") => StoreBackend::Sqlite,
            Some(value) if value.eq_ignore_ascii_case("memory") => StoreBackend::Memory,
            Some(other) => {
                tracing::warn!(value = other, "Unknown STORE_BACKEND, using sqlite");
                StoreBackend::Sqlite
            }
        };

        let seconds = |key: &str, default: Duration| parse_window(&lookup, key, default);

        let chance = parse_or(&lookup, "STEAL_SUCCESS_CHANCE", defaults.steal_success_chance);
        let steal_success_chance = if chance.is_finite() {
            chance.clamp(0.0, 1.0)
        } else {
            tracing::warn!(
                value = %chance,
                default = %defaults.steal_success_chance,
                "STEAL_SUCCESS_CHANCE is not a number, using default"
            );
            defaults.steal_success_chance
        };

        let game = GameConfig {
            farm_cooldown: seconds("FARM_COOLDOWN_SECS", defaults.farm_cooldown),
            steal_cooldown: seconds("STEAL_COOLDOWN_SECS", defaults.steal_cooldown),
            replace_timeout: seconds("REPLACE_TIMEOUT_SECS", defaults.replace_timeout),
            inventory_capacity: parse_or(&lookup, "INVENTORY_CAPACITY", defaults.inventory_capacity),
            steal_success_chance,
        };

        Config {
            port: parse_or(&lookup, "PORT", 3000),
            database_path: lookup("DATABASE_PATH")
                .filter(|path| !path.trim().is_empty())
                .unwrap_or_else(|| "data/brainrot.db".to_string()),
            store_backend,
            catalog_path: lookup("CATALOG_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            game,
        }
    }
}

/// Parse `key`, falling back to `default` when it is missing or malformed.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }
    }
}

/// Parse a whole number of seconds in `0..=MAX_WINDOW_SECS`, falling back to
/// `default` otherwise.
fn parse_window(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    let Some(raw) = lookup(key) else {
        return default;
    };
    let window = raw
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|secs| *secs <= MAX_WINDOW_SECS)
        .and_then(|secs| Duration::try_seconds(i64::from(secs)));

    window.unwrap_or_else(|| {
        tracing::warn!(
            key,
            value = %raw,
            default_secs = default.num_seconds(),
            "Invalid duration, using default"
        );
        default
    })
}
