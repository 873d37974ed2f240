// SQLite implementation of GameStore

use crate::core::brainrot::{
    BrainrotError, CatalogItem, GameStore, InventorySlot, NewCatalogItem, Player, Rarity,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

const SLOT_COLUMNS: &str = r#"
    s.id, s.owner, s.pending_since,
    c.id AS item_id, c.name AS item_name, c.rarity AS item_rarity
    FROM inventory_slots s
    JOIN catalog c ON c.id = s.item_id
"#;

fn store_err(e: sqlx::Error) -> BrainrotError {
    BrainrotError::Store(e.to_string())
}

/// Fixed-width UTC timestamps, so text comparison in SQL matches time order.
fn stamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, BrainrotError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| BrainrotError::Store(format!("Bad timestamp {:?}: {}", raw, e)))
}

fn parse_optional_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>, BrainrotError> {
    raw.as_deref().map(parse_time).transpose()
}

fn player_from_row(row: &SqliteRow) -> Result<Player, BrainrotError> {
    Ok(Player {
        username: row.get("username"),
        last_farmed_at: parse_optional_time(row.get("last_farmed_at"))?,
        last_stole_at: parse_optional_time(row.get("last_stole_at"))?,
    })
}

fn slot_from_row(row: &SqliteRow) -> Result<InventorySlot, BrainrotError> {
    Ok(InventorySlot {
        id: row.get("id"),
        owner: row.get("owner"),
        item: CatalogItem {
            id: row.get("item_id"),
            name: row.get("item_name"),
            rarity: Rarity::parse(&row.get::<String, _>("item_rarity")),
        },
        pending_since: parse_optional_time(row.get("pending_since"))?,
    })
}

pub struct SqliteGameStore {
    pool: SqlitePool,
}

impl SqliteGameStore {
    /// Open (or create) the database file and run migrations.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let path_str = database_path.trim_start_matches("sqlite://");
        if let Some(parent) = Path::new(path_str).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let connection_string = format!("sqlite://{}?mode=rwc", path_str);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                username TEXT PRIMARY KEY,
                last_farmed_at TEXT,
                last_stole_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS catalog (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                rarity TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inventory_slots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                item_id INTEGER NOT NULL REFERENCES catalog(id),
                acquired_at TEXT NOT NULL,
                pending_since TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_inventory_slots_owner
            ON inventory_slots(owner, id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        // At most one pending slot per owner
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_inventory_slots_one_pending
            ON inventory_slots(owner) WHERE pending_since IS NOT NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_slot(&self, slot_id: i64) -> Result<InventorySlot, BrainrotError> {
        let row = sqlx::query(&format!("SELECT {} WHERE s.id = ?", SLOT_COLUMNS))
            .bind(slot_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
            .ok_or_else(|| BrainrotError::Store(format!("Slot {} vanished", slot_id)))?;
        slot_from_row(&row)
    }
}

#[async_trait]
impl GameStore for SqliteGameStore {
    async fn find_player(&self, username: &str) -> Result<Option<Player>, BrainrotError> {
        let row = sqlx::query("SELECT * FROM players WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn create_player(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<Player, BrainrotError> {
        // The primary key turns a racing second insert into a no-op
        sqlx::query(
            r#"
            INSERT INTO players (username, created_at)
            VALUES (?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(stamp(now))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        self.find_player(username)
            .await?
            .ok_or_else(|| BrainrotError::Store(format!("Player {} was not created", username)))
    }

    async fn set_last_farmed(
        &self,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<(), BrainrotError> {
        sqlx::query("UPDATE players SET last_farmed_at = ? WHERE username = ?")
            .bind(stamp(at))
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn set_last_stole(&self, username: &str, at: DateTime<Utc>) -> Result<(), BrainrotError> {
        sqlx::query("UPDATE players SET last_stole_at = ? WHERE username = ?")
            .bind(stamp(at))
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn catalog(&self) -> Result<Vec<CatalogItem>, BrainrotError> {
        let rows = sqlx::query("SELECT id, name, rarity FROM catalog ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(rows
            .iter()
            .map(|row| CatalogItem {
                id: row.get("id"),
                name: row.get("name"),
                rarity: Rarity::parse(&row.get::<String, _>("rarity")),
            })
            .collect())
    }

    async fn seed_catalog(&self, entries: &[NewCatalogItem]) -> Result<usize, BrainrotError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let existing: i64 = sqlx::query("SELECT COUNT(*) AS count FROM catalog")
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?
            .get("count");
        if existing > 0 {
            return Ok(0);
        }

        for entry in entries {
            sqlx::query("INSERT INTO catalog (name, rarity) VALUES (?, ?)")
                .bind(entry.name.as_str())
                .bind(entry.rarity.as_str())
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(entries.len())
    }

    async fn slots(&self, owner: &str) -> Result<Vec<InventorySlot>, BrainrotError> {
        let rows = sqlx::query(&format!(
            "SELECT {} WHERE s.owner = ? ORDER BY s.id",
            SLOT_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(slot_from_row).collect()
    }

    async fn count_permanent(&self, owner: &str) -> Result<usize, BrainrotError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM inventory_slots
            WHERE owner = ? AND pending_since IS NULL
            "#,
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.get::<i64, _>("count") as usize)
    }

    async fn add_slot(
        &self,
        owner: &str,
        item_id: i64,
        at: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_slots (owner, item_id, acquired_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(owner)
        .bind(item_id)
        .bind(stamp(at))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        self.fetch_slot(result.last_insert_rowid()).await
    }

    async fn put_pending(
        &self,
        owner: &str,
        item_id: i64,
        since: DateTime<Utc>,
    ) -> Result<InventorySlot, BrainrotError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query("DELETE FROM inventory_slots WHERE owner = ? AND pending_since IS NOT NULL")
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_slots (owner, item_id, acquired_at, pending_since)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(owner)
        .bind(item_id)
        .bind(stamp(since))
        .bind(stamp(since))
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        self.fetch_slot(result.last_insert_rowid()).await
    }

    async fn transfer_slot(
        &self,
        slot_id: i64,
        new_owner: &str,
        at: DateTime<Utc>,
        pending: bool,
    ) -> Result<Option<InventorySlot>, BrainrotError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        if pending {
            sqlx::query(
                r#"
                DELETE FROM inventory_slots
                WHERE owner = ? AND pending_since IS NOT NULL AND id != ?
                "#,
            )
            .bind(new_owner)
            .bind(slot_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        let moved = sqlx::query(
            r#"
            UPDATE inventory_slots SET owner = ?, acquired_at = ?, pending_since = ?
            WHERE id = ?
            "#,
        )
        .bind(new_owner)
        .bind(stamp(at))
        .bind(pending.then(|| stamp(at)))
        .bind(slot_id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if moved.rows_affected() == 0 {
            return Ok(None);
        }

        tx.commit().await.map_err(store_err)?;
        self.fetch_slot(slot_id).await.map(Some)
    }

    async fn remove_slot(&self, slot_id: i64) -> Result<bool, BrainrotError> {
        let result = sqlx::query("DELETE FROM inventory_slots WHERE id = ?")
            .bind(slot_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn promote_pending(
        &self,
        owner: &str,
        replaced_slot_id: i64,
    ) -> Result<bool, BrainrotError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM inventory_slots
            WHERE id = ? AND owner = ? AND pending_since IS NULL
            "#,
        )
        .bind(replaced_slot_id)
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let promoted = sqlx::query(
            r#"
            UPDATE inventory_slots SET pending_since = NULL
            WHERE owner = ? AND pending_since IS NOT NULL
            "#,
        )
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if deleted.rows_affected() == 0 || promoted.rows_affected() == 0 {
            // Dropping the transaction rolls both statements back
            return Ok(false);
        }

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    async fn purge_pending_before(
        &self,
        owner: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, BrainrotError> {
        let result = sqlx::query(
            r#"
            DELETE FROM inventory_slots
            WHERE owner = ? AND pending_since IS NOT NULL AND pending_since <= ?
            "#,
        )
        .bind(owner)
        .bind(stamp(cutoff))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected())
    }

    async fn owners_with_items(&self) -> Result<Vec<String>, BrainrotError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT owner FROM inventory_slots
            WHERE pending_since IS NULL
            ORDER BY owner
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.iter().map(|row| row.get("owner")).collect())
    }
}
