// Implementations of the GameStore port.

pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
pub use in_memory::InMemoryGameStore;
pub use sqlite_store::SqliteGameStore;
