// Brainrot module - farming, stealing and inventory rules for the chat game

mod brainrot_models;
mod brainrot_service;
pub mod catalog;
mod game_store;
pub mod inventory;
pub mod player_directory;
mod player_locks;
pub mod replies;

pub use brainrot_models::{Action, BrainrotError, GameConfig, InventorySlot, Player};
pub use brainrot_service::BrainrotService;
pub use catalog::{CatalogItem, NewCatalogItem, Rarity};
pub use game_store::GameStore;
