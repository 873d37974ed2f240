// This is the entry point of the brainrot game service.
//
// **Architecture Overview:**
// - `core/` = Game rules (knows nothing about HTTP or SQL)
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `http/` = axum adapter the chat bot talks to
//
// This file's job is to:
// 1. Load configuration
// 2. Pick a store and seed the catalog (dependency injection)
// 3. Serve the HTTP routes

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::{Config, StoreBackend};
use crate::core::brainrot::catalog::{default_catalog, load_catalog_file};
use crate::core::brainrot::{BrainrotService, GameStore, NewCatalogItem};
use crate::infra::brainrot::{InMemoryGameStore, SqliteGameStore};
use anyhow::Context;
use std::sync::Arc;

/// Wrap a store in the service, seed it, and build the router.
async fn build_app<S: GameStore + 'static>(
    store: S,
    config: &Config,
    catalog: &[NewCatalogItem],
) -> anyhow::Result<axum::Router> {
    let service = BrainrotService::new_with_config(store, config.game.clone());

    let inserted = service
        .seed_catalog(catalog)
        .await
        .context("Failed to seed the brainrot catalog")?;
    if inserted > 0 {
        tracing::info!(count = inserted, "Seeded brainrot catalog");
    } else {
        tracing::debug!("Catalog already populated, skipping seed");
    }

    Ok(http::router(Arc::new(service)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl-C, shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let catalog = match &config.catalog_path {
        Some(path) => load_catalog_file(path)?,
        None => default_catalog(),
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    let app = match config.store_backend {
        StoreBackend::Sqlite => {
            let store = SqliteGameStore::new(&config.database_path)
                .await
                .context("Failed to initialize SQLite store")?;
            tracing::info!(path = %config.database_path, "Using SQLite store");
            build_app(store, &config, &catalog).await?
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, game state is lost on restart");
            build_app(InMemoryGameStore::new(), &config, &catalog).await?
        }
    };

    let address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    tracing::info!("Brainrot API listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
