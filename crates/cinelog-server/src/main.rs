//! # cinelog-server
//!
//! HTTP API for the Cinelog catalog and personal library.
//!
//! This binary provides:
//! - **Catalog proxy** for TMDb search and details; fetched details are
//!   upserted into the local media table
//! - **Library** endpoints for each user's watch status and personal rating
//! - **Comments** on titles, whose ratings flow into the user's library
//!
//! Callers are identified by the `x-user-id` header, set by an upstream
//! authenticator.

mod api;
mod config;
mod error;

use std::sync::{Arc, Mutex};

use cinelog_catalog::CatalogClient;
use cinelog_shared::constants::APP_NAME;
use cinelog_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cinelog_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open storage and the catalog client
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            info!(path = %path.display(), "opening database");
            Database::open_at(path)?
        }
        None => Database::new()?,
    };

    let catalog = CatalogClient::new(config.catalog.clone())?;

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        catalog: Arc::new(catalog),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
