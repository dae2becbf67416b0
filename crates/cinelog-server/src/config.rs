//! Server configuration loaded from environment variables.
//!
//! Everything has a default so the server starts with zero configuration;
//! only catalog lookups need `TMDB_TOKEN`.

use std::net::SocketAddr;
use std::path::PathBuf;

use cinelog_catalog::CatalogConfig;
use cinelog_shared::constants::DEFAULT_HTTP_PORT;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: unset (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Remote catalog settings (`TMDB_*`).
    pub catalog: CatalogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            catalog: CatalogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Some(parsed) = parse_addr(&addr) {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        config.catalog = CatalogConfig::from_env();

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_addr(raw: &str) -> Option<SocketAddr> {
    raw.trim().parse().ok()
}
