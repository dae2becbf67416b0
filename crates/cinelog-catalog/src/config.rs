//! Catalog client configuration loaded from environment variables.

use std::time::Duration;

/// Settings for [`crate::CatalogClient`].
#[derive(Clone)]
pub struct CatalogConfig {
    /// API root.
    /// Env: `TMDB_BASE_URL`
    /// Default: `https://api.themoviedb.org/3`
    pub base_url: String,

    /// Image CDN root; a size segment and the file path are appended.
    /// Default: `https://image.tmdb.org/t/p`
    pub image_base_url: String,

    /// v4 bearer token.
    /// Env: `TMDB_TOKEN`
    /// Default: unset (every request fails with `MissingToken`).
    pub token: Option<String>,

    /// Response language.
    /// Env: `TMDB_LANG`
    /// Default: `it-IT`
    pub language: String,

    /// Release-date region.
    /// Env: `TMDB_REGION`
    /// Default: `IT`
    pub region: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field("image_base_url", &self.image_base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("language", &self.language)
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            token: None,
            language: "it-IT".to_string(),
            region: "IT".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TMDB_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(token) = std::env::var("TMDB_TOKEN") {
            if !token.trim().is_empty() {
                config.token = Some(token.trim().to_string());
            }
        }

        if let Ok(lang) = std::env::var("TMDB_LANG") {
            config.language = lang;
        }

        if let Ok(region) = std::env::var("TMDB_REGION") {
            config.region = region;
        }

        if config.token.is_none() {
            tracing::warn!("TMDB_TOKEN not set, catalog requests will fail");
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.language, "it-IT");
        assert_eq!(config.region, "IT");
        assert!(config.token.is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config = CatalogConfig {
            token: Some("secret-bearer".into()),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-bearer"));
        assert!(printed.contains("<redacted>"));
    }
}
