//! HTTP client for the TMDb v3 API.

use cinelog_shared::{CatalogTitle, MediaType};
use serde::de::DeserializeOwned;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::mapping::{to_catalog_title, to_search_page, SearchPage, TmdbDetails, TmdbSearchPage};

/// Sub-resources fetched alongside a details request.
const DETAILS_APPEND: &str = "credits,videos,images,external_ids,recommendations";

/// Which search endpoint to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    Movie,
    Tv,
    #[default]
    Multi,
}

impl SearchKind {
    /// Parse the `type` query parameter.  Anything unrecognized searches all kinds.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("movie") => Self::Movie,
            Some("tv") | Some("series") => Self::Tv,
            _ => Self::Multi,
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            Self::Movie => "search/movie",
            Self::Tv => "search/tv",
            Self::Multi => "search/multi",
        }
    }

    fn media_type(self) -> Option<MediaType> {
        match self {
            Self::Movie => Some(MediaType::Movie),
            Self::Tv => Some(MediaType::Series),
            Self::Multi => None,
        }
    }
}

/// Thin wrapper around a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Fetch and normalize the full details of one title.
    pub async fn details(&self, media_type: MediaType, id: i64) -> Result<CatalogTitle> {
        let path = format!("{}/{id}", media_type.catalog_path());
        let raw: TmdbDetails = self
            .get_json(&path, &[("append_to_response", DETAILS_APPEND.to_string())])
            .await?;

        tracing::debug!(external_id = id, media_type = %media_type, "catalog details fetched");
        Ok(to_catalog_title(media_type, raw, &self.config.image_base_url))
    }

    /// Search the catalog.  Blank queries are rejected without a request.
    pub async fn search(&self, query: &str, kind: SearchKind, page: u32) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidRequest("search query must not be blank".into()));
        }

        let raw: TmdbSearchPage = self
            .get_json(
                kind.endpoint(),
                &[
                    ("query", query.to_string()),
                    ("page", page.max(1).to_string()),
                ],
            )
            .await?;

        let page = to_search_page(kind.media_type(), raw, &self.config.image_base_url);
        tracing::debug!(query, kind = ?kind, results = page.results.len(), "catalog search");
        Ok(page)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let token = self.config.token.as_deref().ok_or(CatalogError::MissingToken)?;
        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("language", self.config.language.as_str()),
                ("region", self.config.region.as_str()),
                ("include_adult", "false"),
            ])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "catalog request failed");
            return Err(CatalogError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client(token: Option<&str>) -> CatalogClient {
        CatalogClient::new(CatalogConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: token.map(str::to_string),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn search_kind_from_param() {
        assert_eq!(SearchKind::from_param(Some("movie")), SearchKind::Movie);
        assert_eq!(SearchKind::from_param(Some("tv")), SearchKind::Tv);
        assert_eq!(SearchKind::from_param(Some("series")), SearchKind::Tv);
        assert_eq!(SearchKind::from_param(Some("person")), SearchKind::Multi);
        assert_eq!(SearchKind::from_param(None), SearchKind::Multi);
    }

    #[tokio::test]
    async fn missing_token_fails_before_sending() {
        let client = offline_client(None);
        let err = client.details(MediaType::Movie, 603).await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingToken));
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let client = offline_client(Some("token"));
        let err = client.search("   ", SearchKind::Multi, 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(_)));
    }
}
