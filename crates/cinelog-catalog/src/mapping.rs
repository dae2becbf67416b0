//! Raw TMDb response shapes and their normalization.
//!
//! Everything here is pure: the client deserializes into the `Tmdb*` structs
//! and hands them to [`to_catalog_title`] / [`to_search_page`].

use std::collections::BTreeMap;

use cinelog_shared::constants::{MAX_CAST_MEMBERS, MAX_GALLERY_IMAGES};
use cinelog_shared::{CastMember, CatalogRating, CatalogTitle, MediaType};
use serde::{Deserialize, Serialize};

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "w780";
pub const PROFILE_SIZE: &str = "w185";
pub const SEARCH_POSTER_SIZE: &str = "w342";

// ---------------------------------------------------------------------------
// Raw responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub episode_run_time: Vec<i32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub videos: Option<TmdbList<TmdbVideo>>,
    #[serde(default)]
    pub images: Option<TmdbImages>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub external_ids: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbList<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImages {
    #[serde(default)]
    pub backdrops: Vec<TmdbImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImage {
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCast {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<TmdbSearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchHit {
    pub id: i64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized search output
// ---------------------------------------------------------------------------

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub year: Option<i32>,
    pub vote_average: Option<f64>,
    pub poster: Option<String>,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Build a CDN URL for an image path; `None` for missing or empty paths.
pub fn image_url(image_base: &str, path: Option<&str>, size: &str) -> Option<String> {
    match path {
        Some(p) if !p.is_empty() => Some(format!("{}/{size}{p}", image_base.trim_end_matches('/'))),
        _ => None,
    }
}

/// The best YouTube trailer: the first official one, else the first one.
pub fn pick_trailer_url(videos: &[TmdbVideo]) -> Option<String> {
    let mut trailers = videos
        .iter()
        .filter(|v| v.site == "YouTube" && v.kind == "Trailer");
    let first = trailers.clone().next()?;
    let best = trailers
        .find(|v| v.official == Some(true))
        .unwrap_or(first);
    Some(format!("https://www.youtube.com/watch?v={}", best.key))
}

/// Year from a `YYYY-MM-DD` date string.
fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Normalize a details response into the DTO persisted by the store.
///
/// Gallery and cast are capped here; the store keeps whatever it is given.
pub fn to_catalog_title(media_type: MediaType, data: TmdbDetails, image_base: &str) -> CatalogTitle {
    let date = data
        .release_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(data.first_air_date.as_deref());

    let runtime = data
        .runtime
        .filter(|r| *r > 0)
        .or_else(|| data.episode_run_time.first().copied());

    let trailer = data
        .videos
        .as_ref()
        .and_then(|v| pick_trailer_url(&v.results));

    let images = data
        .images
        .as_ref()
        .map(|i| {
            i.backdrops
                .iter()
                .take(MAX_GALLERY_IMAGES)
                .filter_map(|b| image_url(image_base, Some(&b.file_path), BACKDROP_SIZE))
                .collect()
        })
        .unwrap_or_default();

    let cast = data
        .credits
        .as_ref()
        .map(|c| {
            c.cast
                .iter()
                .take(MAX_CAST_MEMBERS)
                .map(|p| CastMember {
                    id: p.id,
                    name: p.name.clone(),
                    character: p.character.clone(),
                    profile: image_url(image_base, p.profile_path.as_deref(), PROFILE_SIZE),
                })
                .collect()
        })
        .unwrap_or_default();

    CatalogTitle {
        id: Some(data.id),
        media_type: Some(media_type),
        title: data.title.clone().or(data.name.clone()).unwrap_or_default(),
        overview: non_empty(data.overview.clone()),
        year: year_of(date),
        runtime,
        genres: data.genres.iter().map(|g| g.name.clone()).collect(),
        rating: CatalogRating {
            vote_average: data.vote_average,
            vote_count: data.vote_count,
        },
        trailer,
        poster: image_url(image_base, data.poster_path.as_deref(), POSTER_SIZE),
        backdrop: image_url(image_base, data.backdrop_path.as_deref(), BACKDROP_SIZE),
        images,
        cast,
        external_ids: data.external_ids,
    }
}

/// Normalize a search response.  Hits that are neither movies nor series
/// (people, in multi search) are dropped.
pub fn to_search_page(default_type: Option<MediaType>, data: TmdbSearchPage, image_base: &str) -> SearchPage {
    let results = data
        .results
        .into_iter()
        .filter_map(|hit| {
            let media_type = match hit.media_type.as_deref() {
                Some(raw) => raw.parse().ok()?,
                None => default_type.unwrap_or(if hit.title.is_some() {
                    MediaType::Movie
                } else {
                    MediaType::Series
                }),
            };
            let date = hit
                .release_date
                .as_deref()
                .filter(|d| !d.is_empty())
                .or(hit.first_air_date.as_deref());

            Some(SearchResult {
                id: hit.id,
                media_type,
                title: hit.title.clone().or(hit.name.clone()).unwrap_or_default(),
                overview: non_empty(hit.overview.clone()),
                year: year_of(date),
                vote_average: hit.vote_average,
                poster: image_url(image_base, hit.poster_path.as_deref(), SEARCH_POSTER_SIZE),
            })
        })
        .collect();

    SearchPage {
        page: data.page,
        total_pages: data.total_pages,
        results,
    }
}
