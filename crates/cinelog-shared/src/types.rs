use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_RATING, MIN_RATING};
use crate::error::SharedError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of title tracked by the catalog.
///
/// The remote catalog calls series `tv`; that spelling is accepted on input
/// but `series` is what gets stored and emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }

    /// Path segment used by the remote catalog API.
    pub fn catalog_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "series" | "tv" => Ok(MediaType::Series),
            other => Err(SharedError::UnknownMediaType(other.to_string())),
        }
    }
}

/// Where a title sits in a user's library.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    ToWatch,
    Watching,
    Watched,
    Favorite,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::ToWatch => "to_watch",
            WatchStatus::Watching => "watching",
            WatchStatus::Watched => "watched",
            WatchStatus::Favorite => "favorite",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_watch" => Ok(WatchStatus::ToWatch),
            "watching" => Ok(WatchStatus::Watching),
            "watched" => Ok(WatchStatus::Watched),
            "favorite" => Ok(WatchStatus::Favorite),
            other => Err(SharedError::UnknownWatchStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog DTO
// ---------------------------------------------------------------------------

/// Vote statistics reported by the remote catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogRating {
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
}

/// One credited cast member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    /// Catalog person id.
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    /// Fully resolved profile image URL.
    #[serde(default)]
    pub profile: Option<String>,
}

/// Normalized title data, produced from a catalog response before it is
/// persisted.
///
/// `id` and `media_type` are optional here because the DTO is built from
/// loosely typed input; the store rejects a DTO missing either of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTitle {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub rating: CatalogRating,
    #[serde(default)]
    pub trailer: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub backdrop: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub external_ids: BTreeMap<String, serde_json::Value>,
}

/// Whether `value` is an acceptable personal or comment rating.
pub fn rating_in_range(value: f64) -> bool {
    value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_accepts_catalog_alias() {
        let parsed: MediaType = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(parsed, MediaType::Series);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"series\"");
        assert_eq!("tv".parse::<MediaType>().unwrap(), MediaType::Series);
        assert!("anime".parse::<MediaType>().is_err());
    }

    #[test]
    fn watch_status_defaults_to_to_watch() {
        assert_eq!(WatchStatus::default(), WatchStatus::ToWatch);
        assert_eq!(
            serde_json::to_string(&WatchStatus::ToWatch).unwrap(),
            "\"to_watch\""
        );
        assert_eq!("favorite".parse::<WatchStatus>().unwrap(), WatchStatus::Favorite);
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(rating_in_range(0.0));
        assert!(rating_in_range(10.0));
        assert!(rating_in_range(7.5));
        assert!(!rating_in_range(-0.1));
        assert!(!rating_in_range(10.01));
        assert!(!rating_in_range(f64::NAN));
    }

    #[test]
    fn dto_deserializes_catalog_shape() {
        let json = serde_json::json!({
            "id": 603,
            "mediaType": "movie",
            "title": "The Matrix",
            "year": 1999,
            "genres": ["Action"],
            "rating": { "vote_average": 8.2, "vote_count": 25000 },
            "cast": [{ "id": 6384, "name": "Keanu Reeves", "character": "Neo", "profile": null }],
            "externalIds": { "imdb_id": "tt0133093" }
        });

        let dto: CatalogTitle = serde_json::from_value(json).unwrap();
        assert_eq!(dto.id, Some(603));
        assert_eq!(dto.media_type, Some(MediaType::Movie));
        assert_eq!(dto.rating.vote_count, Some(25000));
        assert_eq!(dto.cast[0].character.as_deref(), Some("Neo"));
        assert!(dto.images.is_empty());
        assert_eq!(dto.external_ids["imdb_id"], "tt0133093");
    }
}
