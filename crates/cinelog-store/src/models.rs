//! Domain model structs persisted in the SQLite database.
//!
//! Every record struct derives `Serialize` so it can be handed directly to the HTTP
//! layer; the input structs ([`LibraryUpdate`], [`CommentUpdate`]) derive
//! `Deserialize` and distinguish an absent field from an explicit `null`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cinelog_shared::{CastMember, MediaType, WatchStatus};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.  Credentials live with the upstream authenticator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// One catalog title, shared by every user that references it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    /// Catalog id; unique together with `media_type`.
    pub external_id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub year: Option<i32>,
    /// Minutes (average episode length for series).
    pub runtime: Option<i32>,
    pub genres: Vec<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub trailer_url: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub gallery: Vec<String>,
    pub cast: Vec<CastMember>,
    pub external_ids: BTreeMap<String, serde_json::Value>,
    /// When the catalog data was last written.
    pub last_synced_at: DateTime<Utc>,
    /// Mean of all non-null personal ratings; `None` iff `ratings_count == 0`.
    pub avg_personal_rating: Option<f64>,
    pub ratings_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The derived statistics written by aggregate recomputation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaAggregates {
    pub avg_personal_rating: Option<f64>,
    pub ratings_count: i64,
    pub comments_count: i64,
}

/// The slice of [`Media`] shown next to each library entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub id: i64,
    pub external_id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub vote_average: Option<f64>,
    pub year: Option<i32>,
    pub backdrop_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// One user's relationship to one title.  Unique per `(user_id, media_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserMedia {
    pub id: i64,
    pub user_id: i64,
    pub media_id: i64,
    pub status: WatchStatus,
    /// In `[0, 10]` when present.
    pub personal_rating: Option<f64>,
    pub personal_comment: Option<String>,
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A library row together with the title it points at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    #[serde(flatten)]
    pub entry: UserMedia,
    pub media: MediaSummary,
}

/// Partial update applied by [`Database::upsert_user_media`].
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
///
/// [`Database::upsert_user_media`]: crate::Database::upsert_user_media
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryUpdate {
    #[serde(default)]
    pub status: Option<WatchStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub personal_rating: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub personal_comment: Option<Option<String>>,
    #[serde(default)]
    pub watched_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A free-text comment on a title, optionally carrying a rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub media_id: i64,
    pub text: String,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied by [`Database::update_comment`].
///
/// [`Database::update_comment`]: crate::Database::update_comment
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommentUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// A named, user-owned collection of titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// In insertion order.
    pub items: Vec<MediaSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Title and description for creating or replacing a list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Present-but-null deserializes to `Some(None)`; absence is handled by
/// `#[serde(default)]`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
