//! Catalog upsert and lookup of [`Media`] records.
//!
//! A media row is keyed by `(external_id, media_type)`.  [`Database::upsert_media`]
//! fully replaces every catalog-sourced column on each call and never touches
//! the derived statistics, which belong to [`crate::aggregates`].

use cinelog_shared::{CatalogTitle, MediaType};
use rusqlite::{params, Connection, OptionalExtension};

use crate::columns::{now, parse_enum, parse_json, parse_ts, ts_to_sql};
use crate::database::Database;
use crate::error::{or_not_found, Result, StoreError};
use crate::models::{Media, MediaSummary};

const MEDIA_COLUMNS: &str = "id, external_id, media_type, title, overview, year, runtime, \
     genres, vote_average, vote_count, trailer_url, poster_url, backdrop_url, gallery, \
     cast_members, external_ids, last_synced_at, avg_personal_rating, ratings_count, \
     comments_count, created_at, updated_at";

/// Single-statement insert-or-replace.  The conflict branch rewrites every
/// catalog column; derived columns are not written here.
const UPSERT_SQL: &str = "INSERT INTO media (
        external_id, media_type, title, overview, year, runtime, genres,
        vote_average, vote_count, trailer_url, poster_url, backdrop_url,
        gallery, cast_members, external_ids, last_synced_at, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16, ?16)
     ON CONFLICT (external_id, media_type) DO UPDATE SET
        title          = excluded.title,
        overview       = excluded.overview,
        year           = excluded.year,
        runtime        = excluded.runtime,
        genres         = excluded.genres,
        vote_average   = excluded.vote_average,
        vote_count     = excluded.vote_count,
        trailer_url    = excluded.trailer_url,
        poster_url     = excluded.poster_url,
        backdrop_url   = excluded.backdrop_url,
        gallery        = excluded.gallery,
        cast_members   = excluded.cast_members,
        external_ids   = excluded.external_ids,
        last_synced_at = excluded.last_synced_at,
        updated_at     = excluded.updated_at
     RETURNING id";

impl Database {
    /// Insert or refresh the media row described by a catalog DTO and return
    /// the stored record as re-read from the database.
    ///
    /// Fails with [`StoreError::Validation`] when the DTO has no external id
    /// (or id `0`) or no media type.  Array fields are stored as given.
    pub fn upsert_media(&self, dto: &CatalogTitle) -> Result<Media> {
        let external_id = dto
            .id
            .filter(|id| *id != 0)
            .ok_or_else(|| StoreError::Validation("catalog title is missing its id".into()))?;
        let media_type = dto.media_type.ok_or_else(|| {
            StoreError::Validation("catalog title is missing its media type".into())
        })?;

        let synced_at = ts_to_sql(&now());
        let id: i64 = self.conn().query_row(
            UPSERT_SQL,
            params![
                external_id,
                media_type.as_str(),
                dto.title,
                dto.overview,
                dto.year,
                dto.runtime,
                serde_json::to_string(&dto.genres)?,
                dto.rating.vote_average,
                dto.rating.vote_count,
                dto.trailer,
                dto.poster,
                dto.backdrop,
                serde_json::to_string(&dto.images)?,
                serde_json::to_string(&dto.cast)?,
                serde_json::to_string(&dto.external_ids)?,
                synced_at,
            ],
            |row| row.get(0),
        )?;

        tracing::debug!(
            media_id = id,
            external_id,
            media_type = %media_type,
            "media upserted from catalog"
        );

        self.get_media(id)
    }

    /// Fetch a single media row by its local id.
    pub fn get_media(&self, id: i64) -> Result<Media> {
        self.conn()
            .query_row(
                &format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?1"),
                params![id],
                row_to_media,
            )
            .map_err(or_not_found("media"))
    }

    /// Fetch a media row by its catalog key.
    pub fn find_media(&self, external_id: i64, media_type: MediaType) -> Result<Media> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {MEDIA_COLUMNS} FROM media WHERE external_id = ?1 AND media_type = ?2"
                ),
                params![external_id, media_type.as_str()],
                row_to_media,
            )
            .map_err(or_not_found("media"))
    }
}

/// Columns read by [`row_to_summary`], for queries that alias `media` as `m`.
pub(crate) const SUMMARY_COLUMNS: &str =
    "m.id, m.external_id, m.media_type, m.title, m.poster_url, m.vote_average, m.year, m.backdrop_url";

/// Map the [`SUMMARY_COLUMNS`] starting at column `start`.
pub(crate) fn row_to_summary(row: &rusqlite::Row<'_>, start: usize) -> rusqlite::Result<MediaSummary> {
    let media_type: String = row.get(start + 2)?;

    Ok(MediaSummary {
        id: row.get(start)?,
        external_id: row.get(start + 1)?,
        media_type: parse_enum(start + 2, &media_type)?,
        title: row.get(start + 3)?,
        poster_url: row.get(start + 4)?,
        vote_average: row.get(start + 5)?,
        year: row.get(start + 6)?,
        backdrop_url: row.get(start + 7)?,
    })
}

/// Fail with `NotFound("media")` unless the row exists.
pub(crate) fn ensure_media_exists(conn: &Connection, media_id: i64) -> Result<()> {
    conn.query_row("SELECT 1 FROM media WHERE id = ?1", params![media_id], |_| Ok(()))
        .optional()?
        .ok_or(StoreError::NotFound("media"))
}

fn row_to_media(row: &rusqlite::Row<'_>) -> rusqlite::Result<Media> {
    let media_type: String = row.get(2)?;
    let genres: String = row.get(7)?;
    let gallery: String = row.get(13)?;
    let cast: String = row.get(14)?;
    let external_ids: String = row.get(15)?;
    let synced: String = row.get(16)?;
    let created: String = row.get(20)?;
    let updated: String = row.get(21)?;

    Ok(Media {
        id: row.get(0)?,
        external_id: row.get(1)?,
        media_type: parse_enum(2, &media_type)?,
        title: row.get(3)?,
        overview: row.get(4)?,
        year: row.get(5)?,
        runtime: row.get(6)?,
        genres: parse_json(7, &genres)?,
        vote_average: row.get(8)?,
        vote_count: row.get(9)?,
        trailer_url: row.get(10)?,
        poster_url: row.get(11)?,
        backdrop_url: row.get(12)?,
        gallery: parse_json(13, &gallery)?,
        cast: parse_json(14, &cast)?,
        external_ids: parse_json(15, &external_ids)?,
        last_synced_at: parse_ts(16, &synced)?,
        avg_personal_rating: row.get(17)?,
        ratings_count: row.get(18)?,
        comments_count: row.get(19)?,
        created_at: parse_ts(20, &created)?,
        updated_at: parse_ts(21, &updated)?,
    })
}
