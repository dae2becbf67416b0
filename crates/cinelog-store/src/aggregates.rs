//! Recomputation of the derived statistics stored on each media row.
//!
//! `avg_personal_rating`, `ratings_count` and `comments_count` are computed
//! from `user_media` and `comments` and written back in a single `UPDATE`
//! whose values come from correlated subqueries.  SQLite executes a statement
//! atomically under the database write lock, so two concurrent mutations on
//! the same title cannot interleave between the read and the write.
//!
//! Mutation handlers call [`Database::recompute_aggregates`] after their own
//! transaction commits.  A failure there is logged with [`report_stale`] and
//! otherwise ignored: the user's write has already been persisted and stale
//! statistics are corrected by the next recomputation.

use rusqlite::params;

use crate::database::Database;
use crate::error::{or_not_found, Result, StoreError};
use crate::models::MediaAggregates;

/// `AVG` over zero rows is `NULL`, which keeps the average null exactly when
/// the count is zero.
const RECOMPUTE_SQL: &str = "UPDATE media SET
        ratings_count = (
            SELECT COUNT(*) FROM user_media
            WHERE media_id = ?1 AND personal_rating IS NOT NULL
        ),
        avg_personal_rating = (
            SELECT AVG(personal_rating) FROM user_media
            WHERE media_id = ?1 AND personal_rating IS NOT NULL
        ),
        comments_count = (
            SELECT COUNT(*) FROM comments WHERE media_id = ?1
        )
     WHERE id = ?1
     RETURNING avg_personal_rating, ratings_count, comments_count";

impl Database {
    /// Recompute and persist the derived statistics of one media row.
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist and
    /// [`StoreError::Sqlite`] if the derived columns are missing.
    pub fn recompute_aggregates(&self, media_id: i64) -> Result<MediaAggregates> {
        let aggregates = self
            .conn()
            .query_row(RECOMPUTE_SQL, params![media_id], |row| {
                Ok(MediaAggregates {
                    avg_personal_rating: row.get(0)?,
                    ratings_count: row.get(1)?,
                    comments_count: row.get(2)?,
                })
            })
            .map_err(or_not_found("media"))?;

        tracing::debug!(
            media_id,
            ratings_count = aggregates.ratings_count,
            comments_count = aggregates.comments_count,
            avg_personal_rating = ?aggregates.avg_personal_rating,
            "media aggregates recomputed"
        );

        Ok(aggregates)
    }

    /// Recompute after a committed mutation, logging instead of propagating.
    pub(crate) fn refresh_after_mutation(&self, media_id: i64) {
        if let Err(err) = self.recompute_aggregates(media_id) {
            report_stale(media_id, &err);
        }
    }
}

/// Log a recomputation failure that the caller has chosen to tolerate.
pub fn report_stale(media_id: i64, err: &StoreError) {
    tracing::warn!(
        media_id,
        error = %err,
        "aggregate recomputation failed, derived fields left stale"
    );
}
