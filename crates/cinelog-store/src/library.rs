//! A user's library: CRUD over [`UserMedia`] rows.
//!
//! Every operation that changes whether or how a title is rated recomputes the
//! title's aggregates once its own write has committed.  Status-only and
//! personal-comment-only changes do not.

use chrono::{DateTime, Utc};
use cinelog_shared::{rating_in_range, WatchStatus};
use rusqlite::{params, Connection, OptionalExtension};

use crate::columns::{now, parse_enum, parse_opt_ts, parse_ts, ts_to_sql};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::media::{ensure_media_exists, row_to_summary, SUMMARY_COLUMNS};
use crate::models::{LibraryEntry, LibraryUpdate, UserMedia};

const USER_MEDIA_COLUMNS: &str = "id, user_id, media_id, status, personal_rating, \
     personal_comment, watched_at, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// The user's library, most recently touched first.
    pub fn list_library(&self, user_id: i64) -> Result<Vec<LibraryEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT um.id, um.user_id, um.media_id, um.status, um.personal_rating,
                    um.personal_comment, um.watched_at, um.created_at, um.updated_at,
                    {SUMMARY_COLUMNS}
             FROM user_media um
             JOIN media m ON m.id = um.media_id
             WHERE um.user_id = ?1
             ORDER BY um.updated_at DESC, um.id DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(LibraryEntry {
                entry: row_to_user_media(row)?,
                media: row_to_summary(row, 9)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Fetch the user's entry for one title.
    pub fn get_user_media(&self, user_id: i64, media_id: i64) -> Result<UserMedia> {
        fetch_user_media(self.conn(), user_id, media_id)?
            .ok_or(StoreError::NotFound("library entry"))
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Create the user's entry for a title, or apply a partial update to the
    /// existing one.  Returns the stored row and whether it was created.
    ///
    /// New entries default to [`WatchStatus::ToWatch`].
    pub fn upsert_user_media(
        &self,
        user_id: i64,
        media_id: i64,
        update: &LibraryUpdate,
    ) -> Result<(UserMedia, bool)> {
        if let Some(Some(rating)) = update.personal_rating {
            validate_rating(rating)?;
        }

        let tx = self.write_tx()?;
        ensure_media_exists(&tx, media_id)?;

        let now = ts_to_sql(&now());
        let watched_at = update.watched_at.as_ref().map(ts_to_sql);

        let created = match fetch_user_media(&tx, user_id, media_id)? {
            None => {
                tx.execute(
                    "INSERT INTO user_media
                        (user_id, media_id, status, personal_rating, personal_comment,
                         watched_at, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                    params![
                        user_id,
                        media_id,
                        update.status.unwrap_or_default().as_str(),
                        update.personal_rating.flatten(),
                        update.personal_comment.clone().flatten(),
                        watched_at,
                        now,
                    ],
                )?;
                true
            }
            Some(existing) => {
                let status = update.status.unwrap_or(existing.status);
                let rating = update.personal_rating.unwrap_or(existing.personal_rating);
                let comment = update
                    .personal_comment
                    .clone()
                    .unwrap_or(existing.personal_comment);
                let watched_at = watched_at.or(existing.watched_at.as_ref().map(ts_to_sql));

                tx.execute(
                    "UPDATE user_media
                     SET status = ?1, personal_rating = ?2, personal_comment = ?3,
                         watched_at = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![status.as_str(), rating, comment, watched_at, now, existing.id],
                )?;
                false
            }
        };

        let entry = fetch_user_media(&tx, user_id, media_id)?
            .ok_or(StoreError::NotFound("library entry"))?;
        tx.commit()?;

        tracing::debug!(user_id, media_id, created, status = %entry.status, "library entry saved");

        if update.personal_rating.is_some() {
            self.refresh_after_mutation(media_id);
        }

        Ok((entry, created))
    }

    /// Change only the watch status of an existing entry.
    pub fn update_status(&self, user_id: i64, media_id: i64, status: WatchStatus) -> Result<UserMedia> {
        let affected = self.conn().execute(
            "UPDATE user_media SET status = ?1, updated_at = ?2
             WHERE user_id = ?3 AND media_id = ?4",
            params![status.as_str(), ts_to_sql(&now()), user_id, media_id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("library entry"));
        }

        tracing::debug!(user_id, media_id, status = %status, "library status updated");
        self.get_user_media(user_id, media_id)
    }

    /// Set the personal rating of an existing entry, optionally replacing the
    /// personal comment too (`Some(None)` clears it).
    pub fn update_rating(
        &self,
        user_id: i64,
        media_id: i64,
        rating: f64,
        personal_comment: Option<Option<String>>,
    ) -> Result<UserMedia> {
        validate_rating(rating)?;
        let now = ts_to_sql(&now());

        let affected = match personal_comment {
            Some(comment) => self.conn().execute(
                "UPDATE user_media
                 SET personal_rating = ?1, personal_comment = ?2, updated_at = ?3
                 WHERE user_id = ?4 AND media_id = ?5",
                params![rating, comment, now, user_id, media_id],
            )?,
            None => self.conn().execute(
                "UPDATE user_media SET personal_rating = ?1, updated_at = ?2
                 WHERE user_id = ?3 AND media_id = ?4",
                params![rating, now, user_id, media_id],
            )?,
        };
        if affected == 0 {
            return Err(StoreError::NotFound("library entry"));
        }

        tracing::debug!(user_id, media_id, rating, "library rating updated");
        self.refresh_after_mutation(media_id);

        self.get_user_media(user_id, media_id)
    }

    /// Remove a title from the user's library.
    pub fn remove_from_library(&self, user_id: i64, media_id: i64) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM user_media WHERE user_id = ?1 AND media_id = ?2",
            params![user_id, media_id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("library entry"));
        }

        tracing::debug!(user_id, media_id, "library entry removed");
        self.refresh_after_mutation(media_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject ratings outside `[0, 10]` (and NaN / infinities).
pub(crate) fn validate_rating(rating: f64) -> Result<f64> {
    if rating_in_range(rating) {
        Ok(rating)
    } else {
        Err(StoreError::Validation(format!(
            "rating must be between 0 and 10, got {rating}"
        )))
    }
}

/// Find-or-create the user's entry and overwrite its personal rating.
/// New entries start as [`WatchStatus::Watched`].
pub(crate) fn mirror_rating(
    conn: &Connection,
    user_id: i64,
    media_id: i64,
    rating: f64,
    at: &DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO user_media (user_id, media_id, status, personal_rating, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT (user_id, media_id) DO UPDATE SET
            personal_rating = excluded.personal_rating,
            updated_at      = excluded.updated_at",
        params![
            user_id,
            media_id,
            WatchStatus::Watched.as_str(),
            rating,
            ts_to_sql(at),
        ],
    )?;
    Ok(())
}

fn fetch_user_media(conn: &Connection, user_id: i64, media_id: i64) -> Result<Option<UserMedia>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {USER_MEDIA_COLUMNS} FROM user_media WHERE user_id = ?1 AND media_id = ?2"
            ),
            params![user_id, media_id],
            row_to_user_media,
        )
        .optional()?)
}

/// Map the first nine columns of a row to a [`UserMedia`].
fn row_to_user_media(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserMedia> {
    let status: String = row.get(3)?;
    let created: String = row.get(7)?;
    let updated: String = row.get(8)?;

    Ok(UserMedia {
        id: row.get(0)?,
        user_id: row.get(1)?,
        media_id: row.get(2)?,
        status: parse_enum(3, &status)?,
        personal_rating: row.get(4)?,
        personal_comment: row.get(5)?,
        watched_at: parse_opt_ts(6, row.get(6)?)?,
        created_at: parse_ts(7, &created)?,
        updated_at: parse_ts(8, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use cinelog_shared::WatchStatus;

    use crate::testutil::seeded;
    use crate::{LibraryUpdate, StoreError};

    #[test]
    fn first_upsert_creates_with_default_status() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        let (entry, created) = db
            .upsert_user_media(alice, media_id, &LibraryUpdate::default())
            .unwrap();

        assert!(created);
        assert_eq!(entry.status, WatchStatus::ToWatch);
        assert_eq!(entry.personal_rating, None);
    }

    #[test]
    fn second_upsert_applies_only_provided_fields() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        db.upsert_user_media(
            alice,
            media_id,
            &LibraryUpdate {
                personal_rating: Some(Some(6.5)),
                personal_comment: Some(Some("good".into())),
                ..Default::default()
            },
        )
        .unwrap();

        let watched = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let (entry, created) = db
            .upsert_user_media(
                alice,
                media_id,
                &LibraryUpdate {
                    status: Some(WatchStatus::Watched),
                    watched_at: Some(watched),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!created);
        assert_eq!(entry.status, WatchStatus::Watched);
        assert_eq!(entry.personal_rating, Some(6.5));
        assert_eq!(entry.personal_comment.as_deref(), Some("good"));
        assert_eq!(entry.watched_at, Some(watched));
    }

    #[test]
    fn explicit_null_clears_rating_and_recomputes() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        db.upsert_user_media(
            alice,
            media_id,
            &LibraryUpdate {
                personal_rating: Some(Some(8.0)),
                ..Default::default()
            },
        )
        .unwrap();

        let (entry, _) = db
            .upsert_user_media(
                alice,
                media_id,
                &LibraryUpdate {
                    personal_rating: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(entry.personal_rating, None);

        let media = db.get_media(media_id).unwrap();
        assert_eq!(media.ratings_count, 0);
        assert_eq!(media.avg_personal_rating, None);
    }

    #[test]
    fn rating_bounds() {
        let (db, _dir, [alice, bob, carol], media_id) = seeded();

        for (user, value) in [(alice, 0.0), (bob, 10.0)] {
            let (entry, _) = db
                .upsert_user_media(
                    user,
                    media_id,
                    &LibraryUpdate {
                        personal_rating: Some(Some(value)),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert_eq!(entry.personal_rating, Some(value));
        }

        for value in [-0.5, 10.5, f64::NAN] {
            let err = db
                .upsert_user_media(
                    carol,
                    media_id,
                    &LibraryUpdate {
                        personal_rating: Some(Some(value)),
                        ..Default::default()
                    },
                )
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert!(db.get_user_media(carol, media_id).unwrap_err().is_not_found());

        assert!(db.update_rating(alice, media_id, 11.0, None).unwrap_err().is_validation());
        assert_eq!(db.update_rating(alice, media_id, 10.0, None).unwrap().personal_rating, Some(10.0));
        assert_eq!(db.update_rating(alice, media_id, 0.0, None).unwrap().personal_rating, Some(0.0));
    }

    #[test]
    fn upsert_on_unknown_media_is_not_found() {
        let (db, _dir, [alice, ..], _) = seeded();
        let err = db
            .upsert_user_media(alice, 4242, &LibraryUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("media")));
    }

    #[test]
    fn status_change_does_not_touch_aggregates() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        db.upsert_user_media(alice, media_id, &LibraryUpdate::default())
            .unwrap();

        // A status change must leave this sentinel alone.
        db.conn()
            .execute("UPDATE media SET ratings_count = 99 WHERE id = ?1", [media_id])
            .unwrap();

        let entry = db
            .update_status(alice, media_id, WatchStatus::Favorite)
            .unwrap();
        assert_eq!(entry.status, WatchStatus::Favorite);
        assert_eq!(db.get_media(media_id).unwrap().ratings_count, 99);
    }

    #[test]
    fn update_rating_requires_existing_entry() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        assert!(db.update_rating(alice, media_id, 5.0, None).unwrap_err().is_not_found());
        assert!(db
            .update_status(alice, media_id, WatchStatus::Watching)
            .unwrap_err()
            .is_not_found());
        assert!(db.remove_from_library(alice, media_id).unwrap_err().is_not_found());
    }

    #[test]
    fn update_rating_can_replace_comment() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        db.upsert_user_media(
            alice,
            media_id,
            &LibraryUpdate {
                personal_comment: Some(Some("first".into())),
                ..Default::default()
            },
        )
        .unwrap();

        let kept = db.update_rating(alice, media_id, 7.0, None).unwrap();
        assert_eq!(kept.personal_comment.as_deref(), Some("first"));

        let cleared = db.update_rating(alice, media_id, 7.0, Some(None)).unwrap();
        assert_eq!(cleared.personal_comment, None);

        assert_eq!(db.get_media(media_id).unwrap().avg_personal_rating, Some(7.0));
    }

    #[test]
    fn list_library_joins_media_and_orders_by_recency() {
        let (db, _dir, [alice, bob, _], media_id) = seeded();

        let mut other = crate::testutil::matrix();
        other.id = Some(604);
        other.title = "The Matrix Reloaded".into();
        let reloaded = db.upsert_media(&other).unwrap();

        db.upsert_user_media(alice, media_id, &LibraryUpdate::default())
            .unwrap();
        db.upsert_user_media(alice, reloaded.id, &LibraryUpdate::default())
            .unwrap();
        db.upsert_user_media(bob, media_id, &LibraryUpdate::default())
            .unwrap();

        let library = db.list_library(alice).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library[0].media.title, "The Matrix Reloaded");
        assert_eq!(library[1].media.external_id, 603);
        assert!(library.iter().all(|e| e.entry.user_id == alice));
    }
}
