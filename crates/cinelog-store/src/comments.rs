//! CRUD operations for [`Comment`] records.
//!
//! A comment may carry its own rating.  When it does, the rating is also
//! written to the author's library entry for the title (created with status
//! `watched` if missing) in the same transaction, so the latest rated comment
//! always wins over earlier ones.

use rusqlite::{params, Connection, OptionalExtension};

use crate::columns::{now, parse_ts, ts_to_sql};
use crate::database::Database;
use crate::error::{or_not_found, Result, StoreError};
use crate::library::{mirror_rating, validate_rating};
use crate::media::ensure_media_exists;
use crate::models::{Comment, CommentUpdate};

const COMMENT_COLUMNS: &str = "id, user_id, media_id, text, rating, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Post a comment on a title.
    pub fn create_comment(
        &self,
        user_id: i64,
        media_id: i64,
        text: &str,
        rating: Option<f64>,
    ) -> Result<Comment> {
        let text = validate_text(text)?;
        if let Some(rating) = rating {
            validate_rating(rating)?;
        }

        let tx = self.write_tx()?;
        ensure_media_exists(&tx, media_id)?;

        let at = now();
        let id: i64 = tx.query_row(
            "INSERT INTO comments (user_id, media_id, text, rating, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING id",
            params![user_id, media_id, text, rating, ts_to_sql(&at)],
            |row| row.get(0),
        )?;

        if let Some(rating) = rating {
            mirror_rating(&tx, user_id, media_id, rating, &at)?;
        }

        let comment = fetch_comment(&tx, id)?;
        tx.commit()?;

        tracing::info!(comment_id = id, user_id, media_id, rated = rating.is_some(), "comment created");

        self.refresh_after_mutation(media_id);
        Ok(comment)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single comment by id.
    pub fn get_comment(&self, id: i64) -> Result<Comment> {
        fetch_comment(self.conn(), id)
    }

    /// All comments on a title, newest first.
    pub fn list_comments(&self, media_id: i64) -> Result<Vec<Comment>> {
        ensure_media_exists(self.conn(), media_id)?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE media_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![media_id], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Edit one of the user's own comments.
    ///
    /// Comments owned by someone else are reported as not found.  Aggregates
    /// are recomputed only when the update carries a `rating` field.
    pub fn update_comment(
        &self,
        user_id: i64,
        comment_id: i64,
        update: &CommentUpdate,
    ) -> Result<Comment> {
        let text = update.text.as_deref().map(validate_text).transpose()?;
        if let Some(Some(rating)) = update.rating {
            validate_rating(rating)?;
        }

        let tx = self.write_tx()?;
        let existing = fetch_owned_comment(&tx, user_id, comment_id)?
            .ok_or(StoreError::NotFound("comment"))?;

        let at = now();
        let text = text.unwrap_or(existing.text.as_str());
        let rating = update.rating.unwrap_or(existing.rating);

        tx.execute(
            "UPDATE comments SET text = ?1, rating = ?2, updated_at = ?3 WHERE id = ?4",
            params![text, rating, ts_to_sql(&at), comment_id],
        )?;

        if let Some(Some(rating)) = update.rating {
            mirror_rating(&tx, user_id, existing.media_id, rating, &at)?;
        }

        let comment = fetch_comment(&tx, comment_id)?;
        tx.commit()?;

        tracing::debug!(comment_id, user_id, media_id = existing.media_id, "comment updated");

        if update.rating.is_some() {
            self.refresh_after_mutation(existing.media_id);
        }
        Ok(comment)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete one of the user's own comments.  A rating it mirrored into the
    /// library stays in place.
    pub fn delete_comment(&self, user_id: i64, comment_id: i64) -> Result<()> {
        let media_id: i64 = self
            .conn()
            .query_row(
                "DELETE FROM comments WHERE id = ?1 AND user_id = ?2 RETURNING media_id",
                params![comment_id, user_id],
                |row| row.get(0),
            )
            .map_err(or_not_found("comment"))?;

        tracing::info!(comment_id, user_id, media_id, "comment deleted");

        self.refresh_after_mutation(media_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("comment text must not be blank".into()));
    }
    Ok(trimmed)
}

fn fetch_comment(conn: &Connection, id: i64) -> Result<Comment> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
        params![id],
        row_to_comment,
    )
    .map_err(or_not_found("comment"))
}

fn fetch_owned_comment(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Comment>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            row_to_comment,
        )
        .optional()?)
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;

    Ok(Comment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        media_id: row.get(2)?,
        text: row.get(3)?,
        rating: row.get(4)?,
        created_at: parse_ts(5, &created)?,
        updated_at: parse_ts(6, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use cinelog_shared::WatchStatus;

    use crate::testutil::seeded;
    use crate::{CommentUpdate, LibraryUpdate, StoreError};

    #[test]
    fn unrated_comment_counts_but_does_not_rate() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        let comment = db
            .create_comment(alice, media_id, "  Great bullet time.  ", None)
            .unwrap();
        assert_eq!(comment.text, "Great bullet time.");

        let media = db.get_media(media_id).unwrap();
        assert_eq!(media.comments_count, 1);
        assert_eq!(media.ratings_count, 0);
        assert!(db.get_user_media(alice, media_id).unwrap_err().is_not_found());
    }

    #[test]
    fn rated_comment_overwrites_existing_rating_but_keeps_status() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        db.upsert_user_media(
            alice,
            media_id,
            &LibraryUpdate {
                status: Some(WatchStatus::Favorite),
                personal_rating: Some(Some(4.0)),
                ..Default::default()
            },
        )
        .unwrap();

        db.create_comment(alice, media_id, "Changed my mind.", Some(9.0))
            .unwrap();

        let entry = db.get_user_media(alice, media_id).unwrap();
        assert_eq!(entry.personal_rating, Some(9.0));
        assert_eq!(entry.status, WatchStatus::Favorite);
        assert_eq!(db.get_media(media_id).unwrap().avg_personal_rating, Some(9.0));
    }

    #[test]
    fn latest_rated_comment_wins() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        let first = db.create_comment(alice, media_id, "First", Some(3.0)).unwrap();
        db.create_comment(alice, media_id, "Second", Some(7.0)).unwrap();

        assert_eq!(db.get_comment(first.id).unwrap().rating, Some(3.0));
        assert_eq!(
            db.get_user_media(alice, media_id).unwrap().personal_rating,
            Some(7.0)
        );

        let media = db.get_media(media_id).unwrap();
        assert_eq!(media.ratings_count, 1);
        assert_eq!(media.comments_count, 2);
    }

    #[test]
    fn updating_rating_mirrors_and_clearing_does_not() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        let comment = db.create_comment(alice, media_id, "Hmm", None).unwrap();

        let updated = db
            .update_comment(
                alice,
                comment.id,
                &CommentUpdate {
                    text: None,
                    rating: Some(Some(6.0)),
                },
            )
            .unwrap();
        assert_eq!(updated.text, "Hmm");
        assert_eq!(updated.rating, Some(6.0));
        assert_eq!(
            db.get_user_media(alice, media_id).unwrap().personal_rating,
            Some(6.0)
        );

        let cleared = db
            .update_comment(
                alice,
                comment.id,
                &CommentUpdate {
                    text: Some("Meh".into()),
                    rating: Some(None),
                },
            )
            .unwrap();
        assert_eq!(cleared.rating, None);
        assert_eq!(cleared.text, "Meh");
        assert_eq!(
            db.get_user_media(alice, media_id).unwrap().personal_rating,
            Some(6.0)
        );
    }

    #[test]
    fn other_users_comments_are_not_found() {
        let (db, _dir, [alice, bob, _], media_id) = seeded();
        let comment = db.create_comment(alice, media_id, "Mine", None).unwrap();

        let err = db
            .update_comment(
                bob,
                comment.id,
                &CommentUpdate {
                    text: Some("Yours now".into()),
                    rating: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("comment")));
        assert!(db.delete_comment(bob, comment.id).unwrap_err().is_not_found());
        assert_eq!(db.get_comment(comment.id).unwrap().text, "Mine");
    }

    #[test]
    fn validation() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        assert!(db.create_comment(alice, media_id, "   ", None).unwrap_err().is_validation());
        assert!(db
            .create_comment(alice, media_id, "ok", Some(10.5))
            .unwrap_err()
            .is_validation());
        assert!(db.create_comment(alice, media_id, "ok", Some(10.0)).is_ok());
        assert!(db.create_comment(alice, media_id, "ok", Some(0.0)).is_ok());
        assert!(matches!(
            db.create_comment(alice, 777, "ok", None),
            Err(StoreError::NotFound("media"))
        ));
        assert_eq!(db.get_media(media_id).unwrap().comments_count, 2);
    }

    #[test]
    fn list_is_newest_first() {
        let (db, _dir, [alice, bob, _], media_id) = seeded();
        db.create_comment(alice, media_id, "one", None).unwrap();
        db.create_comment(bob, media_id, "two", None).unwrap();

        let comments = db.list_comments(media_id).unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["two", "one"]);
        assert!(db.list_comments(555).unwrap_err().is_not_found());
    }
}
