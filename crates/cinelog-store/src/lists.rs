//! CRUD operations for [`UserList`] records and their items.
//!
//! Lists are private: every operation is scoped to the owner, and a list that
//! belongs to someone else is reported as not found.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::columns::{now, parse_ts, ts_to_sql};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::media::{ensure_media_exists, row_to_summary, SUMMARY_COLUMNS};
use crate::models::{ListInput, MediaSummary, UserList};

const LIST_COLUMNS: &str = "id, user_id, title, description, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create an empty list.
    pub fn create_list(&self, user_id: i64, input: &ListInput) -> Result<UserList> {
        let (title, description) = validate_input(input)?;

        let at = ts_to_sql(&now());
        let id: i64 = self.conn().query_row(
            "INSERT INTO lists (user_id, title, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id",
            params![user_id, title, description, at],
            |row| row.get(0),
        )?;

        tracing::info!(list_id = id, user_id, "list created");
        self.get_list(user_id, id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// The user's lists, newest first.
    pub fn list_lists(&self, user_id: i64) -> Result<Vec<UserList>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {LIST_COLUMNS} FROM lists
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_list)?;

        let mut lists = Vec::new();
        for row in rows {
            let mut list = row?;
            list.items = fetch_items(self.conn(), list.id)?;
            lists.push(list);
        }
        Ok(lists)
    }

    /// Fetch one of the user's lists with its items.
    pub fn get_list(&self, user_id: i64, list_id: i64) -> Result<UserList> {
        let mut list = fetch_owned_list(self.conn(), user_id, list_id)?
            .ok_or(StoreError::NotFound("list"))?;
        list.items = fetch_items(self.conn(), list.id)?;
        Ok(list)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace the title and description of one of the user's lists.
    pub fn update_list(&self, user_id: i64, list_id: i64, input: &ListInput) -> Result<UserList> {
        let (title, description) = validate_input(input)?;

        let affected = self.conn().execute(
            "UPDATE lists SET title = ?1, description = ?2, updated_at = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![title, description, ts_to_sql(&now()), list_id, user_id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("list"));
        }

        tracing::debug!(list_id, user_id, "list updated");
        self.get_list(user_id, list_id)
    }

    /// Append a title to one of the user's lists.  A title already in the
    /// list is a validation error.
    pub fn add_list_item(&self, user_id: i64, list_id: i64, media_id: i64) -> Result<UserList> {
        let tx = self.write_tx()?;
        fetch_owned_list(&tx, user_id, list_id)?.ok_or(StoreError::NotFound("list"))?;
        ensure_media_exists(&tx, media_id)?;

        let at = ts_to_sql(&now());
        tx.execute(
            "INSERT INTO list_items (list_id, media_id, added_at) VALUES (?1, ?2, ?3)",
            params![list_id, media_id, at],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref f, _) if f.code == ErrorCode::ConstraintViolation => {
                StoreError::Validation("title is already in this list".into())
            }
            other => StoreError::Sqlite(other),
        })?;
        touch_list(&tx, list_id, &at)?;
        tx.commit()?;

        tracing::debug!(list_id, user_id, media_id, "list item added");
        self.get_list(user_id, list_id)
    }

    /// Remove a title from one of the user's lists.  Removing a title that is
    /// not in the list leaves it unchanged.
    pub fn remove_list_item(&self, user_id: i64, list_id: i64, media_id: i64) -> Result<UserList> {
        let tx = self.write_tx()?;
        fetch_owned_list(&tx, user_id, list_id)?.ok_or(StoreError::NotFound("list"))?;

        let removed = tx.execute(
            "DELETE FROM list_items WHERE list_id = ?1 AND media_id = ?2",
            params![list_id, media_id],
        )?;
        if removed > 0 {
            touch_list(&tx, list_id, &ts_to_sql(&now()))?;
        }
        tx.commit()?;

        tracing::debug!(list_id, user_id, media_id, removed, "list item removed");
        self.get_list(user_id, list_id)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete one of the user's lists together with its items.
    pub fn delete_list(&self, user_id: i64, list_id: i64) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM lists WHERE id = ?1 AND user_id = ?2",
            params![list_id, user_id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("list"));
        }

        tracing::info!(list_id, user_id, "list deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trimmed title (required) and description (blank becomes `None`).
fn validate_input(input: &ListInput) -> Result<(&str, Option<&str>)> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(StoreError::Validation("list title must not be blank".into()));
    }
    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    Ok((title, description))
}

fn touch_list(conn: &Connection, list_id: i64, at: &str) -> Result<()> {
    conn.execute(
        "UPDATE lists SET updated_at = ?1 WHERE id = ?2",
        params![at, list_id],
    )?;
    Ok(())
}

fn fetch_owned_list(conn: &Connection, user_id: i64, list_id: i64) -> Result<Option<UserList>> {
    Ok(conn
        .query_row(
            &format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ?1 AND user_id = ?2"),
            params![list_id, user_id],
            row_to_list,
        )
        .optional()?)
}

fn fetch_items(conn: &Connection, list_id: i64) -> Result<Vec<MediaSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS}
         FROM list_items li
         JOIN media m ON m.id = li.media_id
         WHERE li.list_id = ?1
         ORDER BY li.added_at ASC, li.rowid ASC"
    ))?;
    let rows = stmt.query_map(params![list_id], |row| row_to_summary(row, 0))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// Items are left empty; callers fill them from [`fetch_items`].
fn row_to_list(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserList> {
    let created: String = row.get(4)?;
    let updated: String = row.get(5)?;

    Ok(UserList {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        items: Vec::new(),
        created_at: parse_ts(4, &created)?,
        updated_at: parse_ts(5, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use cinelog_shared::MediaType;

    use crate::testutil::{matrix, seeded};
    use crate::{ListInput, StoreError};

    fn input(title: &str, description: Option<&str>) -> ListInput {
        ListInput {
            title: title.into(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn create_trims_and_starts_empty() {
        let (db, _dir, [alice, ..], _) = seeded();
        let list = db
            .create_list(alice, &input("  Weekend  ", Some("   ")))
            .unwrap();

        assert_eq!(list.title, "Weekend");
        assert_eq!(list.description, None);
        assert!(list.items.is_empty());
        assert_eq!(list.user_id, alice);
    }

    #[test]
    fn blank_title_is_rejected() {
        let (db, _dir, [alice, ..], _) = seeded();
        assert!(db.create_list(alice, &input("   ", None)).unwrap_err().is_validation());

        let list = db.create_list(alice, &input("Keep", None)).unwrap();
        assert!(db
            .update_list(alice, list.id, &input("", Some("x")))
            .unwrap_err()
            .is_validation());
        assert_eq!(db.get_list(alice, list.id).unwrap().title, "Keep");
    }

    #[test]
    fn items_keep_insertion_order_and_reject_duplicates() {
        let (db, _dir, [alice, ..], matrix_id) = seeded();
        let mut series = matrix();
        series.media_type = Some(MediaType::Series);
        series.title = "The Matrix (series)".into();
        let series_id = db.upsert_media(&series).unwrap().id;

        let list = db.create_list(alice, &input("Sci-fi", None)).unwrap();
        db.add_list_item(alice, list.id, matrix_id).unwrap();
        let list = db.add_list_item(alice, list.id, series_id).unwrap();

        let ids: Vec<_> = list.items.iter().map(|m| m.id).collect();
        assert_eq!(ids, [matrix_id, series_id]);
        assert_eq!(list.items[0].title, "The Matrix");

        assert!(db
            .add_list_item(alice, list.id, matrix_id)
            .unwrap_err()
            .is_validation());
        assert!(matches!(
            db.add_list_item(alice, list.id, 999),
            Err(StoreError::NotFound("media"))
        ));
        assert_eq!(db.get_list(alice, list.id).unwrap().items.len(), 2);
    }

    #[test]
    fn remove_item_is_idempotent() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        let list = db.create_list(alice, &input("Watch later", None)).unwrap();
        db.add_list_item(alice, list.id, media_id).unwrap();

        let list = db.remove_list_item(alice, list.id, media_id).unwrap();
        assert!(list.items.is_empty());
        let list = db.remove_list_item(alice, list.id, media_id).unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn update_replaces_title_and_description() {
        let (db, _dir, [alice, ..], _) = seeded();
        let list = db
            .create_list(alice, &input("Old", Some("first draft")))
            .unwrap();

        let updated = db.update_list(alice, list.id, &input("New", None)).unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, None);
        assert!(updated.updated_at >= list.updated_at);
    }

    #[test]
    fn other_users_lists_are_not_found() {
        let (db, _dir, [alice, bob, _], media_id) = seeded();
        let list = db.create_list(alice, &input("Mine", None)).unwrap();

        assert!(db.get_list(bob, list.id).unwrap_err().is_not_found());
        assert!(db.update_list(bob, list.id, &input("Ours", None)).unwrap_err().is_not_found());
        assert!(matches!(
            db.add_list_item(bob, list.id, media_id),
            Err(StoreError::NotFound("list"))
        ));
        assert!(db.remove_list_item(bob, list.id, media_id).unwrap_err().is_not_found());
        assert!(db.delete_list(bob, list.id).unwrap_err().is_not_found());
        assert!(db.list_lists(bob).unwrap().is_empty());

        assert_eq!(db.get_list(alice, list.id).unwrap().title, "Mine");
    }

    #[test]
    fn list_newest_first_and_delete_cascades_items() {
        let (db, _dir, [alice, ..], media_id) = seeded();
        let first = db.create_list(alice, &input("First", None)).unwrap();
        let second = db.create_list(alice, &input("Second", None)).unwrap();
        db.add_list_item(alice, first.id, media_id).unwrap();

        let lists = db.list_lists(alice).unwrap();
        let titles: Vec<_> = lists.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["Second", "First"]);
        assert_eq!(lists[1].items.len(), 1);

        db.delete_list(alice, first.id).unwrap();
        let items: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM list_items", [], |r| r.get(0))
            .unwrap();
        assert_eq!(items, 0);
        assert_eq!(db.list_lists(alice).unwrap()[0].id, second.id);
        assert!(db.get_list(alice, first.id).unwrap_err().is_not_found());
    }
}
