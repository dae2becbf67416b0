//! CRUD operations for [`User`] records.

use rusqlite::{params, ErrorCode};

use crate::columns::{now, parse_ts, ts_to_sql};
use crate::database::Database;
use crate::error::{or_not_found, Result, StoreError};
use crate::models::User;

impl Database {
    /// Register a new user.  Usernames are trimmed and must be unique.
    pub fn create_user(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::Validation("username must not be blank".into()));
        }

        let created_at = now();
        let id: i64 = self
            .conn()
            .query_row(
                "INSERT INTO users (username, created_at) VALUES (?1, ?2) RETURNING id",
                params![username, ts_to_sql(&created_at)],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref f, _)
                    if f.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::Validation(format!("username '{username}' is already taken"))
                }
                other => StoreError::Sqlite(other),
            })?;

        tracing::info!(user_id = id, username, "user created");

        self.get_user(id)
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .map_err(or_not_found("user"))
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created: String = row.get(2)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: parse_ts(2, &created)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testutil::open_temp;
    use crate::StoreError;

    #[test]
    fn create_and_fetch() {
        let (db, _dir) = open_temp();
        let user = db.create_user("  alice ").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(db.get_user(user.id).unwrap(), user);
    }

    #[test]
    fn duplicate_username_is_validation_error() {
        let (db, _dir) = open_temp();
        db.create_user("alice").unwrap();
        let err = db.create_user("alice").unwrap_err();
        assert!(err.is_validation(), "got {err:?}");
    }

    #[test]
    fn blank_username_rejected() {
        let (db, _dir) = open_temp();
        assert!(db.create_user("   ").unwrap_err().is_validation());
    }

    #[test]
    fn missing_user_is_not_found() {
        let (db, _dir) = open_temp();
        assert!(matches!(db.get_user(42), Err(StoreError::NotFound("user"))));
    }
}
