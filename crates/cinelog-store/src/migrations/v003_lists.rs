//! v003 -- Personal lists.
//!
//! A list belongs to one user and holds each title at most once.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS lists (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,             -- FK -> users(id)
    title       TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_lists_user_created ON lists(user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS list_items (
    list_id  INTEGER NOT NULL,                -- FK -> lists(id)
    media_id INTEGER NOT NULL,                -- FK -> media(id)
    added_at TEXT NOT NULL,

    PRIMARY KEY (list_id, media_id),
    FOREIGN KEY (list_id)  REFERENCES lists(id) ON DELETE CASCADE,
    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
