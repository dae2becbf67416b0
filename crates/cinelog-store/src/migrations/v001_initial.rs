//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `media`, `user_media` and
//! `comments`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    username   TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Media (one catalog title)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS media (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id    INTEGER NOT NULL,          -- catalog id
    media_type     TEXT NOT NULL CHECK (media_type IN ('movie', 'series')),
    title          TEXT NOT NULL,
    overview       TEXT,
    year           INTEGER,
    runtime        INTEGER,                   -- minutes
    genres         TEXT NOT NULL DEFAULT '[]',   -- JSON array of names
    vote_average   REAL,
    vote_count     INTEGER,
    trailer_url    TEXT,
    poster_url     TEXT,
    backdrop_url   TEXT,
    gallery        TEXT NOT NULL DEFAULT '[]',   -- JSON array of URLs
    cast_members   TEXT NOT NULL DEFAULT '[]',   -- JSON array of cast objects
    external_ids   TEXT NOT NULL DEFAULT '{}',   -- JSON object
    last_synced_at TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,

    UNIQUE (external_id, media_type)
);

-- ----------------------------------------------------------------
-- UserMedia (library entries)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_media (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          INTEGER NOT NULL,        -- FK -> users(id)
    media_id         INTEGER NOT NULL,        -- FK -> media(id)
    status           TEXT NOT NULL DEFAULT 'to_watch'
                     CHECK (status IN ('to_watch', 'watching', 'watched', 'favorite')),
    personal_rating  REAL CHECK (personal_rating IS NULL OR personal_rating BETWEEN 0 AND 10),
    personal_comment TEXT,
    watched_at       TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,

    UNIQUE (user_id, media_id),
    FOREIGN KEY (user_id)  REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_user_media_media  ON user_media(media_id);
CREATE INDEX IF NOT EXISTS idx_user_media_status ON user_media(status);
CREATE INDEX IF NOT EXISTS idx_user_media_user_updated
    ON user_media(user_id, updated_at DESC);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL,              -- FK -> users(id)
    media_id   INTEGER NOT NULL,              -- FK -> media(id)
    text       TEXT NOT NULL,
    rating     REAL CHECK (rating IS NULL OR rating BETWEEN 0 AND 10),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (user_id)  REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_user ON comments(user_id);
CREATE INDEX IF NOT EXISTS idx_comments_media_created
    ON comments(media_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
