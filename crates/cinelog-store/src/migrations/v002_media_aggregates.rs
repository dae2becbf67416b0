use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Derived statistics, maintained by aggregate recomputation only
ALTER TABLE media ADD COLUMN avg_personal_rating REAL;
ALTER TABLE media ADD COLUMN ratings_count  INTEGER NOT NULL DEFAULT 0;
ALTER TABLE media ADD COLUMN comments_count INTEGER NOT NULL DEFAULT 0;
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
