//! # cinelog-store
//!
//! Relational storage for Cinelog, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed operations for every domain
//! model: catalog upsert of [`Media`] rows, the user's library
//! ([`UserMedia`]), personal [`UserList`]s, [`Comment`]s, and recomputation
//! of the derived rating / comment statistics kept on each media row.

pub mod aggregates;
pub mod comments;
pub mod database;
pub mod library;
pub mod lists;
pub mod media;
pub mod migrations;
pub mod models;
pub mod users;

mod columns;
mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;

#[cfg(test)]
pub(crate) mod testutil {
    use cinelog_shared::{CastMember, CatalogRating, CatalogTitle, MediaType};
    use tempfile::TempDir;

    use crate::database::Database;

    pub fn open_temp() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("cinelog.db")).unwrap();
        (db, dir)
    }

    pub fn matrix() -> CatalogTitle {
        CatalogTitle {
            id: Some(603),
            media_type: Some(MediaType::Movie),
            title: "The Matrix".into(),
            overview: Some("A hacker learns the truth.".into()),
            year: Some(1999),
            runtime: Some(136),
            genres: vec!["Action".into(), "Science Fiction".into()],
            rating: CatalogRating {
                vote_average: Some(8.2),
                vote_count: Some(25_000),
            },
            trailer: Some("https://www.youtube.com/watch?v=vKQi3bBA1y8".into()),
            poster: Some("https://image.tmdb.org/t/p/w500/poster.jpg".into()),
            backdrop: Some("https://image.tmdb.org/t/p/w780/backdrop.jpg".into()),
            images: vec!["https://image.tmdb.org/t/p/w780/a.jpg".into()],
            cast: vec![CastMember {
                id: 6384,
                name: "Keanu Reeves".into(),
                character: Some("Neo".into()),
                profile: None,
            }],
            external_ids: [("imdb_id".to_string(), serde_json::json!("tt0133093"))]
                .into_iter()
                .collect(),
        }
    }

    /// Three users and the 603/movie title.
    pub fn seeded() -> (Database, TempDir, [i64; 3], i64) {
        let (db, dir) = open_temp();
        let alice = db.create_user("alice").unwrap().id;
        let bob = db.create_user("bob").unwrap().id;
        let carol = db.create_user("carol").unwrap().id;
        let media = db.upsert_media(&matrix()).unwrap();
        (db, dir, [alice, bob, carol], media.id)
    }
}
