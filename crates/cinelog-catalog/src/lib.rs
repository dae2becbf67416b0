//! # cinelog-catalog
//!
//! Client for the TMDb v3 API.  Only two endpoints are consumed: title
//! details, which are normalized into a [`CatalogTitle`] ready for the store,
//! and search, which is returned to the caller without being persisted.
//!
//! [`CatalogTitle`]: cinelog_shared::CatalogTitle

pub mod client;
pub mod config;
pub mod mapping;

mod error;

pub use client::{CatalogClient, SearchKind};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use mapping::{SearchPage, SearchResult};
