//! # cinelog-shared
//!
//! Types shared by every Cinelog crate: the normalized catalog DTO produced by
//! the catalog client and consumed by the store, the media / watch-status
//! enums, and the numeric limits both sides agree on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::SharedError;
pub use types::*;
