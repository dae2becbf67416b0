/// Application name
pub const APP_NAME: &str = "Cinelog";

/// Lowest accepted personal / comment rating
pub const MIN_RATING: f64 = 0.0;

/// Highest accepted personal / comment rating
pub const MAX_RATING: f64 = 10.0;

/// Gallery images kept per title when mapping catalog responses
pub const MAX_GALLERY_IMAGES: usize = 10;

/// Cast members kept per title when mapping catalog responses
pub const MAX_CAST_MEMBERS: usize = 8;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Header carrying the authenticated user id, set by the upstream authenticator
pub const USER_ID_HEADER: &str = "x-user-id";
