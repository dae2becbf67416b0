use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cinelog_catalog::CatalogError;
use cinelog_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing or unknown x-user-id")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Catalog is not configured")]
    CatalogUnavailable,

    #[error("Catalog error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ServerError::NotFound(entity.to_string()),
            StoreError::Validation(msg) => ServerError::BadRequest(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingToken => ServerError::CatalogUnavailable,
            CatalogError::NotFound => ServerError::NotFound("title".to_string()),
            CatalogError::InvalidRequest(msg) => ServerError::BadRequest(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::CatalogUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ServerError::Upstream(_) => {
                tracing::warn!(error = %self, "catalog request failed");
                (StatusCode::BAD_GATEWAY, "Catalog request failed".to_string())
            }
            ServerError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_client_errors() {
        assert!(matches!(
            ServerError::from(StoreError::NotFound("media")),
            ServerError::NotFound(ref e) if e == "media"
        ));
        assert!(matches!(
            ServerError::from(StoreError::Validation("bad".into())),
            ServerError::BadRequest(_)
        ));
        assert!(matches!(
            ServerError::from(StoreError::NoDataDir),
            ServerError::Internal(_)
        ));
    }

    #[test]
    fn status_codes() {
        let cases = [
            (ServerError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServerError::CatalogUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (ServerError::from(CatalogError::Status(500)), StatusCode::BAD_GATEWAY),
            (ServerError::from(CatalogError::NotFound), StatusCode::NOT_FOUND),
            (ServerError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
