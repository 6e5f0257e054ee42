//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors returned by API handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    DatabaseError(String),
    Internal(String),
}

impl From<floodmap_common::Error> for ApiError {
    fn from(err: floodmap_common::Error) -> Self {
        use floodmap_common::Error;

        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Database(e) => ApiError::DatabaseError(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not found: {}", msg)),
            ApiError::DatabaseError(msg) => {
                error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", msg))
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
