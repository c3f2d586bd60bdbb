//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use discovery::DiscoveryError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("authentication required")]
    Unauthorized,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Discovery(DiscoveryError::Validation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Discovery(DiscoveryError::ListingNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Discovery(DiscoveryError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            ApiError::Discovery(DiscoveryError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details stay in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
