use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::RegistryError;
use crate::seed::SeedError;
use crate::stats::StatsError;
use crate::storage::StorageError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Error type returned by every management handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    /// Missing, inactive and foreign resources all look the same
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(message) => ApiError::Conflict(message),
            StorageError::SlugTaken => ApiError::Conflict(err.to_string()),
            StorageError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(what) => ApiError::not_found(what),
            RegistryError::OwnerMismatch | RegistryError::InvalidUrl => {
                ApiError::BadRequest(err.to_string())
            }
            RegistryError::Conflict(message) => ApiError::Conflict(message),
            RegistryError::SlugExhausted(_) => ApiError::Internal(anyhow::anyhow!(err.to_string())),
            RegistryError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::CampaignNotFound => ApiError::not_found("campaign"),
            StatsError::Range(e) => ApiError::BadRequest(e.to_string()),
            StatsError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl From<SeedError> for ApiError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Invalid(message) => ApiError::BadRequest(message),
            SeedError::Storage(e) => ApiError::Internal(e),
        }
    }
}
