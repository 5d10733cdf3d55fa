use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::{required, AppState};
use crate::api::error::{ApiError, ApiResult};
use crate::auth::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::models::{normalize_email, AdvertiserResponse, LoginRequest, SignupRequest};
use crate::storage::StorageError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn signup_email(email: &str) -> ApiResult<String> {
    required(email, "email")?;
    normalize_email(email).ok_or_else(|| ApiError::bad_request("email is not a valid address"))
}

/// Register an advertiser account
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AdvertiserResponse>)> {
    let email = signup_email(&payload.email)?;
    let name = required(&payload.name, "name")?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = hash_password(&payload.password).await?;
    let advertiser = state
        .storage
        .create_advertiser(&email, &name, &hash)
        .await
        .map_err(|e| match e {
            StorageError::Conflict(_) => ApiError::Conflict("email is already registered".to_string()),
            other => other.into(),
        })?;

    tracing::info!(advertiser_id = advertiser.id, "Advertiser signed up");
    Ok((StatusCode::CREATED, Json(advertiser.into())))
}

/// Check credentials and answer the advertiser identity
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AdvertiserResponse>> {
    let email = payload.email.trim().to_lowercase();
    let Some(advertiser) = state.storage.get_advertiser_by_email(&email).await? else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(&payload.password, &advertiser.password_hash).await? {
        tracing::debug!(advertiser_id = advertiser.id, "Login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(advertiser.into()))
}
