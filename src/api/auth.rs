use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, AppJson, AppState};
use crate::auth::{verify_password, Identity};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::BadRequest("email and password are required".to_string()));
    };

    let Some(user) = state.db.find_user_by_email(&email)? else {
        tracing::warn!(email = %email, "login for unknown user");
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    };

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !matches {
        tracing::warn!(email = %email, "login with wrong password");
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let identity = Identity::from(&user);
    let token = state.tokens.issue(&identity)?;
    tracing::info!(user = %identity.email, "user logged in");

    Ok(Json(LoginResponse {
        token,
        user: identity,
    }))
}

pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}
