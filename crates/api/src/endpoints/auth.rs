//! Account endpoints: signup, e-mail verification, login.

use agora_common::AppResult;
use agora_core::{LoginInput, SignupInput};
use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::users::MeResponse;
use crate::{middleware::AppState, response::ApiResponse};

/// Verify request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Resend-verification request.
#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: MeResponse,
}

/// Create an unverified account. The verification token goes to the notifier.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<MeResponse>> {
    let user = state.auth_service.signup(input).await?;
    Ok(ApiResponse::created(user.into()))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let session = state.auth_service.login(input).await?;
    Ok(ApiResponse::ok(LoginResponse {
        token: session.token,
        expires_in: session.expires_in,
        user: session.user.into(),
    }))
}

async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<ApiResponse<MeResponse>> {
    let user = state.auth_service.verify_email(&req.token).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<ResendRequest>,
) -> AppResult<ApiResponse<()>> {
    state.auth_service.resend_verification(&req.email).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/verify", post(verify))
        .route("/resend-verification", post(resend_verification))
}
