use axum::{extract::State, Json};
use luno_types::{AuthResponse, CredentialsRequest, OkResponse};

use crate::state::AppState;

use super::{ApiResult, AuthUser};

/// POST /api/auth/register - Create an account and sign in
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, token) = state.accounts.register(&payload.username, &payload.password)?;
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login - Sign in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, token) = state.accounts.login(&payload.username, &payload.password)?;
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/logout - End the caller's session
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<OkResponse>> {
    state.accounts.logout(&auth.token)?;
    tracing::debug!(user_id = %auth.identity.id, "Logged out");
    Ok(Json(OkResponse::ok()))
}
