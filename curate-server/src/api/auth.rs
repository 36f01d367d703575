//! Login, logout, and the session middleware
//!
//! Clients log in with a username and password and receive a token, sent
//! back as `Authorization: Bearer <token>` on every protected request.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use curate_common::summary::validate_summary_field;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::ApiError;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub username: String,
}

/// POST /api/login
///
/// Invalid credentials give 401 and no session. A username that cannot be
/// written to the summary file gives 400.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = request.username.trim();
    validate_summary_field(username, "Username")?;
    if !state.authenticator.authenticate(username, &request.password) {
        warn!("Rejected login for '{}'", username);
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let session = state.sessions.create(username).await;
    info!("'{}' logged in", session.username);

    Ok(Json(LoginResponse {
        token: session.token,
        username: session.username.clone(),
    }))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
) -> StatusCode {
    state.sessions.remove(&session.token).await;
    StatusCode::NO_CONTENT
}

/// Session middleware
///
/// Resolves the bearer token to a session and hands it to the handler as an
/// `Extension<Arc<Session>>`. Missing or unknown tokens get 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing or malformed bearer token".to_string()))?;

    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Unknown or expired session".to_string()))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}
