// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints: login, refresh and revoke.
//!
//! Refresh and revoke read the refresh token from
//! `Authorization: Bearer <refresh_token>`, never from the body.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    auth::AuthError,
    error::AppJson,
    models::{LoginRequest, LoginResponse, RefreshResponse},
    state::AppState,
};

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Sessions",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Body is not valid JSON"),
        (status = 401, description = "Incorrect email or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let outcome = state
        .sessions
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        user: outcome.user.into(),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// Exchange a refresh token for a new access token.
#[utoipa::path(
    post,
    path = "/api/refresh",
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Refresh token missing, unknown, expired or revoked"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AuthError> {
    let token = state.sessions.refresh(&headers).await?;
    Ok(Json(RefreshResponse { token }))
}

/// Revoke a refresh token. Revoking twice is not an error.
#[utoipa::path(
    post,
    path = "/api/revoke",
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 401, description = "Refresh token missing or unknown"),
    )
)]
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    state.sessions.revoke(&headers).await?;
    Ok(StatusCode::NO_CONTENT)
}
