// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{Auth, AuthError},
    error::{ApiError, AppJson},
    models::{CreateUserRequest, UserResponse},
    state::AppState,
};

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Email or password missing, or body is not JSON"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    let user = state
        .sessions
        .register(&request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get the account behind the presented access token.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Token subject no longer exists"),
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = user.user_id;
    state
        .store
        .call("get_user_by_id", move |s| s.get_user_by_id(user_id))
        .await?
        .map(|stored| Json(stored.into()))
        .ok_or_else(|| ApiError::not_found("User not found"))
}
