// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin endpoints: visit metrics and the development reset.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::{
    auth::ServiceKey,
    config::Platform,
    error::ApiError,
    models::ResetResponse,
    state::AppState,
};

/// Number of requests served under `/app` since start or the last reset.
#[utoipa::path(
    get,
    path = "/admin/metrics",
    tag = "Admin",
    responses(
        (status = 200, description = "HTML page with the visit count", body = String, content_type = "text/html"),
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>\n",
        state.hits.get()
    ))
}

/// Zero the visit counter and delete every user, refresh token and chirp.
///
/// The counter is zeroed on every authorized call. Data is only wiped when
/// `PLATFORM=dev`. When `API_KEY` is configured the caller must also send
/// `Authorization: ApiKey <key>`.
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "Admin",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "All data removed", body = ResetResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Not a development deployment"),
    )
)]
pub async fn reset(_key: ServiceKey, State(state): State<AppState>) -> Response {
    state.hits.reset();

    if state.config.platform != Platform::Dev {
        tracing::warn!("Rejected reset outside dev platform");
        return ApiError::forbidden("Reset is only allowed in dev environment").into_response();
    }

    match state.sessions.reset().await {
        Ok(()) => Json(ResetResponse {
            message: "All users, refresh tokens and chirps deleted".to_string(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}
