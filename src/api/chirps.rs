// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chirp endpoints. Posting and deleting need an access token; reading is
//! public.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::Auth,
    error::{ApiError, AppJson},
    models::{ChirpResponse, CreateChirpRequest, ListChirpsQuery},
    state::AppState,
    storage::{Chirp, DeleteChirpOutcome},
};

/// Longest accepted chirp, in characters.
pub const MAX_CHIRP_LENGTH: usize = 140;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {what}")))
}

/// Post a chirp as the user behind the access token.
#[utoipa::path(
    post,
    path = "/api/chirps",
    tag = "Chirps",
    security(("bearer" = [])),
    request_body = CreateChirpRequest,
    responses(
        (status = 201, description = "Chirp created", body = ChirpResponse),
        (status = 400, description = "Body empty or longer than 140 characters"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn create_chirp(
    Auth(user): Auth,
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateChirpRequest>,
) -> Result<(StatusCode, Json<ChirpResponse>), ApiError> {
    if request.body.is_empty() {
        return Err(ApiError::bad_request("Chirp body is required"));
    }
    if request.body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::bad_request("Chirp is too long"));
    }

    let chirp = Chirp::new(request.body, user.user_id);
    let row = chirp.clone();
    state
        .store
        .call("create_chirp", move |s| s.create_chirp(&row))
        .await?;

    tracing::info!(chirp_id = %chirp.id, user_id = %user.user_id, "Chirp created");
    Ok((StatusCode::CREATED, Json(chirp.into())))
}

/// List chirps, oldest first.
#[utoipa::path(
    get,
    path = "/api/chirps",
    tag = "Chirps",
    params(ListChirpsQuery),
    responses(
        (status = 200, description = "Chirps", body = [ChirpResponse]),
        (status = 400, description = "author_id is not a UUID"),
    )
)]
pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<ChirpResponse>>, ApiError> {
    let author = match query.author_id.as_deref() {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "author_id")?),
        _ => None,
    };

    let chirps = state
        .store
        .call("list_chirps", move |s| s.list_chirps(author))
        .await?;
    Ok(Json(chirps.into_iter().map(Into::into).collect()))
}

/// Fetch one chirp.
#[utoipa::path(
    get,
    path = "/api/chirps/{chirp_id}",
    tag = "Chirps",
    params(("chirp_id" = String, Path, description = "Chirp UUID")),
    responses(
        (status = 200, description = "Chirp", body = ChirpResponse),
        (status = 400, description = "chirp_id is not a UUID"),
        (status = 404, description = "No such chirp"),
    )
)]
pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<Json<ChirpResponse>, ApiError> {
    let id = parse_id(&chirp_id, "chirp_id")?;
    state
        .store
        .call("get_chirp", move |s| s.get_chirp(id))
        .await?
        .map(|chirp| Json(chirp.into()))
        .ok_or_else(|| ApiError::not_found("Chirp not found"))
}

/// Delete a chirp. Only its author may do this.
#[utoipa::path(
    delete,
    path = "/api/chirps/{chirp_id}",
    tag = "Chirps",
    security(("bearer" = [])),
    params(("chirp_id" = String, Path, description = "Chirp UUID")),
    responses(
        (status = 204, description = "Chirp deleted"),
        (status = 400, description = "chirp_id is not a UUID"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "No such chirp"),
    )
)]
pub async fn delete_chirp(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&chirp_id, "chirp_id")?;
    let user_id = user.user_id;
    let outcome = state
        .store
        .call("delete_chirp", move |s| s.delete_chirp(id, user_id))
        .await?;

    match outcome {
        DeleteChirpOutcome::Deleted => {
            tracing::info!(chirp_id = %id, user_id = %user_id, "Chirp deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteChirpOutcome::NotFound => Err(ApiError::not_found("Chirp not found")),
        DeleteChirpOutcome::NotAuthor => {
            tracing::warn!(chirp_id = %id, user_id = %user_id, "Delete by non-author rejected");
            Err(ApiError::forbidden("Only the author can delete a chirp"))
        }
    }
}
