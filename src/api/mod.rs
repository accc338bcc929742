// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{debug_span, Span};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    metrics::count_hits,
    models::{
        ChirpResponse, CreateChirpRequest, CreateUserRequest, LoginRequest, LoginResponse,
        RefreshResponse, ResetResponse, UserResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod chirps;
pub mod health;
pub mod sessions;
pub mod users;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/users", post(users::create_user))
        .route("/users/me", get(users::get_current_user))
        .route("/login", post(sessions::login))
        .route("/refresh", post(sessions::refresh))
        .route("/revoke", post(sessions::revoke))
        .route("/chirps", post(chirps::create_chirp).get(chirps::list_chirps))
        .route(
            "/chirps/{chirp_id}",
            get(chirps::get_chirp).delete(chirps::delete_chirp),
        );

    let admin_routes = Router::new()
        .route("/metrics", get(admin::metrics))
        .route("/reset", post(admin::reset));

    // Static files; every request here counts as a visit
    let app_files = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(state.hits.clone(), count_hits))
        .service(ServeDir::new(&state.config.static_dir));

    Router::new()
        .nest("/api", api_routes)
        .nest("/admin", admin_routes)
        .with_state(state)
        .nest_service("/app", app_files)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive()),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    // Headers are left out: they carry credentials.
    debug_span!(
        "http-request",
        method = %request.method(),
        path = request.uri().path(),
        request_id
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        users::create_user,
        users::get_current_user,
        sessions::login,
        sessions::refresh,
        sessions::revoke,
        chirps::create_chirp,
        chirps::list_chirps,
        chirps::get_chirp,
        chirps::delete_chirp,
        admin::metrics,
        admin::reset
    ),
    components(
        schemas(
            CreateUserRequest,
            LoginRequest,
            UserResponse,
            LoginResponse,
            RefreshResponse,
            ResetResponse,
            CreateChirpRequest,
            ChirpResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Users", description = "Account registration and identity"),
        (name = "Sessions", description = "Login, token refresh and revocation"),
        (name = "Chirps", description = "Posting, reading and deleting chirps"),
        (name = "Admin", description = "Visit metrics and development tooling")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}
