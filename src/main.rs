// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use chirpy_server::{
    api::router,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    // Configuration errors are fatal: the server must not start without a signing secret
    let config = AppConfig::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    let addr = config.bind_address();
    tracing::info!(
        database = %config.database_path.display(),
        static_dir = %config.static_dir.display(),
        platform = ?config.platform,
        "Opening database"
    );

    let state = AppState::open(config).expect("Failed to open database");
    let app = router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Chirpy server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}
