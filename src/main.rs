// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::engine::TelemetryEngine;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::series_cache::SeriesCache;
use crate::infrastructure::archive_repository::HttpArchiveRepository;
use crate::infrastructure::config::{load_archive_config, load_groups_config};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    active_series, classify, health_check, list_groups, plot_data, recent_events, refresh_now,
    set_threshold, set_window, summary, toggle_group, toggle_series,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load configuration
    let archive_config = load_archive_config()?;
    let groups_config = Arc::new(load_groups_config()?);

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpArchiveRepository::new(
        archive_config.archive.host,
        archive_config.archive.token,
        archive_config.archive.database,
    ));

    // Create engine (application layer)
    let cache = Arc::new(SeriesCache::new(repository, groups_config.clone()));
    let engine = Arc::new(TelemetryEngine::new(groups_config.clone(), cache));

    // Background refresh of active groups
    let scheduler = RefreshScheduler::spawn(
        engine.clone(),
        Duration::from_secs(groups_config.refresh_secs),
    );

    let state = Arc::new(AppState { engine });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/groups", get(list_groups))
        .route("/series/active", get(active_series))
        .route("/select/group/:group", post(toggle_group))
        .route("/select/series/:group/:series", post(toggle_series))
        .route("/window", post(set_window))
        .route("/thresholds/:group/:series", post(set_threshold))
        .route("/plot/:group/:series", get(plot_data))
        .route("/summary/:group/:series", get(summary))
        .route("/classify/:group/:series", get(classify))
        .route("/refresh", post(refresh_now))
        .route("/events", get(recent_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    tracing::info!("starting vlbi-telemetry service on {addr}");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Stop scheduling further reloads; an in-flight reload finishes and
    // swaps its snapshot in before we exit.
    scheduler.shutdown().await;

    Ok(())
}
