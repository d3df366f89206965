use super::handlers::{
    handle_analyze, handle_get_preferences, handle_health, handle_history, handle_memory,
    handle_method_not_allowed, handle_not_found, handle_put_preferences, handle_refine,
    handle_scenarios, handle_suggest,
};
use super::{AppState, MAX_BODY_SIZE};
use crate::error::AppError;
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, Method, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// The timeout layer answers with an empty 408; report it like any other error.
pub(crate) async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        AppError::RequestTimeout.into_response()
    } else {
        response
    }
}

/// Builds the router with every route and layer. Tests drive it in-process.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/api/analyze",
            post(handle_analyze).fallback(handle_method_not_allowed),
        )
        .route(
            "/api/suggest",
            post(handle_suggest).fallback(handle_method_not_allowed),
        )
        .route(
            "/api/refine",
            post(handle_refine).fallback(handle_method_not_allowed),
        )
        .route(
            "/api/memory",
            post(handle_memory).fallback(handle_method_not_allowed),
        )
        .route(
            "/api/scenarios",
            get(handle_scenarios).fallback(handle_method_not_allowed),
        )
        .route(
            "/api/preferences",
            get(handle_get_preferences)
                .put(handle_put_preferences)
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/api/history",
            get(handle_history).fallback(handle_method_not_allowed),
        )
        .route(
            "/health",
            get(handle_health).fallback(handle_method_not_allowed),
        )
        .fallback(handle_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(map_response(timeout_as_json))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
        .layer(cors_layer())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Serves the API on `bind_address` until Ctrl-C, then drains the interaction queue.
pub async fn run(bind_address: &str, state: AppState, request_timeout: Duration) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("bind API socket on {bind_address}"))?;
    let local_addr = listener.local_addr().context("get API listener local address")?;
    info!(address = %local_addr, "Calmly API listening");

    let recorder = state.recorder.clone();
    let app = build_app(state, request_timeout);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve HTTP API")?;

    recorder
        .flush()
        .await
        .context("drain interaction queue")?;
    recorder
        .shutdown()
        .await
        .context("stop interaction recorder")?;
    info!("Calmly API stopped");
    Ok(())
}
