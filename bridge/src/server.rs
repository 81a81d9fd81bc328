// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Health and prometheus endpoints.

use axum::extract::State;
use axum::{http::StatusCode, routing::get, Router};
use prometheus::{Registry, TextEncoder};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const METRICS_PATH: &str = "/metrics";

pub fn run_metrics_server(
    socket_address: SocketAddr,
    registry: Registry,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(socket_address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("[Server] Cannot bind metrics server to {}: {}", socket_address, e);
                return;
            }
        };
        info!("[Server] Serving metrics on {}", socket_address);
        if let Err(e) = axum::serve(listener, make_router(registry).into_make_service())
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
        {
            error!("[Server] Metrics server stopped: {}", e);
        }
    })
}

pub(crate) fn make_router(registry: Registry) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route(METRICS_PATH, get(metrics))
        .with_state(registry)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(registry): State<Registry>) -> (StatusCode, String) {
    match TextEncoder::new().encode_to_string(&registry.gather()) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
