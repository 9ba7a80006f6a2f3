//! Admin API.
//!
//! # Endpoints
//! - `GET /status`: version, status and pending bridge events
//! - `GET /health`: liveness check

pub mod handlers;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use self::handlers::{get_health, get_status};
use crate::bridge::EventStore;

pub fn setup_admin_router(store: EventStore) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Serve the admin router until `shutdown` completes.
pub async fn serve_admin<F>(
    addr: SocketAddr,
    store: EventStore,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_reports_pending_events() {
        let store = EventStore::new();
        store.stage("queued");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, setup_admin_router(store)).await.unwrap();
        });

        let client = reqwest::Client::new();
        let status: serde_json::Value = client
            .get(format!("http://{addr}/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["pending_events"], 1);
        assert_eq!(status["status"], "operational");

        let health = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(health, "ok");
    }
}
