//! HTTP server hosting a [`RequestAdapter`].
//!
//! # Responsibilities
//! - Accept connections from a bounded [`Listener`]
//! - Serve HTTP/1.1 per connection with hyper
//! - Stage inbound bodies in the [`EventStore`] when running standalone
//! - Stop accepting on shutdown and drain live connections
//!
//! # Design Decisions
//! - An `AdapterError` is returned from the hyper service, which aborts the
//!   connection instead of rendering a response
//! - Staging and consuming happen in the same future with no await in
//!   between, so an abandoned request never leaves a staged event behind
//! - In staging mode the id header always names the event staged for this
//!   request; a client-supplied id is dropped

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::sync::broadcast;

use crate::bridge::{EventStore, X_NOW_BRIDGE_REQUEST_ID};
use crate::config::{BridgeConfig, LauncherConfig};
use crate::http::adapter::RequestAdapter;
use crate::http::error::{AdapterError, ApiError};
use crate::http::handler::Handler;
use crate::http::response::Response;
use crate::net::{ConnectionTracker, Listener, ListenerError};

/// Serves a handler over HTTP/1.1.
pub struct LauncherServer<H> {
    adapter: Arc<RequestAdapter<EventStore, H>>,
    bridge_config: Arc<BridgeConfig>,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl<H: Handler> LauncherServer<H> {
    pub fn new(config: &LauncherConfig, store: EventStore, handler: H) -> Self {
        Self {
            adapter: Arc::new(RequestAdapter::new(store, handler)),
            bridge_config: Arc::new(config.bridge.clone()),
            tracker: ConnectionTracker::new(),
            drain_timeout: Duration::from_secs(config.listener.drain_timeout_secs),
        }
    }

    /// Event store backing the adapter.
    pub fn store(&self) -> &EventStore {
        self.adapter.bridge()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept and serve connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(
            address = %addr,
            stage_inbound = self.bridge_config.stage_inbound,
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr, permit)) => {
                            let guard = self.tracker.track();
                            let adapter = Arc::clone(&self.adapter);
                            let bridge_config = Arc::clone(&self.bridge_config);
                            let mut conn_shutdown = shutdown.resubscribe();

                            tokio::spawn(async move {
                                let _permit = permit;
                                let connection_id = guard.id();

                                let svc = service_fn(move |req| {
                                    serve_request(Arc::clone(&adapter), Arc::clone(&bridge_config), peer_addr, req)
                                });
                                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), svc);
                                tokio::pin!(conn);

                                let result = tokio::select! {
                                    result = conn.as_mut() => result,
                                    _ = conn_shutdown.recv() => {
                                        conn.as_mut().graceful_shutdown();
                                        conn.as_mut().await
                                    }
                                };

                                if let Err(e) = result {
                                    tracing::warn!(
                                        connection_id = %connection_id,
                                        peer_addr = %peer_addr,
                                        error = %e,
                                        "Connection aborted"
                                    );
                                }
                                drop(guard);
                            });
                        }
                        Err(ListenerError::Closed) => break,
                        Err(e) => tracing::warn!(error = %e, "Accept failed"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        drop(listener);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Draining connections"
        );
        if tokio::time::timeout(self.drain_timeout, self.tracker.drained())
            .await
            .is_err()
        {
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                "Drain timeout elapsed"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn serve_request<H: Handler>(
    adapter: Arc<RequestAdapter<EventStore, H>>,
    bridge_config: Arc<BridgeConfig>,
    peer_addr: SocketAddr,
    req: axum::http::Request<Incoming>,
) -> Result<axum::http::Response<Full<Bytes>>, AdapterError> {
    let (mut parts, body) = req.into_parts();

    if bridge_config.stage_inbound {
        if parts.headers.remove(&X_NOW_BRIDGE_REQUEST_ID).is_some() {
            tracing::debug!(peer_addr = %peer_addr, "Discarding client-supplied bridge request id");
        }

        let raw = match Limited::new(body, bridge_config.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::info!(
                    peer_addr = %peer_addr,
                    limit = bridge_config.max_body_size,
                    "Request body too large"
                );
                let err = ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
                return Ok(Response::from_api_error(&parts.method, &err).into_http());
            }
            Err(e) => {
                tracing::warn!(peer_addr = %peer_addr, error = %e, "Failed to read request body");
                return Err(AdapterError::Unhandled(e));
            }
        };

        let id = adapter.bridge().stage(raw);
        parts
            .headers
            .insert(X_NOW_BRIDGE_REQUEST_ID.clone(), HeaderValue::from(id.as_u64()));
        // `handle` consumes the event before its first await.
    }

    let res = adapter.handle(parts).await?;
    Ok(res.into_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::handler_fn;
    use crate::lifecycle::Shutdown;

    #[tokio::test]
    async fn serves_and_shuts_down() {
        let mut config = LauncherConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();

        let listener = Listener::bind(&config.listener).await.unwrap();
        let handler = handler_fn(|_req, res| {
            Box::pin(async move {
                res.send("ok")?;
                Ok(())
            })
        });
        let server = LauncherServer::new(&config, EventStore::new(), handler);
        let tracker = server.tracker().clone();

        let shutdown = Shutdown::new();
        let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(tracker.active_count(), 0);
    }
}
