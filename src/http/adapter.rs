//! Per-request adaptation between the bridge and a user handler.
//!
//! # Data Flow
//! ```text
//! request head (Parts)
//!     → strip x-now-bridge-request-id
//!     → Bridge::consume_event (single use)
//!     → Request (lazy cookies / query / body) + Response
//!     → Handler::call
//!     → Ok              → response as the handler left it
//!     → Api(e)          → fresh bodiless response with e.status / e.message
//!     → Unhandled(e)    → AdapterError, the server aborts the connection
//! ```

use std::time::Instant;

use axum::http::request::Parts;

use crate::bridge::{Bridge, BridgeError, Event, RequestId, X_NOW_BRIDGE_REQUEST_ID};
use crate::http::error::{AdapterError, ApiError, HandlerError};
use crate::http::handler::Handler;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::observability::metrics;

/// Wraps a [`Handler`] with bridge lookup and error translation.
pub struct RequestAdapter<B, H> {
    bridge: B,
    handler: H,
}

impl<B: Bridge, H: Handler> RequestAdapter<B, H> {
    pub fn new(bridge: B, handler: H) -> Self {
        Self { bridge, handler }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Run the handler for one request.
    ///
    /// Only `ApiError`s are rendered. Every other handler failure is returned
    /// as `AdapterError` for the caller to treat as fatal.
    pub async fn handle(&self, mut parts: Parts) -> Result<Response, AdapterError> {
        let start = Instant::now();
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();

        let outcome = match self.open(&mut parts) {
            Ok((id, event)) => {
                tracing::debug!(
                    request_id = %id,
                    method = %method,
                    path = %path,
                    "Dispatching request"
                );

                let mut req = Request::new(id, parts, event.into_body());
                let mut res = Response::new(&method);
                self.handler
                    .call(&mut req, &mut res)
                    .await
                    .map(|()| res)
            }
            Err(e) => Err(HandlerError::Api(e)),
        };

        match outcome {
            Ok(res) => {
                metrics::record_request(res.status_code().as_u16(), start);
                Ok(res)
            }
            Err(HandlerError::Api(e)) => {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = e.status().as_u16(),
                    message = %e.message(),
                    "Request answered with API error"
                );
                metrics::record_api_error(e.status().as_u16());
                metrics::record_request(e.status().as_u16(), start);
                Ok(Response::from_api_error(&method, &e))
            }
            Err(HandlerError::Unhandled(e)) => {
                tracing::error!(method = %method, path = %path, error = %e, "Handler failed");
                metrics::record_unhandled_error();
                Err(AdapterError::Unhandled(e))
            }
        }
    }

    // Strips the id header and exchanges it for its event.
    fn open(&self, parts: &mut Parts) -> Result<(RequestId, Event), ApiError> {
        let id = parts
            .headers
            .remove(&X_NOW_BRIDGE_REQUEST_ID)
            .ok_or(BridgeError::MissingRequestId)
            .and_then(|value| {
                let raw = String::from_utf8_lossy(value.as_bytes());
                raw.parse::<RequestId>()
            })
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejecting request without a usable id");
                ApiError::internal("Invalid request id")
            })?;

        let event = self.bridge.consume_event(&id).map_err(|e| {
            tracing::warn!(request_id = %id, error = %e, "Bridge lookup failed");
            ApiError::internal("Unknown request id")
        })?;

        Ok((id, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::EventStore;
    use crate::http::handler::handler_fn;
    use crate::parsing::ParsedBody;
    use axum::http::{HeaderValue, Method, StatusCode};
    use std::sync::Arc;

    fn parts(id: Option<&str>, content_type: Option<&'static str>) -> Parts {
        let mut builder = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/submit?x=1")
            .header("x-keep", "1");
        if let Some(id) = id {
            builder = builder.header(&X_NOW_BRIDGE_REQUEST_ID, id);
        }
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn echo() -> impl Handler {
        handler_fn(|req, res| {
            Box::pin(async move {
                let leaked = req.headers().contains_key(&X_NOW_BRIDGE_REQUEST_ID);
                let body = req.body()?.and_then(ParsedBody::as_json).cloned();
                res.json(&serde_json::json!({ "leaked": leaked, "body": body }))?;
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn consumes_event_and_strips_header() {
        let store = EventStore::new();
        let id = store.stage(r#"{"n":1}"#);
        let adapter = RequestAdapter::new(store.clone(), echo());

        let res = adapter
            .handle(parts(Some(&id.to_string()), Some("application/json")))
            .await
            .unwrap();

        assert_eq!(res.status_code(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(value["leaked"], false);
        assert_eq!(value["body"]["n"], 1);
        assert_eq!(store.pending(), 0);
    }

    #[tokio::test]
    async fn missing_or_malformed_id_is_server_error() {
        let adapter = RequestAdapter::new(EventStore::new(), echo());

        for id in [None, Some("abc"), Some("-1"), Some("")] {
            let res = adapter.handle(parts(id, None)).await.unwrap();
            assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(res.status_message(), Some("Invalid request id"));
            assert!(res.body().is_empty());
        }
    }

    #[tokio::test]
    async fn reused_id_is_server_error() {
        let store = EventStore::new();
        let id = store.stage("");
        let adapter = RequestAdapter::new(store, echo());

        let first = adapter.handle(parts(Some(&id.to_string()), None)).await.unwrap();
        assert_eq!(first.status_code(), StatusCode::OK);

        let second = adapter.handle(parts(Some(&id.to_string()), None)).await.unwrap();
        assert_eq!(second.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(second.status_message(), Some("Unknown request id"));
    }

    #[tokio::test]
    async fn malformed_json_becomes_bad_request() {
        let store = EventStore::new();
        let id = store.stage("{not json");
        let adapter = RequestAdapter::new(store, echo());

        let res = adapter
            .handle(parts(Some(&id.to_string()), Some("application/json")))
            .await
            .unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(res.status_message(), Some("Invalid JSON"));
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[tokio::test]
    async fn api_error_replaces_partial_response() {
        let store = EventStore::new();
        let id = store.stage("");
        let handler = handler_fn(|_req, res| {
            Box::pin(async move {
                res.set_header(
                    axum::http::header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                );
                Err(ApiError::new(StatusCode::FORBIDDEN, "Nope").into())
            })
        });
        let adapter = RequestAdapter::new(store, handler);

        let res = adapter.handle(parts(Some(&id.to_string()), None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(res.status_message(), Some("Nope"));
        assert!(res.headers().is_empty());
    }

    #[tokio::test]
    async fn unhandled_errors_escape() {
        let store = EventStore::new();
        let id = store.stage("");
        let handler = handler_fn(|_req, _res| {
            Box::pin(async move { Err(HandlerError::unhandled("boom")) })
        });
        let adapter = RequestAdapter::new(store, handler);

        let err = adapter
            .handle(parts(Some(&id.to_string()), None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn unsent_response_is_returned_as_built() {
        let store = EventStore::new();
        let id = store.stage("");
        let handler = handler_fn(|_req, res| {
            Box::pin(async move {
                res.status(StatusCode::ACCEPTED);
                Ok(())
            })
        });
        let adapter = RequestAdapter::new(store, handler);

        let res = adapter.handle(parts(Some(&id.to_string()), None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
        assert!(!res.is_finished());
    }

    #[tokio::test]
    async fn concurrent_requests_are_isolated() {
        let store = EventStore::new();
        let handler = handler_fn(|req, res| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                let body = String::from_utf8_lossy(req.raw_body()).into_owned();
                let q = req.query().get("x").cloned();
                res.json(&serde_json::json!({ "body": body, "x": q }))?;
                Ok(())
            })
        });
        let adapter = Arc::new(RequestAdapter::new(store.clone(), handler));

        let mut tasks = Vec::new();
        for n in 0..32 {
            let id = store.stage(format!("payload-{n}"));
            let adapter = Arc::clone(&adapter);
            tasks.push(tokio::spawn(async move {
                let res = adapter.handle(parts(Some(&id.to_string()), None)).await.unwrap();
                let value: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
                (n, value)
            }));
        }

        for task in tasks {
            let (n, value) = task.await.unwrap();
            assert_eq!(value["body"], format!("payload-{n}"));
            assert_eq!(value["x"], "1");
        }
        assert_eq!(store.pending(), 0);
    }
}
