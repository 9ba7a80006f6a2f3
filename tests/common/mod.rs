//! Shared utilities for integration tests.

use std::net::SocketAddr;

use request_bridge::config::LauncherConfig;
use request_bridge::http::{handler_fn, ApiError, Handler, HandlerError, LauncherServer};
use request_bridge::lifecycle::Shutdown;
use request_bridge::net::Listener;
use request_bridge::parsing::ParsedBody;
use request_bridge::EventStore;
use serde_json::json;

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: EventStore,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the routing test handler with `configure` applied to a default config.
pub async fn start_server(configure: impl FnOnce(&mut LauncherConfig)) -> TestServer {
    let mut config = LauncherConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.listener.drain_timeout_secs = 1;
    configure(&mut config);

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = EventStore::new();
    let shutdown = Shutdown::new();

    let server = LauncherServer::new(&config, store.clone(), test_handler());
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        store,
        shutdown,
    }
}

/// Dispatches on the request path.
pub fn test_handler() -> impl Handler {
    handler_fn(|req, res| {
        Box::pin(async move {
            match req.uri().path() {
                "/echo" => {
                    let body = match req.body()? {
                        Some(ParsedBody::Json(value)) => value.clone(),
                        Some(ParsedBody::Form(form)) => serde_json::to_value(form)?,
                        Some(ParsedBody::Text(text)) => json!(text),
                        Some(ParsedBody::Bytes(bytes)) => json!(bytes.len()),
                        None => serde_json::Value::Null,
                    };
                    res.json(&json!({
                        "body": body,
                        "query": req.query(),
                        "cookies": req.cookies(),
                        "bridge_header": req.headers().contains_key("x-now-bridge-request-id"),
                    }))?;
                }
                "/text" => res.send("hello world")?,
                "/empty" => {
                    res.status(axum::http::StatusCode::NO_CONTENT);
                    res.send("dropped")?;
                }
                "/not-modified" => {
                    res.status(axum::http::StatusCode::NOT_MODIFIED);
                    res.send("stale")?;
                }
                "/null" => res.send(serde_json::Value::Null)?,
                "/forbidden" => {
                    return Err(ApiError::new(axum::http::StatusCode::FORBIDDEN, "Nope").into());
                }
                "/fail" => return Err(HandlerError::unhandled("handler exploded")),
                _ => {
                    return Err(ApiError::new(axum::http::StatusCode::NOT_FOUND, "Not Found").into());
                }
            }
            Ok(())
        })
    })
}
