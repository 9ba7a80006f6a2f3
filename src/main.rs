//! request-bridge launcher
//!
//! Runs the request adapter standalone: inbound bodies are staged in an
//! in-process event store and handed to a demo handler that echoes the
//! decoded request back as JSON.
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ http::server ──▶ EventStore::stage
//!                                       │
//!                                       ▼
//!                              RequestAdapter::handle ──▶ echo handler
//!                                       │
//!     Client ◀──────────────────── Response::into_http
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use request_bridge::admin;
use request_bridge::config::{load_config, validation::validate_config, ConfigError, LauncherConfig};
use request_bridge::http::{handler_fn, Handler, LauncherServer};
use request_bridge::lifecycle::{wait_for_signal, Shutdown};
use request_bridge::net::Listener;
use request_bridge::observability::{logging, metrics};
use request_bridge::parsing::ParsedBody;
use request_bridge::EventStore;

#[derive(Debug, Parser)]
#[command(name = "request-bridge")]
#[command(about = "Serve a request handler behind the bridge adapter", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LauncherConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        stage_inbound = config.bridge.stage_inbound,
        "request-bridge starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                address = %config.observability.metrics_address,
                error = %e,
                "Invalid metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let store = EventStore::new();

    if config.admin.enabled {
        let addr = config.admin.bind_address.parse()?;
        let store = store.clone();
        let mut rx = shutdown.subscribe();
        tokio::spawn(async move {
            let stop = async move {
                let _ = rx.recv().await;
            };
            if let Err(e) = admin::serve_admin(addr, store, stop).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = Listener::bind(&config.listener).await?;
    let server = LauncherServer::new(&config, store, echo_handler());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("request-bridge stopped");
    Ok(())
}

fn echo_handler() -> impl Handler {
    handler_fn(|req, res| {
        Box::pin(async move {
            let body = match req.body()? {
                Some(ParsedBody::Json(value)) => value.clone(),
                Some(ParsedBody::Form(form)) => serde_json::to_value(form)?,
                Some(ParsedBody::Text(text)) => json!(text),
                Some(ParsedBody::Bytes(bytes)) => json!({ "length": bytes.len() }),
                None => serde_json::Value::Null,
            };

            res.json(&json!({
                "method": req.method().as_str(),
                "path": req.uri().path(),
                "cookies": req.cookies(),
                "query": req.query(),
                "body": body,
            }))?;
            Ok(())
        })
    })
}
