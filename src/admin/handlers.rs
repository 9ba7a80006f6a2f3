use axum::{extract::State, Json};
use serde::Serialize;

use crate::bridge::EventStore;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub pending_events: usize,
}

pub async fn get_status(State(store): State<EventStore>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        pending_events: store.pending(),
    })
}

pub async fn get_health() -> &'static str {
    "ok"
}
