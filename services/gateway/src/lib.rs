//! WebSocket gateway for the parlor tables.
//!
//! One process hosts all three rooms. Engine state lives behind a single
//! mutex; a one-second tick task drives the rounds and every event the
//! engines emit flows out through one broadcast channel, filtered per
//! connection by audience.

pub mod admin;
pub mod config;
pub mod metrics;
pub mod rooms;
pub mod ws;

use crate::{
    config::GatewayConfig,
    metrics::{GatewayMetrics, GatewayMetricsSnapshot},
    rooms::Rooms,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use parlor_engine::MemoryLedger;
use parlor_types::api::ServerEvent;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<Mutex<Rooms>>,
    pub broadcaster: broadcast::Sender<Arc<ServerEvent>>,
    pub metrics: Arc<GatewayMetrics>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(config: &GatewayConfig, ledger: Arc<MemoryLedger>) -> AppState {
        let (broadcaster, _) = broadcast::channel(1024);
        AppState {
            rooms: Arc::new(Mutex::new(Rooms::new(config, ledger))),
            broadcaster,
            metrics: Arc::new(GatewayMetrics::default()),
            admin_token: config.admin_token.clone(),
        }
    }

    /// Hands engine events to every live connection. A send error just
    /// means nobody is subscribed right now.
    pub fn publish(&self, events: Vec<ServerEvent>) {
        self.metrics.add_events_broadcast(events.len() as u64);
        for event in events {
            let _ = self.broadcaster.send(Arc::new(event));
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_snapshot))
        .route("/admin/override", post(admin::set_override))
        .route("/admin/rounds/:game", get(admin::round_snapshot))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics_snapshot(State(state): State<AppState>) -> Json<GatewayMetricsSnapshot> {
    Json(state.metrics.snapshot())
}
