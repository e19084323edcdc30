//! Shared fixtures for the gateway integration tests: a config with
//! short rounds and a server spawned on an ephemeral port.

use parlor_engine::MemoryLedger;
use parlor_gateway::{
    config::{DuelTimingConfig, GatewayConfig, TimingConfig},
    router, AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.lucky7 = TimingConfig {
        countdown_secs: 12,
        freeze_cutoff_secs: 10,
        intermission_secs: 2,
    };
    config.coin_toss = config.lucky7;
    config.duel = DuelTimingConfig {
        start_delay_secs: 1,
        choice_timeout_secs: 30,
    };
    config
}

/// Serves the router on an ephemeral port, handing back the state so a
/// test can drive ticks by hand.
pub async fn spawn_gateway(config: &GatewayConfig) -> (SocketAddr, AppState) {
    let state = AppState::new(config, Arc::new(MemoryLedger::new()));
    let app = router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// One logical second, driven by hand.
pub fn tick(state: &AppState) {
    let events = {
        let mut rooms = state.rooms.lock().unwrap();
        rooms.tick_all()
    };
    state.publish(events);
}
