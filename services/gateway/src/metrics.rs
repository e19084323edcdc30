//! Gateway counters, exposed as JSON on /metrics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct GatewayMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    wagers_accepted: AtomicU64,
    wagers_rejected: AtomicU64,
    events_broadcast: AtomicU64,
    broadcast_lagged: AtomicU64,
}

impl GatewayMetrics {
    pub fn inc_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_wager_accepted(&self) {
        self.wagers_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_wager_rejected(&self) {
        self.wagers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_events_broadcast(&self, n: u64) {
        self.events_broadcast.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_broadcast_lagged(&self, n: u64) {
        self.broadcast_lagged.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GatewayMetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        GatewayMetricsSnapshot {
            connections_open: opened.saturating_sub(closed),
            connections_opened: opened,
            connections_closed: closed,
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            wagers_accepted: self.wagers_accepted.load(Ordering::Relaxed),
            wagers_rejected: self.wagers_rejected.load(Ordering::Relaxed),
            events_broadcast: self.events_broadcast.load(Ordering::Relaxed),
            broadcast_lagged: self.broadcast_lagged.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayMetricsSnapshot {
    pub connections_open: u64,
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub messages_received: u64,
    pub messages_sent: u64,
    pub wagers_accepted: u64,
    pub wagers_rejected: u64,
    pub events_broadcast: u64,
    pub broadcast_lagged: u64,
}
