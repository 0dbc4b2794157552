//! Heartbeat-based connection tracking.
//!
//! The exporter streams packets every cycle, so silence longer than the
//! heartbeat timeout means the simulator is gone (closed, paused on the
//! menu, or the network dropped). Callers pass the current instant in, which
//! keeps the monitor deterministic under test.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug)]
pub struct ConnectionMonitor {
    timeout: Duration,
    last_packet: Option<Instant>,
    state: ConnectionState,
    connections: u64,
}

impl ConnectionMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_packet: None,
            state: ConnectionState::Disconnected,
            connections: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of times the remote has come up, counting the first.
    pub fn connections(&self) -> u64 {
        self.connections
    }

    /// Records an inbound packet. Returns the new state on a transition.
    pub fn record_packet(&mut self, now: Instant) -> Option<ConnectionState> {
        self.last_packet = Some(now);
        if self.state.is_connected() {
            return None;
        }
        self.connections = self.connections.saturating_add(1);
        self.transition_to(ConnectionState::Connected, "data received");
        Some(ConnectionState::Connected)
    }

    pub fn is_timed_out(&self, now: Instant) -> bool {
        self.last_packet
            .is_some_and(|last| now.saturating_duration_since(last) > self.timeout)
    }

    /// Applies the heartbeat timeout. Returns the new state on a transition.
    pub fn check(&mut self, now: Instant) -> Option<ConnectionState> {
        if self.state.is_connected() && self.is_timed_out(now) {
            self.transition_to(ConnectionState::Disconnected, "heartbeat timeout");
            return Some(ConnectionState::Disconnected);
        }
        None
    }

    pub fn time_since_last_packet(&self, now: Instant) -> Option<Duration> {
        self.last_packet
            .map(|last| now.saturating_duration_since(last))
    }

    fn transition_to(&mut self, new_state: ConnectionState, reason: &str) {
        let previous = self.state;
        self.state = new_state;
        info!(
            previous = ?previous,
            state = ?new_state,
            reason,
            timeout = ?self.timeout,
            "Exporter connection state changed"
        );
    }
}
