//! Bounded retry for control-plane requests.
//!
//! The link to the exporter is a one-way datagram channel with no delivery
//! guarantee, so requests such as "load driver X" are repeated until the
//! remote acknowledges them or the retry budget runs out. [`RetriedRequest`]
//! is the pure state machine; whoever owns it drives [`RetriedRequest::tick`]
//! from a timer.

use serde::Serialize;
use tracing::{debug, warn};

use crate::framing::{ControlRequest, encode_request};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryState {
    /// Nothing outstanding, or acknowledged.
    Idle,
    /// Waiting for an acknowledgement.
    Retrying,
    /// Retry budget exhausted; only a restart revives the request.
    GivenUp,
}

/// What a timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No request outstanding.
    Idle,
    Resent,
    /// The transport could not send; the attempt was not counted.
    NotReady,
    /// The budget ran out on this tick. The timer should stop.
    GaveUp,
}

impl TickOutcome {
    /// Whether the owner should keep its timer running.
    pub fn keeps_timer(&self) -> bool {
        matches!(self, TickOutcome::Resent | TickOutcome::NotReady)
    }
}

#[derive(Debug, Clone)]
pub struct RetriedRequest {
    pending: Option<ControlRequest>,
    description: String,
    retry_count: u32,
    retry_limit: u32,
    state: RetryState,
}

impl RetriedRequest {
    pub fn new(retry_limit: u32) -> Self {
        Self {
            pending: None,
            description: String::new(),
            retry_count: 0,
            retry_limit,
            state: RetryState::Idle,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    pub fn pending(&self) -> Option<&ControlRequest> {
        self.pending.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Starts (or replaces) the outstanding request.
    ///
    /// The retry count is reset and an immediate send is attempted when the
    /// transport is ready. The request is armed either way. Returns whether
    /// the immediate send went out.
    pub fn send(
        &mut self,
        request: ControlRequest,
        description: impl Into<String>,
        transport: &dyn Transport,
    ) -> bool {
        self.pending = Some(request);
        self.description = description.into();
        self.retry_count = 0;
        self.state = RetryState::Retrying;

        if !transport.is_ready() {
            debug!(request = %self.description, "Transport not ready; request will be retried");
            return false;
        }
        self.transmit(transport)
    }

    /// One timer period elapsed.
    pub fn tick(&mut self, transport: &dyn Transport) -> TickOutcome {
        if self.state != RetryState::Retrying {
            return TickOutcome::Idle;
        }
        if self.retry_count >= self.retry_limit {
            self.state = RetryState::GivenUp;
            warn!(
                request = %self.description,
                attempts = self.retry_count.saturating_add(1),
                "Remote did not acknowledge request; giving up"
            );
            return TickOutcome::GaveUp;
        }
        if !transport.is_ready() {
            debug!(request = %self.description, "Transport not ready; waiting for next retry");
            return TickOutcome::NotReady;
        }
        self.retry_count = self.retry_count.saturating_add(1);
        debug!(
            request = %self.description,
            retry = self.retry_count,
            limit = self.retry_limit,
            "Retrying request"
        );
        self.transmit(transport);
        TickOutcome::Resent
    }

    /// The remote acknowledged the request.
    pub fn stop(&mut self) {
        if self.state != RetryState::Idle {
            debug!(request = %self.description, "Request acknowledged");
        }
        self.state = RetryState::Idle;
    }

    /// Re-arms an unacknowledged request after a reconnect, without sending.
    ///
    /// Returns whether the request is armed again.
    pub fn restart(&mut self) -> bool {
        if self.pending.is_none() || self.state == RetryState::Idle {
            return false;
        }
        self.retry_count = 0;
        self.state = RetryState::Retrying;
        true
    }

    fn transmit(&self, transport: &dyn Transport) -> bool {
        let Some(request) = &self.pending else {
            return false;
        };
        match transport.send(&encode_request(request)) {
            Ok(()) => true,
            Err(error) => {
                debug!(request = %self.description, error = %error, "Request send failed");
                false
            }
        }
    }
}
