//! Driver and module load requests.
//!
//! The bridge asks the exporter to load a named driver (`D<name>`) and the
//! module for the active aircraft (`M`). Each request retries on its own
//! timer until the remote's `ACTIVE_DRIVER` or `ACTIVE_VEHICLE` report
//! acknowledges it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::config::InterfaceConfig;
use crate::framing::ControlRequest;
use crate::retry::{RetriedRequest, RetryState, TickOutcome};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Driver,
    Module,
}

impl RequestKind {
    pub const ALL: [RequestKind; 2] = [RequestKind::Driver, RequestKind::Module];
}

/// Starts and stops the periodic timer behind each request.
///
/// Timer ticks must come back to the owner of the [`ExportProtocol`] as
/// [`ExportProtocol::tick`] calls; the scheduler never touches the protocol.
pub trait RetryScheduler: Send {
    /// Starts, or restarts from a full period, the timer for `kind`.
    fn arm(&mut self, kind: RequestKind);

    fn disarm(&mut self, kind: RequestKind);
}

/// Scheduler that only records which timers are armed.
///
/// Clones share state, so a test can keep one and hand the other to the
/// protocol, then drive ticks by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    armed: Arc<Mutex<HashSet<RequestKind>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self, kind: RequestKind) -> bool {
        self.armed.lock().contains(&kind)
    }
}

impl RetryScheduler for ManualScheduler {
    fn arm(&mut self, kind: RequestKind) {
        self.armed.lock().insert(kind);
    }

    fn disarm(&mut self, kind: RequestKind) {
        self.armed.lock().remove(&kind);
    }
}

pub struct ExportProtocol {
    expected_driver: Option<String>,
    request_module_on_start: bool,
    driver: RetriedRequest,
    module: RetriedRequest,
    scheduler: Box<dyn RetryScheduler>,
}

impl std::fmt::Debug for ExportProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportProtocol")
            .field("expected_driver", &self.expected_driver)
            .field("driver", &self.driver)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl ExportProtocol {
    pub fn new(config: &InterfaceConfig, scheduler: Box<dyn RetryScheduler>) -> Self {
        Self {
            expected_driver: config.expected_driver.clone(),
            request_module_on_start: config.request_module_on_start,
            driver: RetriedRequest::new(config.retry_limit),
            module: RetriedRequest::new(config.retry_limit),
            scheduler,
        }
    }

    pub fn expected_driver(&self) -> Option<&str> {
        self.expected_driver.as_deref()
    }

    pub fn set_expected_driver(&mut self, driver: Option<String>) {
        self.expected_driver = driver;
    }

    /// Issues the configured start-up requests.
    pub fn start(&mut self, transport: &dyn Transport) {
        if let Some(driver) = self.expected_driver.clone() {
            self.request_driver(&driver, transport);
        }
        if self.request_module_on_start {
            self.request_module(transport);
        }
    }

    pub fn request_driver(&mut self, name: &str, transport: &dyn Transport) {
        info!(driver = %name, "Requesting export driver");
        self.driver.send(
            ControlRequest::LoadDriver(name.to_string()),
            format!("load driver {name}"),
            transport,
        );
        self.scheduler.arm(RequestKind::Driver);
    }

    pub fn request_module(&mut self, transport: &dyn Transport) {
        info!("Requesting export module for the active aircraft");
        self.module
            .send(ControlRequest::LoadModule, "load module", transport);
        self.scheduler.arm(RequestKind::Module);
    }

    /// Remote reported its active driver. Returns whether this acknowledged
    /// an outstanding driver request.
    pub fn on_active_driver(&mut self, name: &str) -> bool {
        let matches = matches!(
            self.driver.pending(),
            Some(ControlRequest::LoadDriver(wanted)) if wanted == name
        );
        if matches && self.driver.state() != RetryState::Idle {
            self.driver.stop();
            self.scheduler.disarm(RequestKind::Driver);
            return true;
        }
        false
    }

    /// Remote reported its active vehicle. Any non-empty report means a
    /// module is loaded.
    pub fn on_active_vehicle(&mut self, vehicle: &str) -> bool {
        if vehicle.trim().is_empty() || self.module.state() == RetryState::Idle {
            return false;
        }
        self.module.stop();
        self.scheduler.disarm(RequestKind::Module);
        true
    }

    /// Timer for `kind` fired.
    pub fn tick(&mut self, kind: RequestKind, transport: &dyn Transport) -> TickOutcome {
        let outcome = self.request_mut(kind).tick(transport);
        if !outcome.keeps_timer() {
            self.scheduler.disarm(kind);
        }
        outcome
    }

    /// Re-arms unacknowledged requests after the remote comes back.
    pub fn restart(&mut self) {
        for kind in RequestKind::ALL {
            if self.request_mut(kind).restart() {
                self.scheduler.arm(kind);
            }
        }
    }

    pub fn stop_all(&mut self) {
        for kind in RequestKind::ALL {
            self.request_mut(kind).stop();
            self.scheduler.disarm(kind);
        }
    }

    pub fn state(&self, kind: RequestKind) -> RetryState {
        self.request(kind).state()
    }

    pub fn request(&self, kind: RequestKind) -> &RetriedRequest {
        match kind {
            RequestKind::Driver => &self.driver,
            RequestKind::Module => &self.module,
        }
    }

    fn request_mut(&mut self, kind: RequestKind) -> &mut RetriedRequest {
        match kind {
            RequestKind::Driver => &mut self.driver,
            RequestKind::Module => &mut self.module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

    fn protocol(scheduler: &ManualScheduler) -> TestResult<ExportProtocol> {
        let config = InterfaceConfig::builder()
            .expected_driver("F-16C")
            .retry_limit(2)
            .build()?;
        Ok(ExportProtocol::new(&config, Box::new(scheduler.clone())))
    }

    #[test]
    fn test_start_sends_both_requests() -> TestResult {
        let scheduler = ManualScheduler::new();
        let transport = MemoryTransport::new(true);
        let mut protocol = protocol(&scheduler)?;
        protocol.start(&transport);

        assert_eq!(transport.sent(), vec!["DF-16C\n".to_string(), "M\n".to_string()]);
        assert!(scheduler.is_armed(RequestKind::Driver));
        assert!(scheduler.is_armed(RequestKind::Module));
        Ok(())
    }

    #[test]
    fn test_only_matching_driver_acknowledges() -> TestResult {
        let scheduler = ManualScheduler::new();
        let transport = MemoryTransport::new(true);
        let mut protocol = protocol(&scheduler)?;
        protocol.start(&transport);

        assert!(!protocol.on_active_driver("A-10C"));
        assert!(scheduler.is_armed(RequestKind::Driver));
        assert!(protocol.on_active_driver("F-16C"));
        assert!(!scheduler.is_armed(RequestKind::Driver));
        assert!(!protocol.on_active_driver("F-16C"));

        assert!(!protocol.on_active_vehicle(""));
        assert!(protocol.on_active_vehicle("F-16C_50"));
        assert!(!scheduler.is_armed(RequestKind::Module));
        Ok(())
    }

    #[test]
    fn test_exhaustion_disarms_and_restart_rearms() -> TestResult {
        let scheduler = ManualScheduler::new();
        let transport = MemoryTransport::new(true);
        let mut protocol = protocol(&scheduler)?;
        protocol.request_module(&transport);

        assert_eq!(protocol.tick(RequestKind::Module, &transport), TickOutcome::Resent);
        assert_eq!(protocol.tick(RequestKind::Module, &transport), TickOutcome::Resent);
        assert_eq!(protocol.tick(RequestKind::Module, &transport), TickOutcome::GaveUp);
        assert!(!scheduler.is_armed(RequestKind::Module));
        assert_eq!(transport.take().len(), 3);

        protocol.restart();
        assert!(scheduler.is_armed(RequestKind::Module));
        assert!(!scheduler.is_armed(RequestKind::Driver));
        assert!(transport.sent().is_empty());
        Ok(())
    }

    #[test]
    fn test_stop_all() -> TestResult {
        let scheduler = ManualScheduler::new();
        let transport = MemoryTransport::new(false);
        let mut protocol = protocol(&scheduler)?;
        protocol.start(&transport);
        protocol.stop_all();
        assert_eq!(protocol.state(RequestKind::Driver), RetryState::Idle);
        assert!(!scheduler.is_armed(RequestKind::Module));
        assert_eq!(protocol.tick(RequestKind::Driver, &transport), TickOutcome::Idle);
        Ok(())
    }
}
