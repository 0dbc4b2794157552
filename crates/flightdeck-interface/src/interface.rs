//! One simulator interface: registry, protocol and connection state.
//!
//! [`ExportInterface`] is deliberately synchronous and single-owner. Every
//! inbound packet, action, retry tick and heartbeat check goes through
//! `&mut self`, so function state is only ever touched from one place. The
//! async service wraps it in a single task; tests drive it directly.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Instant;

use flightdeck_functions::{
    ActionContext, ActionOutcome, BindingAddress, BindingEvent, BindingValue, FunctionRegistry,
    Notifications, Outbox, ValueDescriptor,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alert::decode_alert;
use crate::config::InterfaceConfig;
use crate::error::InterfaceResult;
use crate::framing::{ACTIVE_DRIVER, ACTIVE_VEHICLE, ALERT_MESSAGE, ALIVE, encode_command, parse_datagram};
use crate::monitor::{ConnectionMonitor, ConnectionState};
use crate::protocol::{ExportProtocol, RequestKind, RetryScheduler};
use crate::retry::{RetryState, TickOutcome};
use crate::transport::Transport;

/// Something the host may react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InterfaceEvent {
    Binding(BindingEvent),
    Connected,
    Disconnected,
    DriverChanged(String),
    VehicleChanged(String),
    SynchronizedChanged(bool),
    Alert(String),
}

/// Result of invoking an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub outcome: ActionOutcome,
    /// Datagrams handed to the transport.
    pub sent: Vec<String>,
    /// Datagrams composed but dropped because the transport was not ready.
    pub dropped: usize,
    pub events: Vec<InterfaceEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceStatus {
    pub connection: ConnectionState,
    pub synchronized: bool,
    pub transport_ready: bool,
    pub expected_driver: Option<String>,
    pub active_driver: Option<String>,
    pub active_vehicle: Option<String>,
    pub driver_request: RetryState,
    pub module_request: RetryState,
    pub functions: usize,
    pub unknown_ids: usize,
}

/// A value and its current content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueSnapshot {
    #[serde(flatten)]
    pub descriptor: ValueDescriptor,
    pub value: BindingValue,
}

#[derive(Debug)]
pub struct ExportInterface<T: Transport> {
    config: InterfaceConfig,
    registry: FunctionRegistry,
    transport: T,
    protocol: ExportProtocol,
    monitor: ConnectionMonitor,
    active_driver: Option<String>,
    active_vehicle: Option<String>,
    synchronized: bool,
    /// Unknown ids already reported this session.
    unknown_ids: HashSet<String>,
}

impl<T: Transport> ExportInterface<T> {
    /// # Errors
    ///
    /// Returns the configuration validation failure, if any.
    pub fn new(
        config: InterfaceConfig,
        registry: FunctionRegistry,
        transport: T,
        scheduler: Box<dyn RetryScheduler>,
    ) -> InterfaceResult<Self> {
        config.validate()?;
        let protocol = ExportProtocol::new(&config, scheduler);
        let monitor = ConnectionMonitor::new(config.heartbeat_timeout());
        Ok(Self {
            config,
            registry,
            transport,
            protocol,
            monitor,
            active_driver: None,
            active_vehicle: None,
            synchronized: false,
            unknown_ids: HashSet::new(),
        })
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn protocol(&self) -> &ExportProtocol {
        &self.protocol
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.monitor.state()
    }

    /// Issues the start-up control requests.
    pub fn start(&mut self) {
        info!(
            functions = self.registry.len(),
            expected_driver = ?self.config.expected_driver,
            "Starting export interface"
        );
        self.protocol.start(&self.transport);
    }

    /// Handles one inbound datagram.
    pub fn receive_datagram(
        &mut self,
        bytes: &[u8],
        from: Option<SocketAddr>,
        now: Instant,
    ) -> Vec<InterfaceEvent> {
        let mut events = Vec::new();
        if let Some(peer) = from {
            self.transport.observe_peer(peer);
        }

        if self.monitor.record_packet(now) == Some(ConnectionState::Connected) {
            events.push(InterfaceEvent::Connected);
            self.protocol.restart();
        }

        let mut notifications = Notifications::new();
        for pair in parse_datagram(bytes) {
            match pair.id.as_str() {
                ALIVE => {}
                ACTIVE_DRIVER => self.on_active_driver(&pair.value, &mut events),
                ACTIVE_VEHICLE => self.on_active_vehicle(&pair.value, &mut events),
                ALERT_MESSAGE => match decode_alert(&pair.value) {
                    Ok(message) => {
                        warn!(message = %message, "Exporter reported an error");
                        events.push(InterfaceEvent::Alert(message));
                    }
                    Err(error) => debug!(error = %error, "Undecodable alert message"),
                },
                id => {
                    if !self.registry.dispatch(id, &pair.value, &mut notifications) {
                        self.on_unknown_id(id);
                    }
                }
            }
        }
        events.extend(notifications.drain().map(InterfaceEvent::Binding));
        events
    }

    /// Invokes an action and sends whatever it composed.
    ///
    /// # Errors
    ///
    /// Fails when the address names no registered function or action.
    pub fn execute_action(
        &mut self,
        address: &BindingAddress,
        parameter: &BindingValue,
    ) -> InterfaceResult<ActionReport> {
        let mut notifications = Notifications::new();
        let mut outbox = Outbox::new();
        let outcome = {
            let mut context = ActionContext::new(&mut notifications, &mut outbox);
            self.registry.execute(address, parameter, &mut context)?
        };
        if let ActionOutcome::Ignored(reason) = &outcome {
            debug!(action = %address, reason = %reason, "Action ignored");
        }

        let mut sent = Vec::new();
        let mut dropped = 0usize;
        for command in outbox.drain() {
            let datagram = encode_command(&command);
            if !self.transport.is_ready() {
                debug!(command = %command, "Transport not ready; command dropped");
                dropped = dropped.saturating_add(1);
                continue;
            }
            match self.transport.send(&datagram) {
                Ok(()) => sent.push(datagram),
                Err(error) => {
                    debug!(command = %command, error = %error, "Command send failed");
                    dropped = dropped.saturating_add(1);
                }
            }
        }

        Ok(ActionReport {
            outcome,
            sent,
            dropped,
            events: notifications.drain().map(InterfaceEvent::Binding).collect(),
        })
    }

    /// Applies the heartbeat timeout.
    ///
    /// On disconnect every function is reset and synchronization is lost.
    pub fn check_connection(&mut self, now: Instant) -> Vec<InterfaceEvent> {
        let mut events = Vec::new();
        if self.monitor.check(now) != Some(ConnectionState::Disconnected) {
            return events;
        }
        events.push(InterfaceEvent::Disconnected);
        self.active_driver = None;
        self.active_vehicle = None;
        self.set_synchronized(false, &mut events);

        let mut notifications = Notifications::new();
        self.registry.reset_all(&mut notifications);
        events.extend(notifications.drain().map(InterfaceEvent::Binding));
        events
    }

    /// Retry timer for `kind` fired.
    pub fn retry_tick(&mut self, kind: RequestKind) -> TickOutcome {
        self.protocol.tick(kind, &self.transport)
    }

    /// Asks the remote to load `name` and makes it the expected driver.
    pub fn request_driver(&mut self, name: &str) -> Vec<InterfaceEvent> {
        self.config.expected_driver = Some(name.to_string());
        self.protocol.set_expected_driver(Some(name.to_string()));
        self.protocol.request_driver(name, &self.transport);
        let mut events = Vec::new();
        self.update_synchronized(&mut events);
        events
    }

    pub fn request_module(&mut self) {
        self.protocol.request_module(&self.transport);
    }

    /// Swaps in a registry built elsewhere.
    ///
    /// The outgoing registry is dropped whole; nothing observes a partly
    /// rebuilt one.
    pub fn replace_registry(&mut self, registry: FunctionRegistry) -> FunctionRegistry {
        info!(
            previous = self.registry.len(),
            functions = registry.len(),
            "Replacing function registry"
        );
        self.unknown_ids.clear();
        std::mem::replace(&mut self.registry, registry)
    }

    /// Stops all retries.
    pub fn shutdown(&mut self) {
        self.protocol.stop_all();
    }

    pub fn values(&self) -> Vec<ValueSnapshot> {
        self.registry
            .iter()
            .flat_map(|function| function.values())
            .map(|(descriptor, value)| ValueSnapshot { descriptor, value })
            .collect()
    }

    pub fn status(&self) -> InterfaceStatus {
        InterfaceStatus {
            connection: self.monitor.state(),
            synchronized: self.synchronized,
            transport_ready: self.transport.is_ready(),
            expected_driver: self.config.expected_driver.clone(),
            active_driver: self.active_driver.clone(),
            active_vehicle: self.active_vehicle.clone(),
            driver_request: self.protocol.state(RequestKind::Driver),
            module_request: self.protocol.state(RequestKind::Module),
            functions: self.registry.len(),
            unknown_ids: self.unknown_ids.len(),
        }
    }

    fn on_active_driver(&mut self, name: &str, events: &mut Vec<InterfaceEvent>) {
        let name = name.trim();
        if self.active_driver.as_deref() != Some(name) {
            info!(driver = %name, "Exporter driver changed");
            self.active_driver = Some(name.to_string());
            events.push(InterfaceEvent::DriverChanged(name.to_string()));

            // The remote switched away after an earlier acknowledgement.
            if let Some(expected) = self.config.expected_driver.clone()
                && expected != name
                && self.protocol.state(RequestKind::Driver) == RetryState::Idle
            {
                self.protocol.request_driver(&expected, &self.transport);
            }
        }
        self.protocol.on_active_driver(name);
        self.update_synchronized(events);
    }

    fn on_active_vehicle(&mut self, vehicle: &str, events: &mut Vec<InterfaceEvent>) {
        let vehicle = vehicle.trim();
        if self.active_vehicle.as_deref() != Some(vehicle) {
            info!(vehicle = %vehicle, "Exporter vehicle changed");
            self.active_vehicle = Some(vehicle.to_string());
            events.push(InterfaceEvent::VehicleChanged(vehicle.to_string()));
        }
        self.protocol.on_active_vehicle(vehicle);
    }

    fn on_unknown_id(&mut self, id: &str) {
        if self.synchronized && self.unknown_ids.insert(id.to_string()) {
            info!(id = %id, "No function registered for wire id");
        }
    }

    fn update_synchronized(&mut self, events: &mut Vec<InterfaceEvent>) {
        let synchronized = match (&self.config.expected_driver, &self.active_driver) {
            (Some(expected), Some(active)) => expected == active,
            (None, Some(active)) => !active.is_empty(),
            (_, None) => false,
        };
        self.set_synchronized(synchronized, events);
    }

    fn set_synchronized(&mut self, synchronized: bool, events: &mut Vec<InterfaceEvent>) {
        if self.synchronized == synchronized {
            return;
        }
        self.synchronized = synchronized;
        info!(
            synchronized,
            driver = ?self.active_driver,
            "Synchronization with exporter changed"
        );
        events.push(InterfaceEvent::SynchronizedChanged(synchronized));
    }
}
