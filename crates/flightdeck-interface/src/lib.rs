//! Simulator export interface
//!
//! Connects a [`FunctionRegistry`](flightdeck_functions::FunctionRegistry) to
//! the exporter script running inside the simulator:
//!
//! - Datagram framing and the `C`/`D`/`M` outbound requests
//! - Bounded retry of driver and module load requests
//! - Heartbeat tracking, reset on disconnect, and driver synchronization
//! - A tokio service that owns the interface and serializes all access
//! - YAML/JSON panel profiles

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod alert;
pub mod config;
pub mod error;
pub mod framing;
pub mod interface;
pub mod monitor;
pub mod profile;
pub mod protocol;
pub mod retry;
pub mod service;
pub mod transport;

pub use alert::{decode_alert, encode_alert};
pub use config::{InterfaceConfig, InterfaceConfigBuilder};
pub use error::{InterfaceError, InterfaceResult};
pub use framing::{ControlRequest, InboundPair, parse_datagram};
pub use interface::{ActionReport, ExportInterface, InterfaceEvent, InterfaceStatus, ValueSnapshot};
pub use monitor::{ConnectionMonitor, ConnectionState};
pub use profile::Profile;
pub use protocol::{ExportProtocol, ManualScheduler, RequestKind, RetryScheduler};
pub use retry::{RetriedRequest, RetryState, TickOutcome};
pub use service::{InterfaceHandle, InterfaceService, ServiceMessage, TokioRetryScheduler};
pub use transport::{MemoryTransport, Transport, UdpTransport};
