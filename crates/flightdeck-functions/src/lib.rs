//! Network functions for simulator cockpit bridges
//!
//! A network function binds one or more wire elements of the export protocol
//! to values, triggers and actions that host automation can use. This crate
//! provides:
//!
//! - The [`NetworkFunction`] contract and its event buffers
//! - Concrete control types (switches, encoders, gauges, lamps, text)
//! - Serializable [`FunctionConfig`] records and their factory
//! - [`FunctionRegistry`], the canonically ordered set bound to one interface
//! - [`ProtocolContract`] generation for the exporter script

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod binding;
pub mod config;
pub mod context;
pub mod contract;
pub mod element;
pub mod error;
pub mod function;
pub mod functions;
pub mod registry;
pub mod wire;

pub use binding::{
    ActionDescriptor, ActionKind, BindingAddress, BindingValue, BindingValueUnit,
    TriggerDescriptor, ValueDescriptor,
};
pub use config::FunctionConfig;
pub use context::{
    ActionContext, ActionOutcome, BindingEvent, ChangeOrigin, Notifications, Outbox, ValueSlot,
};
pub use contract::{ContractElement, ContractFunction, DEFAULT_OUTPUT_FORMAT, ProtocolContract};
pub use element::DataElement;
pub use error::{FunctionError, FunctionResult};
pub use function::{FunctionIdentity, NetworkFunction};
pub use registry::{FunctionRegistry, canonical_order};
pub use wire::{WireCommand, WireScalar, format_wire_f64, parse_wire_f64, precision_from_format};
