//! Datagram framing for both directions.
//!
//! Inbound packets are UTF-8 text: a header token followed by `id=value`
//! tokens, all separated by `:`. Text values may themselves contain `:`
//! (the exporter writes `::` as a line break), so a token without `=` that
//! follows a pair is part of that pair's value. Tokens without `=` before
//! the first pair are header material and skipped.
//!
//! Outbound, every command or control request is one newline-terminated
//! datagram.

use std::fmt;

use flightdeck_functions::WireCommand;

/// Heartbeat sent by the exporter every cycle.
pub const ALIVE: &str = "ALIVE";
/// Short name of the export driver currently loaded by the remote.
pub const ACTIVE_DRIVER: &str = "ACTIVE_DRIVER";
/// Aircraft the remote is currently flying.
pub const ACTIVE_VEHICLE: &str = "ACTIVE_VEHICLE";
/// Error report from the exporter, base64 with `-` for padding.
pub const ALERT_MESSAGE: &str = "ALERT_MESSAGE";

/// Ids handled by the interface itself rather than a function.
pub const META_IDS: [&str; 4] = [ALIVE, ACTIVE_DRIVER, ACTIVE_VEHICLE, ALERT_MESSAGE];

/// One decoded `id=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPair {
    pub id: String,
    pub value: String,
}

/// Splits an inbound datagram into pairs, in packet order.
///
/// Invalid UTF-8 is replaced rather than rejected, so one bad byte costs one
/// value instead of the whole packet.
pub fn parse_datagram(bytes: &[u8]) -> Vec<InboundPair> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches(['\r', '\n']);

    let mut pairs: Vec<InboundPair> = Vec::new();
    for token in text.split(':') {
        match token.split_once('=') {
            Some((id, value)) if !id.is_empty() => pairs.push(InboundPair {
                id: id.to_string(),
                value: value.to_string(),
            }),
            _ => {
                if let Some(last) = pairs.last_mut() {
                    last.value.push(':');
                    last.value.push_str(token);
                }
            }
        }
    }
    pairs
}

/// Control-plane requests understood by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlRequest {
    /// `D<name>`: load the named export driver.
    LoadDriver(String),
    /// `M`: load the module matching the active aircraft.
    LoadModule,
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlRequest::LoadDriver(name) => write!(f, "D{name}"),
            ControlRequest::LoadModule => f.write_str("M"),
        }
    }
}

/// Wire text of one outbound command datagram.
pub fn encode_command(command: &WireCommand) -> String {
    format!("{command}\n")
}

/// Wire text of one control request datagram.
pub fn encode_request(request: &ControlRequest) -> String {
    format!("{request}\n")
}
