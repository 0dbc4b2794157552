//! `ALERT_MESSAGE` payloads.
//!
//! The exporter reports script errors as base64 text. `=` would collide with
//! the pair separator, so padding travels as `-`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{InterfaceError, InterfaceResult};

/// Decodes an alert payload to text.
///
/// # Errors
///
/// [`InterfaceError::AlertDecode`] when the payload is not base64 or the
/// decoded bytes are not UTF-8.
pub fn decode_alert(payload: &str) -> InterfaceResult<String> {
    let restored = payload.trim().replace('-', "=");
    let bytes = STANDARD
        .decode(restored.as_bytes())
        .map_err(|error| InterfaceError::AlertDecode(error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| InterfaceError::AlertDecode(error.to_string()))
}

/// Encodes text the way the exporter does.
pub fn encode_alert(message: &str) -> String {
    STANDARD.encode(message.as_bytes()).replace('=', "-")
}
