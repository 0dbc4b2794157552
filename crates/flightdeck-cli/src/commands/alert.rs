use anyhow::Result;
use flightdeck_interface::decode_alert;
use serde_json::json;

use crate::error::CliError;
use crate::output;

/// Decodes an `ALERT_MESSAGE` payload copied from a packet capture or log.
pub fn execute(payload: &str, json: bool) -> Result<()> {
    let message = decode_alert(payload).map_err(CliError::from)?;
    if json {
        output::print_json(&json!({ "success": true, "message": message }))?;
    } else {
        println!("{message}");
    }
    Ok(())
}
