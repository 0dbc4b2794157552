//! Output formatting for CLI responses

use anyhow::Error;
use colored::Colorize;
use flightdeck_functions::{BindingEvent, ChangeOrigin};
use flightdeck_interface::InterfaceEvent;
use serde::Serialize;
use serde_json::json;

use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::ProfileNotFound(_)) => "profile_not_found",
        Some(CliError::ValidationError(_)) => "validation_error",
        Some(CliError::NetworkError(_)) => "network_error",
        Some(CliError::JsonError(_)) => "json_error",
        None => "error",
    }
}

/// Print a success payload as pretty JSON.
pub fn print_json<T: Serialize>(payload: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

/// Print one interface event.
pub fn print_event(event: &InterfaceEvent, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        InterfaceEvent::Connected => println!("{}", "● exporter connected".green()),
        InterfaceEvent::Disconnected => println!("{}", "● exporter disconnected".red()),
        InterfaceEvent::DriverChanged(driver) => println!("driver: {}", driver.bold()),
        InterfaceEvent::VehicleChanged(vehicle) => println!("vehicle: {}", vehicle.bold()),
        InterfaceEvent::SynchronizedChanged(true) => println!("{}", "synchronized".green()),
        InterfaceEvent::SynchronizedChanged(false) => println!("{}", "not synchronized".yellow()),
        InterfaceEvent::Alert(message) => println!("{} {}", "alert:".red().bold(), message),
        InterfaceEvent::Binding(BindingEvent::ValueChanged {
            address,
            value,
            origin,
        }) => {
            let origin = match origin {
                ChangeOrigin::Network => "",
                ChangeOrigin::Action => " (action)",
                ChangeOrigin::Reset => " (reset)",
            };
            println!("  {} = {}{}", address, value, origin.dimmed());
        }
        InterfaceEvent::Binding(BindingEvent::TriggerFired { address, value }) => {
            if value.is_empty() {
                println!("  {} {}", "⚡".yellow(), address);
            } else {
                println!("  {} {} ({})", "⚡".yellow(), address, value);
            }
        }
    }
    Ok(())
}
