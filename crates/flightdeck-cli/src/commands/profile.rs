//! Offline profile commands: validate, contract, bindings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use flightdeck_functions::{FunctionRegistry, NetworkFunction, ProtocolContract};
use flightdeck_interface::Profile;
use serde_json::json;
use tracing::info;

use crate::commands::{ContractArgs, ContractFormat};
use crate::error::CliError;
use crate::output;

fn load(path: &Path) -> Result<(Profile, FunctionRegistry), CliError> {
    let profile = Profile::load(path)?;
    let registry = profile.build_registry()?;
    Ok((profile, registry))
}

pub fn validate(path: &Path, json: bool) -> Result<()> {
    let (profile, registry) = load(path)?;
    let contract = ProtocolContract::from_registry(&registry);
    info!(path = ?path, functions = registry.len(), "Profile is valid");

    if json {
        output::print_json(&json!({
            "success": true,
            "profile": path,
            "functions": registry.len(),
            "elements": contract.element_count(),
            "expected_driver": profile.interface.expected_driver,
        }))?;
    } else {
        println!("{} {}", "✓".green(), path.display());
        println!("  functions: {}", registry.len());
        println!("  elements:  {}", contract.element_count());
        if let Some(driver) = &profile.interface.expected_driver {
            println!("  driver:    {driver}");
        }
    }
    Ok(())
}

pub fn contract(args: &ContractArgs) -> Result<()> {
    let (_, registry) = load(&args.profile)?;
    let contract = ProtocolContract::from_registry(&registry);
    let rendered = match args.format {
        ContractFormat::Lua => contract.to_lua(),
        ContractFormat::Json => {
            let mut text = serde_json::to_string_pretty(&contract).map_err(CliError::from)?;
            text.push('\n');
            text
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write contract to {}", path.display()))?;
            info!(path = ?path, elements = contract.element_count(), "Contract written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

pub fn bindings(path: &Path, json: bool) -> Result<()> {
    let (_, registry) = load(path)?;

    if json {
        let functions: Vec<_> = registry
            .iter()
            .map(|function| {
                json!({
                    "function": function.local_key(),
                    "elements": function.data_elements(),
                    "values": function.values().into_iter().map(|(d, _)| d).collect::<Vec<_>>(),
                    "triggers": function.triggers(),
                    "actions": function.actions(),
                })
            })
            .collect();
        output::print_json(&json!({ "success": true, "functions": functions }))?;
        return Ok(());
    }

    for function in registry.iter() {
        print_function(function);
    }
    Ok(())
}

fn print_function(function: &dyn NetworkFunction) {
    let ids: Vec<String> = function.data_elements().into_iter().map(|e| e.id).collect();
    println!("{} [{}]", function.local_key().bold(), ids.join(", ").dimmed());
    for (descriptor, _) in function.values() {
        println!("  value   {} ({})", descriptor.address, descriptor.unit);
    }
    for trigger in function.triggers() {
        println!("  trigger {}", trigger.address);
    }
    for action in function.actions() {
        println!("  action  {}", action.address);
    }
}
