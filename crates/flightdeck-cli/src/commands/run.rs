//! Live bridge: run the interface service and print its events.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use flightdeck_interface::{InterfaceService, Profile};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::commands::RunArgs;
use crate::error::CliError;
use crate::output;

pub async fn execute(args: &RunArgs, json: bool) -> Result<()> {
    let mut profile = Profile::load(&args.profile).map_err(CliError::from)?;
    if let Some(listen) = args.listen {
        profile.interface.listen_addr = listen;
    }
    if let Some(remote) = args.remote {
        profile.interface.remote_addr = Some(remote);
    }
    if let Some(driver) = &args.driver {
        profile.interface.expected_driver = Some(driver.clone());
    }
    profile.interface.validate().map_err(CliError::from)?;
    let registry = profile.build_registry().map_err(CliError::from)?;

    let (handle, task) = InterfaceService::spawn(profile.interface.clone(), registry)
        .await
        .map_err(CliError::from)?;
    let mut events = handle.subscribe();

    if !json {
        println!(
            "{} listening on {} ({} functions)",
            "●".green(),
            handle.local_addr(),
            profile.functions.len()
        );
    }

    let stop_after = args.duration.map(Duration::from_secs);
    let deadline = tokio::time::sleep(stop_after.unwrap_or(Duration::MAX));
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C");
                break;
            }
            () = &mut deadline, if stop_after.is_some() => {
                info!("Run duration elapsed");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => output::print_event(&event, json)?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event output lagged; events were dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await;
    task.await?;
    Ok(())
}
