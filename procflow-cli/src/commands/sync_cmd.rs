//! Sync CLI commands: fetch the cloud copy and report the sync state.

use clap::{Args, Subcommand};

use procflow_core::{LoadReport, RemoteLoad, SyncStatus};

use crate::config::Config;
use crate::context::{self, CommandError};

/// Fetch the cloud copy and save it on this device
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show the endpoint in use and the current sync state
    Status,
}

impl SyncCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        match &self.command {
            None => self.sync(config).await,
            Some(SyncSubcommand::Status) => self.status(config).await,
        }
    }

    async fn sync(&self, config: &Config) -> Result<(), CommandError> {
        let (_, report) = context::open(config).await?;
        for line in describe_load(&report) {
            println!("{}", line);
        }
        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), CommandError> {
        let store = config.store();
        let resolver = config.resolver();

        println!("Sync Configuration");
        println!("==================");
        println!();

        match resolver.effective_endpoint_with_source(&store) {
            Some((endpoint, source)) => {
                println!("Endpoint:  {} ({})", endpoint, source);
                println!("Server:    {}", config.remote.base_url.value);
            }
            None => {
                println!("Status: Not configured");
                println!();
                println!("To enable sync, set an endpoint with:");
                println!("  flow settings set --endpoint <ID>");
                println!();
                println!("Or set environment variable:");
                println!("  FLOW_ENDPOINT_ID");
                return Ok(());
            }
        }
        match resolver.effective_write_credential_with_source(&store) {
            Some((_, source)) => println!("Write key: set ({})", source),
            None => println!("Write key: not set (read only)"),
        }
        println!();

        let (coordinator, _) = context::open(config).await?;
        println!("{}", describe_status(&coordinator.status()));
        Ok(())
    }
}

fn describe_load(report: &LoadReport) -> Vec<String> {
    let mut lines = Vec::new();
    let device = match (report.local_document, report.local_config) {
        (false, false) => "No procedure saved on this device; using the built-in one.",
        (true, true) => "Loaded the procedure saved on this device.",
        _ => "Loaded part of the procedure from this device; the rest is built in.",
    };
    lines.push(device.to_string());

    match &report.remote {
        RemoteLoad::NotConfigured => {
            lines.push("No cloud endpoint configured.".to_string());
        }
        RemoteLoad::Synced { document, config } => {
            let fetched = match (document, config) {
                (true, true) => "steps and footer",
                (true, false) => "steps",
                (false, true) => "footer",
                (false, false) => "nothing",
            };
            lines.push(format!(
                "✓ Fetched {} from the cloud and saved on this device.",
                fetched
            ));
        }
        RemoteLoad::PendingLocal => {
            lines.push(
                "✗ Local changes not yet published; the cloud copy was not fetched. Run 'flow push' to publish them."
                    .to_string(),
            );
        }
        RemoteLoad::Failed(e) => {
            lines.push(format!("✗ Cloud read failed: {}", e));
        }
    }
    lines
}

fn describe_status(status: &SyncStatus) -> String {
    match &status.issue {
        Some(issue) => format!("State: {} ({})", status.mode, issue),
        None if status.pending_remote => {
            format!("State: {} (local changes not yet published)", status.mode)
        }
        None => format!("State: {}", status.mode),
    }
}
