//! Device sync settings: the stored write key and endpoint override.
//!
//! These never leave the device and are read fresh on every load or save.

use clap::{Args, Subcommand};

use procflow_core::remote::EndpointId;
use procflow_core::SyncSettings;

use crate::config::Config;
use crate::context::{self, CommandError};

#[derive(Args)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub command: SettingsSubcommand,
}

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show device settings and the values in effect
    Show,

    /// Store a write key and/or endpoint override on this device
    Set {
        /// Write key for the cloud document
        #[arg(long)]
        write_key: Option<String>,

        /// Endpoint id to use instead of the configured one
        #[arg(long)]
        endpoint: Option<String>,

        /// Editor passphrase (defaults to FLOW_EDITOR_PASSPHRASE)
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Remove the stored write key and endpoint override
    Clear {
        /// Editor passphrase (defaults to FLOW_EDITOR_PASSPHRASE)
        #[arg(long)]
        passphrase: Option<String>,
    },
}

impl SettingsCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let store = config.store();
        let resolver = config.resolver();

        match &self.command {
            SettingsSubcommand::Show => {
                let device = resolver.sync_settings(&store);

                println!("Device settings");
                println!("===============\n");
                println!(
                    "write_key: {}",
                    if device.write_credential.is_some() { "<set>" } else { "<not set>" }
                );
                println!(
                    "endpoint:  {}",
                    device.endpoint_override.as_deref().unwrap_or("<not set>")
                );
                println!();

                println!("In effect");
                println!("=========\n");
                match resolver.effective_endpoint_with_source(&store) {
                    Some((endpoint, source)) => println!("endpoint:  {}\n  source: {}", endpoint, source),
                    None => println!("endpoint:  <none>"),
                }
                match resolver.effective_write_credential_with_source(&store) {
                    Some((_, source)) => println!("write_key: <set>\n  source: {}", source),
                    None => println!("write_key: <none>"),
                }
                println!(
                    "cloud:     {}",
                    if resolver.is_remote_configured(&store) { "enabled" } else { "disabled" }
                );
                Ok(())
            }

            SettingsSubcommand::Set {
                write_key,
                endpoint,
                passphrase,
            } => {
                let (settings, warning) = settings_from_args(write_key.as_deref(), endpoint.as_deref())?;
                context::login(config, passphrase.as_deref())?;

                resolver.update_settings(&store, &settings)?;
                if let Some(warning) = warning {
                    eprintln!("Warning: {}", warning);
                }
                println!("Saved device settings. They apply from the next command.");
                Ok(())
            }

            SettingsSubcommand::Clear { passphrase } => {
                context::login(config, passphrase.as_deref())?;
                resolver.clear_settings(&store)?;
                println!("Removed the stored write key and endpoint override.");
                Ok(())
            }
        }
    }
}

/// Validates `settings set` flags. An implausible endpoint is still stored,
/// with a warning, since the cloud decides what exists.
fn settings_from_args(
    write_key: Option<&str>,
    endpoint: Option<&str>,
) -> Result<(SyncSettings, Option<String>), CommandError> {
    let write_key = write_key.map(str::trim).filter(|k| !k.is_empty());
    let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty());

    if write_key.is_none() && endpoint.is_none() {
        return Err(CommandError::InvalidArgument(
            "Nothing to save. Pass --write-key and/or --endpoint.".to_string(),
        ));
    }

    let warning = endpoint
        .and_then(|id| EndpointId::parse(id).err())
        .map(|e| format!("{}. Saved anyway; loads will skip the cloud until it is fixed.", e));

    Ok((
        SyncSettings {
            write_credential: write_key.map(str::to_string),
            endpoint_override: endpoint.map(str::to_string),
        },
        warning,
    ))
}
