use clap::{Args, Subcommand};

use procflow_core::ConfigDraft;

use super::OutputFormat;
use crate::config::Config;
use crate::context::{self, CommandError};

#[derive(Args)]
pub struct FooterCommand {
    #[command(subcommand)]
    pub command: FooterSubcommand,
}

#[derive(Subcommand)]
pub enum FooterSubcommand {
    /// Show the version label and attribution
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change the version label or attribution and publish it
    Edit {
        /// Version label, e.g. 2026/01/15
        #[arg(long)]
        version: Option<String>,

        /// Attribution line
        #[arg(long)]
        authority: Option<String>,

        /// Editor passphrase (defaults to FLOW_EDITOR_PASSPHRASE)
        #[arg(long)]
        passphrase: Option<String>,
    },
}

impl FooterCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        match &self.command {
            FooterSubcommand::Show { format } => {
                let (coordinator, _) = context::open(config).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(coordinator.config())?)
                    }
                    OutputFormat::Text => println!("{}", coordinator.config()),
                }
                Ok(())
            }

            FooterSubcommand::Edit {
                version,
                authority,
                passphrase,
            } => {
                let editor = context::login(config, passphrase.as_deref())?;
                let (mut coordinator, _) = context::open(config).await?;
                let mut session = coordinator.begin_session(&editor);

                coordinator.edit_config(&mut session);
                let changed = match session.config_draft_mut() {
                    Some(draft) => apply_footer(draft, version.as_deref(), authority.as_deref()),
                    None => false,
                };
                if !changed {
                    return Err(CommandError::InvalidArgument(
                        "Nothing to change. Pass --version and/or --authority.".to_string(),
                    ));
                }

                let report = coordinator.commit(&mut session).await?;
                coordinator.end_session(session);

                context::print_save_report(&report);
                println!();
                println!("{}", coordinator.config());
                Ok(())
            }
        }
    }
}

fn apply_footer(draft: &mut ConfigDraft, version: Option<&str>, authority: Option<&str>) -> bool {
    let mut changed = false;
    if let Some(version) = version {
        draft.version = version.trim().to_string();
        changed = true;
    }
    if let Some(authority) = authority {
        draft.authority = authority.trim().to_string();
        changed = true;
    }
    changed
}
