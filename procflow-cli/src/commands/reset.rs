use clap::Args;

use crate::config::Config;
use crate::context::{self, CommandError};

/// Forget the procedure saved on this device and go back to the built-in one.
///
/// Device settings and the cloud copy are not touched; the next command that
/// reads from the cloud fetches it again.
#[derive(Args)]
pub struct ResetCommand {
    /// Confirm the reset
    #[arg(long)]
    yes: bool,

    /// Editor passphrase (defaults to FLOW_EDITOR_PASSPHRASE)
    #[arg(long)]
    passphrase: Option<String>,
}

impl ResetCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        if !self.yes {
            return Err(CommandError::InvalidArgument(
                "This removes the procedure saved on this device. Re-run with --yes to confirm."
                    .to_string(),
            ));
        }

        let editor = context::login(config, self.passphrase.as_deref())?;
        let (mut coordinator, _) = context::open(config).await?;
        let session = coordinator.begin_session(&editor);

        coordinator.reset_to_defaults(&session)?;
        coordinator.end_session(session);

        println!("Removed the device copy. Showing the built-in procedure until the next sync.");
        Ok(())
    }
}
