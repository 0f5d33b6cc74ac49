use clap::Args;

use crate::config::Config;
use crate::context::{self, CommandError};

/// Publish the procedure as it is now, without editing it.
///
/// Useful to seed a new endpoint, or to retry after a failed publish: until
/// a publish succeeds, this device keeps its own copy instead of the cloud's.
#[derive(Args)]
pub struct PushCommand {
    /// Editor passphrase (defaults to FLOW_EDITOR_PASSPHRASE)
    #[arg(long)]
    passphrase: Option<String>,
}

impl PushCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let editor = context::login(config, self.passphrase.as_deref())?;
        let (mut coordinator, _) = context::open(config).await?;
        let session = coordinator.begin_session(&editor);

        let report = coordinator.publish(&session).await?;
        coordinator.end_session(session);

        context::print_save_report(&report);
        Ok(())
    }
}
