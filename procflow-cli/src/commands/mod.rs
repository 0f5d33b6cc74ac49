use clap::ValueEnum;

mod config_cmd;
mod footer;
mod push;
mod reset;
mod settings;
mod show;
mod step;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use footer::FooterCommand;
pub use push::PushCommand;
pub use reset::ResetCommand;
pub use settings::SettingsCommand;
pub use show::ShowCommand;
pub use step::StepCommand;
pub use sync_cmd::SyncCommand;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
