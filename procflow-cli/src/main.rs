use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod context;

use commands::{
    ConfigCommand, FooterCommand, PushCommand, ResetCommand, SettingsCommand, ShowCommand,
    StepCommand, SyncCommand,
};
use config::Config;
use context::CommandError;

#[derive(Parser)]
#[command(name = "flow")]
#[command(version)]
#[command(about = "View and edit a shared purchasing procedure", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log sync activity to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the procedure for a purchase amount
    Show(ShowCommand),

    /// Show or edit one step
    Step(StepCommand),

    /// Show or edit the version label and attribution
    Footer(FooterCommand),

    /// Publish the current procedure to the cloud
    Push(PushCommand),

    /// Forget the device copy and use the built-in procedure
    Reset(ResetCommand),

    /// Manage the device write key and endpoint override
    Settings(SettingsCommand),

    /// Fetch the cloud copy, or show sync status
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(execute_command(&cli.command, &config, cli_config_path))?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "procflow_core=debug,flow=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn execute_command(
    command: &Option<Commands>,
    config: &Config,
    cli_config_path: Option<PathBuf>,
) -> Result<(), CommandError> {
    match command {
        Some(Commands::Show(cmd)) => cmd.run(config).await,
        Some(Commands::Step(cmd)) => cmd.run(config).await,
        Some(Commands::Footer(cmd)) => cmd.run(config).await,
        Some(Commands::Push(cmd)) => cmd.run(config).await,
        Some(Commands::Reset(cmd)) => cmd.run(config).await,
        Some(Commands::Settings(cmd)) => cmd.run(config).await,
        Some(Commands::Sync(cmd)) => cmd.run(config).await,
        Some(Commands::Config(cmd)) => cmd.run(config, cli_config_path.as_deref()),
        None => {
            println!("Use --help to see available commands");
            Ok(())
        }
    }
}
