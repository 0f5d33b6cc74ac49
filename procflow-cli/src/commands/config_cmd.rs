use clap::{Args, Subcommand};
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;

use procflow_core::hash_passphrase;
use procflow_core::remote::DEFAULT_BASE_URL;

use super::OutputFormat;
use crate::config::{Config, ConfigValue};
use crate::context::CommandError;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,

    /// Print the SHA-256 digest of an editor passphrase for the config file
    HashPassphrase {
        passphrase: String,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config, config_path: Option<&Path>) -> Result<(), CommandError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print!("{}", render_config(config)),
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config_path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(Config::default_config_path);
                init_config(&config_path)
            }

            ConfigSubcommand::HashPassphrase { passphrase } => {
                println!("{}", hash_passphrase(passphrase));
                Ok(())
            }
        }
    }
}

fn init_config(config_path: &Path) -> Result<(), CommandError> {
    if config_path.exists() {
        println!("Config file already exists: {}", config_path.display());
        println!("Use 'flow config show' to view current configuration.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(config_path)?;
    file.write_all(config_template().as_bytes())?;

    println!("Created config file: {}", config_path.display());
    println!("\nEdit this file to customize your settings.");
    Ok(())
}

fn config_template() -> String {
    format!(
        r#"# procflow configuration

# Where the device copy and device settings live
# (default: ~/.local/share/procflow)
# data_dir: ~/.local/share/procflow

remote:
  # Hosted document store
  base_url: {}
  # Document to read and publish; a device override
  # ('flow settings set --endpoint') wins over this
  # endpoint_id: 656f0a1b2c3d4e5f60718293
  # Key sent on reads, if the document is private
  # read_key: ...
  timeout_secs: 15

# editor:
#   # Output of 'flow config hash-passphrase <PASSPHRASE>'
#   passphrase_sha256: ...
"#,
        DEFAULT_BASE_URL
    )
}

fn push_value<T: Display>(out: &mut String, name: &str, value: Option<&ConfigValue<T>>) {
    match value {
        Some(v) => out.push_str(&format!("{}: {}\n  source: {}\n\n", name, v.value, v.source)),
        None => out.push_str(&format!("{}: <not set>\n\n", name)),
    }
}

fn push_secret<T>(out: &mut String, name: &str, value: Option<&ConfigValue<T>>) {
    match value {
        Some(v) => out.push_str(&format!("{}: <set>\n  source: {}\n\n", name, v.source)),
        None => out.push_str(&format!("{}: <not set>\n\n", name)),
    }
}

fn render_config(config: &Config) -> String {
    let mut out = String::from("Configuration\n=============\n\n");

    match &config.config_file {
        Some(path) => out.push_str(&format!("Config file: {}\n\n", path.display())),
        None => out.push_str(&format!(
            "Config file: {} (not found)\n\n",
            Config::default_config_path().display()
        )),
    }

    out.push_str(&format!(
        "data_dir: {}\n  source: {}\n\n",
        config.data_dir.value.display(),
        config.data_dir.source
    ));

    let remote = &config.remote;
    push_value(&mut out, "remote.base_url", Some(&remote.base_url));
    push_value(&mut out, "remote.endpoint_id", remote.endpoint_id.as_ref());
    push_value(&mut out, "remote.endpoint_override", remote.endpoint_override.as_ref());
    push_secret(&mut out, "remote.read_key", remote.read_key.as_ref());
    push_secret(&mut out, "remote.write_key", remote.write_key.as_ref());
    push_value(&mut out, "remote.timeout_secs", Some(&remote.timeout_secs));
    push_secret(
        &mut out,
        "editor.passphrase_sha256",
        config.editor.passphrase_sha256.as_ref(),
    );
    out
}
