use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use procflow_core::remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use procflow_core::{
    CredentialResolver, EditorGate, FileStore, JsonBinClient, RemoteDefaults, RemoteError,
};

/// Endpoint id baked in at build time, if any.
pub const BUILT_IN_ENDPOINT_ID: Option<&str> = option_env!("PROCFLOW_DEFAULT_ENDPOINT_ID");

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

fn redact<S: Serializer>(
    value: &Option<ConfigValue<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    value
        .as_ref()
        .map(|v| ConfigValue::new("<redacted>", v.source.clone()))
        .serialize(serializer)
}

/// Hosted document store settings
#[derive(Debug, Clone, Serialize)]
pub struct RemoteConfig {
    pub base_url: ConfigValue<String>,
    /// Fallback endpoint id, used when the device has no override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<ConfigValue<String>>,
    /// Endpoint id that wins over the device override (FLOW_ENDPOINT_ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_override: Option<ConfigValue<String>>,
    #[serde(serialize_with = "redact", skip_serializing_if = "Option::is_none")]
    pub read_key: Option<ConfigValue<String>>,
    /// Write key for this process only (FLOW_WRITE_KEY)
    #[serde(serialize_with = "redact", skip_serializing_if = "Option::is_none")]
    pub write_key: Option<ConfigValue<String>>,
    pub timeout_secs: ConfigValue<u64>,
}

/// Editor gate settings
#[derive(Debug, Clone, Serialize)]
pub struct EditorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase_sha256: Option<ConfigValue<String>>,
    /// Passphrase from FLOW_EDITOR_PASSPHRASE
    #[serde(skip)]
    pub passphrase: Option<String>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the device copy and device settings
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub editor: EditorConfig,
}

/// Internal structs for deserializing the config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    remote: RemoteFile,
    editor: EditorFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RemoteFile {
    base_url: Option<String>,
    endpoint_id: Option<String>,
    read_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct EditorFile {
    passphrase_sha256: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    fn load_with_env(
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |name: &str| non_blank(lookup(name));

        // Start with defaults
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut base_url = ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default);
        let mut endpoint_id = BUILT_IN_ENDPOINT_ID
            .map(|id| ConfigValue::new(id.to_string(), ConfigSource::Default));
        let mut read_key = None;
        let mut timeout_secs = ConfigValue::new(DEFAULT_TIMEOUT.as_secs(), ConfigSource::Default);
        let mut passphrase_sha256 = None;
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = non_blank(file_config.remote.base_url) {
                base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(id) = non_blank(file_config.remote.endpoint_id) {
                endpoint_id = Some(ConfigValue::new(id, ConfigSource::File));
            }
            if let Some(key) = non_blank(file_config.remote.read_key) {
                read_key = Some(ConfigValue::new(key, ConfigSource::File));
            }
            if let Some(secs) = file_config.remote.timeout_secs {
                timeout_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(digest) = non_blank(file_config.editor.passphrase_sha256) {
                passphrase_sha256 = Some(ConfigValue::new(digest, ConfigSource::File));
            }
        }

        // Apply environment variable overrides
        if let Some(dir) = env("FLOW_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(url) = env("FLOW_REMOTE_URL") {
            base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(key) = env("FLOW_READ_KEY") {
            read_key = Some(ConfigValue::new(key, ConfigSource::Environment));
        }
        if let Some(digest) = env("FLOW_EDITOR_PASSPHRASE_SHA256") {
            passphrase_sha256 = Some(ConfigValue::new(digest, ConfigSource::Environment));
        }
        let endpoint_override =
            env("FLOW_ENDPOINT_ID").map(|id| ConfigValue::new(id, ConfigSource::Environment));
        let write_key =
            env("FLOW_WRITE_KEY").map(|key| ConfigValue::new(key, ConfigSource::Environment));

        Ok(Self {
            data_dir,
            config_file,
            remote: RemoteConfig {
                base_url,
                endpoint_id,
                endpoint_override,
                read_key,
                write_key,
                timeout_secs,
            },
            editor: EditorConfig {
                passphrase_sha256,
                passphrase: env("FLOW_EDITOR_PASSPHRASE"),
            },
        })
    }

    /// Device storage rooted at the data directory.
    pub fn store(&self) -> FileStore {
        FileStore::new(self.data_dir.value.clone())
    }

    /// Endpoint and credential resolution for this configuration.
    pub fn resolver(&self) -> CredentialResolver {
        let defaults = RemoteDefaults {
            endpoint_id: self.remote.endpoint_id.as_ref().map(|v| v.value.clone()),
            read_credential: self.remote.read_key.as_ref().map(|v| v.value.clone()),
        };
        CredentialResolver::new(defaults)
            .with_explicit_endpoint(self.remote.endpoint_override.as_ref().map(|v| v.value.clone()))
            .with_session_credential(self.remote.write_key.as_ref().map(|v| v.value.clone()))
    }

    pub fn editor_gate(&self) -> EditorGate {
        EditorGate::new(
            self.editor
                .passphrase_sha256
                .as_ref()
                .map(|v| v.value.clone()),
        )
    }

    pub fn remote_client(&self) -> Result<JsonBinClient, RemoteError> {
        JsonBinClient::with_timeout(
            self.remote.base_url.value.clone(),
            Duration::from_secs(self.remote.timeout_secs.value),
        )
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/procflow/
    /// - macOS: ~/Library/Application Support/procflow/
    /// - Windows: %APPDATA%/procflow/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("procflow")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/procflow/
    /// - macOS: ~/Library/Application Support/procflow/
    /// - Windows: %APPDATA%/procflow/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("procflow")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
}
