//! Shared setup for commands: loading the procedure, logging in as an
//! editor, and reporting save outcomes.

use thiserror::Error;

use procflow_core::{
    AuthError, DraftError, EditorSession, FileStore, JsonBinClient, LoadReport,
    RemoteError, RemoteLoad, RemoteSave, SaveReport, StorageError, SyncCoordinator, SyncError,
};

use crate::config::{Config, ConfigError};

pub type Coordinator = SyncCoordinator<FileStore, JsonBinClient>;

/// Errors surfaced by commands.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Editor passphrase required. Pass --passphrase or set FLOW_EDITOR_PASSPHRASE.")]
    PassphraseRequired,

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Builds the coordinator and runs the load sequence.
///
/// A cloud read failure is only a warning; the device copy is used.
pub async fn open(config: &Config) -> Result<(Coordinator, LoadReport), CommandError> {
    let client = config.remote_client()?;
    let mut coordinator = SyncCoordinator::new(config.store(), client, config.resolver());
    let report = coordinator.load().await;
    tracing::debug!(?report, data_dir = %config.data_dir.value.display(), "Loaded procedure");

    if let Some(warning) = load_warning(&report) {
        eprintln!("Warning: {}", warning);
    }

    Ok((coordinator, report))
}

/// Warning for a load that did not use the cloud copy.
pub fn load_warning(report: &LoadReport) -> Option<String> {
    match &report.remote {
        RemoteLoad::Failed(e) => Some(format!(
            "could not read the cloud copy ({}). Showing data saved on this device.",
            e
        )),
        RemoteLoad::PendingLocal => Some(
            "local changes not yet published. Showing data saved on this device; run 'flow push' to publish them."
                .to_string(),
        ),
        RemoteLoad::NotConfigured | RemoteLoad::Synced { .. } => None,
    }
}

/// Verifies the editor passphrase from `--passphrase` or FLOW_EDITOR_PASSPHRASE.
pub fn login(config: &Config, passphrase: Option<&str>) -> Result<EditorSession, CommandError> {
    let passphrase = passphrase
        .map(str::to_string)
        .or_else(|| config.editor.passphrase.clone())
        .ok_or(CommandError::PassphraseRequired)?;

    Ok(config.editor_gate().verify(&passphrase, None)?)
}

/// Message for a save whose local write succeeded, plus a warning when the
/// change did not reach the cloud.
pub fn describe_save(report: &SaveReport) -> (String, Option<String>) {
    match &report.remote {
        RemoteSave::Synced => ("Saved and published to the cloud.".to_string(), None),
        RemoteSave::LocalOnly => (
            "Saved on this device. No cloud endpoint is configured.".to_string(),
            None,
        ),
        RemoteSave::CredentialNeeded => (
            "Saved on this device.".to_string(),
            Some(
                "Not published: no write key. Add one with 'flow settings set --write-key <KEY>'."
                    .to_string(),
            ),
        ),
        RemoteSave::Failed(e) if e.needs_settings() => (
            "Saved on this device.".to_string(),
            Some(format!(
                "Not published: the cloud rejected the write key ({}). Update it with 'flow settings set --write-key <KEY>'.",
                e
            )),
        ),
        RemoteSave::Failed(e) => (
            "Saved on this device.".to_string(),
            Some(format!("Not published: {}", e)),
        ),
    }
}

pub fn print_save_report(report: &SaveReport) {
    let (message, warning) = describe_save(report);
    println!("{}", message);
    if let Some(warning) = warning {
        eprintln!("Warning: {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_core::hash_passphrase;
    use tempfile::tempdir;

    fn report(remote: RemoteSave) -> SaveReport {
        SaveReport {
            saved: Vec::new(),
            remote,
        }
    }

    #[test]
    fn test_describe_published_save() {
        let (message, warning) = describe_save(&report(RemoteSave::Synced));
        assert!(message.contains("published"));
        assert!(warning.is_none());
    }

    #[test]
    fn test_describe_missing_credential_points_to_settings() {
        let (_, warning) = describe_save(&report(RemoteSave::CredentialNeeded));
        assert!(warning.unwrap().contains("flow settings set --write-key"));
    }

    #[test]
    fn test_describe_rejected_key_points_to_settings() {
        let (_, warning) = describe_save(&report(RemoteSave::Failed(RemoteError::Unauthorized(403))));
        assert!(warning.unwrap().contains("flow settings set"));

        let (_, warning) = describe_save(&report(RemoteSave::Failed(RemoteError::Http(500))));
        assert!(!warning.unwrap().contains("flow settings set"));
    }

    fn loaded(remote: RemoteLoad) -> LoadReport {
        LoadReport {
            local_document: true,
            local_config: true,
            remote,
        }
    }

    #[test]
    fn test_unpublished_changes_point_to_push() {
        let warning = load_warning(&loaded(RemoteLoad::PendingLocal)).unwrap();
        assert!(warning.starts_with("local changes not yet published"));
        assert!(warning.contains("flow push"));

        assert!(load_warning(&loaded(RemoteLoad::Failed(RemoteError::Http(502))))
            .unwrap()
            .contains("could not read the cloud copy"));
        assert!(load_warning(&loaded(RemoteLoad::NotConfigured)).is_none());
    }

    #[test]
    fn test_login_requires_passphrase() {
        let dir = tempdir().unwrap();
        let mut config = Config::load(Some(dir.path().join("none.yaml"))).unwrap();
        config.editor.passphrase = None;

        assert!(matches!(
            login(&config, None),
            Err(CommandError::PassphraseRequired)
        ));
    }

    #[test]
    fn test_login_checks_configured_digest() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            format!("editor:\n  passphrase_sha256: {}\n", hash_passphrase("pw")),
        )
        .unwrap();
        let config = Config::load(Some(config_path)).unwrap();

        assert!(login(&config, Some("pw")).is_ok());
        assert!(matches!(
            login(&config, Some("nope")),
            Err(CommandError::Auth(AuthError::InvalidPassphrase))
        ));
    }
}
