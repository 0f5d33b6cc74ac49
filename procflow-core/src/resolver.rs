//! Effective endpoint and credentials.
//!
//! Precedence:
//! - endpoint: explicit override > device setting (`custom_bin_id`) > configured default
//! - write credential: session credential (entered at login) > device setting
//!   (`admin_master_key`) > none
//! - read credential: configured default only
//!
//! Device settings are read from the store on every query, so a settings
//! change applies to the next load or save without a restart.
//!
//! Credential lifetime: the session credential lives until
//! [`CredentialResolver::end_session`]; the device credential lives until
//! [`CredentialResolver::clear_settings`]. Ending a session never touches
//! the device credential.

use std::fmt;

use crate::auth::EditorSession;
use crate::remote::EndpointId;
use crate::store::{LocalStore, LocalStoreExt, StorageError, StorageKey};

/// Values configured for the whole installation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RemoteDefaults {
    pub endpoint_id: Option<String>,
    pub read_credential: Option<String>,
}

impl fmt::Debug for RemoteDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDefaults")
            .field("endpoint_id", &self.endpoint_id)
            .field("read_credential", &redact(&self.read_credential))
            .finish()
    }
}

/// Device-local sync settings. Never part of the synced document.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyncSettings {
    pub write_credential: Option<String>,
    pub endpoint_override: Option<String>,
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSettings")
            .field("write_credential", &redact(&self.write_credential))
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}

/// Where an effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Explicit,
    Session,
    Device,
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Explicit => write!(f, "explicit"),
            ValueSource::Session => write!(f, "session"),
            ValueSource::Device => write!(f, "device"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    defaults: RemoteDefaults,
    explicit_endpoint: Option<String>,
    session_credential: Option<String>,
}

impl CredentialResolver {
    pub fn new(defaults: RemoteDefaults) -> Self {
        Self {
            defaults,
            explicit_endpoint: None,
            session_credential: None,
        }
    }

    /// Sets an endpoint that wins over device settings and defaults.
    pub fn with_explicit_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.explicit_endpoint = non_blank(endpoint);
        self
    }

    /// Uses a session credential without going through the editor gate
    /// (e.g. a key passed through the environment).
    pub fn with_session_credential(mut self, credential: Option<String>) -> Self {
        self.session_credential = non_blank(credential);
        self
    }

    pub fn defaults(&self) -> &RemoteDefaults {
        &self.defaults
    }

    /// Effective endpoint id and its source, before plausibility checks.
    pub fn effective_endpoint_with_source<S: LocalStore + ?Sized>(
        &self,
        store: &S,
    ) -> Option<(String, ValueSource)> {
        if let Some(id) = &self.explicit_endpoint {
            return Some((id.clone(), ValueSource::Explicit));
        }
        if let Some(id) = non_blank(store.load_json(StorageKey::EndpointOverride)) {
            return Some((id, ValueSource::Device));
        }
        non_blank(self.defaults.endpoint_id.clone()).map(|id| (id, ValueSource::Default))
    }

    pub fn effective_endpoint<S: LocalStore + ?Sized>(&self, store: &S) -> Option<String> {
        self.effective_endpoint_with_source(store).map(|(id, _)| id)
    }

    /// The effective endpoint if it is plausible.
    pub fn endpoint<S: LocalStore + ?Sized>(&self, store: &S) -> Option<EndpointId> {
        let id = self.effective_endpoint(store)?;
        match EndpointId::parse(&id) {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                tracing::debug!("Ignoring endpoint id: {}", e);
                None
            }
        }
    }

    pub fn is_remote_configured<S: LocalStore + ?Sized>(&self, store: &S) -> bool {
        self.endpoint(store).is_some()
    }

    pub fn read_credential(&self) -> Option<&str> {
        self.defaults
            .read_credential
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn effective_write_credential_with_source<S: LocalStore + ?Sized>(
        &self,
        store: &S,
    ) -> Option<(String, ValueSource)> {
        if let Some(key) = &self.session_credential {
            return Some((key.clone(), ValueSource::Session));
        }
        non_blank(store.load_json(StorageKey::WriteCredential)).map(|k| (k, ValueSource::Device))
    }

    pub fn effective_write_credential<S: LocalStore + ?Sized>(&self, store: &S) -> Option<String> {
        self.effective_write_credential_with_source(store)
            .map(|(key, _)| key)
    }

    /// Adopts the credential entered at login, if one was entered.
    pub fn begin_session(&mut self, session: &EditorSession) {
        if let Some(key) = session.write_credential() {
            self.session_credential = Some(key.to_string());
        }
    }

    /// Drops the session credential. Device settings are kept.
    pub fn end_session(&mut self) {
        self.session_credential = None;
    }

    /// Current device settings.
    pub fn sync_settings<S: LocalStore + ?Sized>(&self, store: &S) -> SyncSettings {
        SyncSettings {
            write_credential: non_blank(store.load_json(StorageKey::WriteCredential)),
            endpoint_override: non_blank(store.load_json(StorageKey::EndpointOverride)),
        }
    }

    /// Persists the non-blank values of `settings`; blank values leave the
    /// stored ones alone.
    pub fn update_settings<S: LocalStore + ?Sized>(
        &self,
        store: &S,
        settings: &SyncSettings,
    ) -> Result<(), StorageError> {
        if let Some(key) = non_blank(settings.write_credential.clone()) {
            store.save_json(StorageKey::WriteCredential, &key)?;
        }
        if let Some(id) = non_blank(settings.endpoint_override.clone()) {
            store.save_json(StorageKey::EndpointOverride, &id)?;
        }
        Ok(())
    }

    /// Removes the device write credential and endpoint override.
    pub fn clear_settings<S: LocalStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        store.remove(StorageKey::WriteCredential)?;
        store.remove(StorageKey::EndpointOverride)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_session;
    use crate::store::memory::MemoryStore;

    const BIN: &str = "656f0a1b2c3d4e5f60718293";
    const OTHER_BIN: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";

    fn resolver() -> CredentialResolver {
        CredentialResolver::new(RemoteDefaults {
            endpoint_id: Some(BIN.into()),
            read_credential: Some("read".into()),
        })
    }

    #[test]
    fn test_default_endpoint() {
        let store = MemoryStore::new();
        assert_eq!(
            resolver().effective_endpoint_with_source(&store),
            Some((BIN.to_string(), ValueSource::Default))
        );
        assert!(resolver().is_remote_configured(&store));
    }

    #[test]
    fn test_device_override_beats_default() {
        let store = MemoryStore::new();
        store
            .save_json(StorageKey::EndpointOverride, OTHER_BIN)
            .unwrap();
        assert_eq!(resolver().effective_endpoint(&store).as_deref(), Some(OTHER_BIN));
    }

    #[test]
    fn test_explicit_override_beats_device() {
        let store = MemoryStore::new();
        store
            .save_json(StorageKey::EndpointOverride, OTHER_BIN)
            .unwrap();
        let resolver = resolver().with_explicit_endpoint(Some("explicit-endpoint-01".into()));
        assert_eq!(
            resolver.effective_endpoint_with_source(&store),
            Some(("explicit-endpoint-01".to_string(), ValueSource::Explicit))
        );
    }

    #[test]
    fn test_blank_override_is_skipped() {
        let store = MemoryStore::new();
        store.save_json(StorageKey::EndpointOverride, "  ").unwrap();
        let resolver = resolver().with_explicit_endpoint(Some("".into()));
        assert_eq!(resolver.effective_endpoint(&store).as_deref(), Some(BIN));
    }

    #[test]
    fn test_placeholder_endpoint_is_not_configured() {
        let store = MemoryStore::new();
        let resolver = CredentialResolver::new(RemoteDefaults {
            endpoint_id: Some("656xxx".into()),
            read_credential: None,
        });
        assert_eq!(resolver.effective_endpoint(&store).as_deref(), Some("656xxx"));
        assert!(!resolver.is_remote_configured(&store));
        assert!(!CredentialResolver::default().is_remote_configured(&store));
    }

    #[test]
    fn test_settings_change_applies_without_reload() {
        let store = MemoryStore::new();
        let resolver = CredentialResolver::default();
        assert!(!resolver.is_remote_configured(&store));

        resolver
            .update_settings(
                &store,
                &SyncSettings {
                    write_credential: None,
                    endpoint_override: Some(BIN.into()),
                },
            )
            .unwrap();

        assert!(resolver.is_remote_configured(&store));
    }

    #[test]
    fn test_write_credential_precedence() {
        let store = MemoryStore::new();
        let mut resolver = resolver();
        assert_eq!(resolver.effective_write_credential(&store), None);

        store
            .save_json(StorageKey::WriteCredential, "device-key")
            .unwrap();
        assert_eq!(
            resolver.effective_write_credential_with_source(&store),
            Some(("device-key".to_string(), ValueSource::Device))
        );

        resolver.begin_session(&test_session(Some("login-key")));
        assert_eq!(
            resolver.effective_write_credential_with_source(&store),
            Some(("login-key".to_string(), ValueSource::Session))
        );

        resolver.end_session();
        assert_eq!(
            resolver.effective_write_credential(&store).as_deref(),
            Some("device-key")
        );
    }

    #[test]
    fn test_session_without_credential_keeps_device_key() {
        let store = MemoryStore::new();
        store
            .save_json(StorageKey::WriteCredential, "device-key")
            .unwrap();
        let mut resolver = resolver();
        resolver.begin_session(&test_session(None));
        assert_eq!(
            resolver.effective_write_credential(&store).as_deref(),
            Some("device-key")
        );
    }

    #[test]
    fn test_update_settings_ignores_blank_values() {
        let store = MemoryStore::new();
        let resolver = resolver();
        resolver
            .update_settings(
                &store,
                &SyncSettings {
                    write_credential: Some("k1".into()),
                    endpoint_override: Some(OTHER_BIN.into()),
                },
            )
            .unwrap();
        resolver
            .update_settings(
                &store,
                &SyncSettings {
                    write_credential: Some(" ".into()),
                    endpoint_override: None,
                },
            )
            .unwrap();

        let settings = resolver.sync_settings(&store);
        assert_eq!(settings.write_credential.as_deref(), Some("k1"));
        assert_eq!(settings.endpoint_override.as_deref(), Some(OTHER_BIN));
    }

    #[test]
    fn test_clear_settings() {
        let store = MemoryStore::new();
        let resolver = resolver();
        resolver
            .update_settings(
                &store,
                &SyncSettings {
                    write_credential: Some("k1".into()),
                    endpoint_override: Some(OTHER_BIN.into()),
                },
            )
            .unwrap();

        resolver.clear_settings(&store).unwrap();

        assert_eq!(resolver.sync_settings(&store), SyncSettings::default());
        assert_eq!(resolver.effective_endpoint(&store).as_deref(), Some(BIN));
    }

    #[test]
    fn test_debug_output_redacts_keys() {
        let settings = SyncSettings {
            write_credential: Some("top-secret".into()),
            endpoint_override: None,
        };
        assert!(!format!("{:?}", settings).contains("top-secret"));
        assert!(!format!("{:?}", resolver().defaults()).contains("\"read\""));
    }
}
