//! Editor gate.
//!
//! Editing requires a passphrase whose SHA-256 digest is supplied by
//! external configuration. The program never carries the passphrase
//! itself. A successful check yields an [`EditorSession`], the only way
//! to open an edit session.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Editing is disabled: no editor passphrase digest is configured")]
    NotConfigured,

    #[error("Invalid editor passphrase")]
    InvalidPassphrase,
}

/// Returns the lowercase hex SHA-256 digest of a passphrase.
pub fn hash_passphrase(passphrase: &str) -> String {
    format!("{:x}", Sha256::digest(passphrase.as_bytes()))
}

/// Compares two digests without stopping at the first difference.
fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Verifies editor passphrases against a configured digest.
#[derive(Debug, Clone, Default)]
pub struct EditorGate {
    passphrase_sha256: Option<String>,
}

impl EditorGate {
    /// Creates a gate. A blank digest means no editor is configured.
    pub fn new(passphrase_sha256: Option<String>) -> Self {
        Self {
            passphrase_sha256: passphrase_sha256
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.passphrase_sha256.is_some()
    }

    /// Checks a passphrase. The optional write credential entered alongside
    /// it becomes the session credential.
    pub fn verify(
        &self,
        passphrase: &str,
        write_credential: Option<String>,
    ) -> Result<EditorSession, AuthError> {
        let expected = self
            .passphrase_sha256
            .as_deref()
            .ok_or(AuthError::NotConfigured)?;

        if !digests_match(&hash_passphrase(passphrase), expected) {
            tracing::warn!("Editor passphrase rejected");
            return Err(AuthError::InvalidPassphrase);
        }

        Ok(EditorSession {
            write_credential: write_credential
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        })
    }
}

/// Proof that the editor gate was passed.
pub struct EditorSession {
    write_credential: Option<String>,
}

impl EditorSession {
    /// Write credential entered at login, if any.
    pub fn write_credential(&self) -> Option<&str> {
        self.write_credential.as_deref()
    }
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field(
                "write_credential",
                &self.write_credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_session(write_credential: Option<&str>) -> EditorSession {
    EditorSession {
        write_credential: write_credential.map(str::to_string),
    }
}
