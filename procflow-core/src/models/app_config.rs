use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_VERSION: &str = "2025/12/01";
pub const DEFAULT_AUTHORITY: &str =
    "The latest version of this document is the one published by the Program Office, Group A1";

/// Footer record shown under the procedure: version label and attribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub version: String,
    pub authority: String,
}

impl AppConfig {
    pub fn new(version: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            authority: authority.into(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION, DEFAULT_AUTHORITY)
    }
}

impl fmt::Display for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version {} | {}", self.version, self.authority)
    }
}
