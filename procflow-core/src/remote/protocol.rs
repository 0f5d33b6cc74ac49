//! Wire types for the hosted JSON document store.
//!
//! The store keeps one JSON document per endpoint ("bin"):
//!
//! ```text
//! GET {base}/{endpoint}/latest   X-Access-Key: <read key>   (optional)
//! PUT {base}/{endpoint}          X-Master-Key: <write key>  (required)
//! body: { "workflowData": [...], "appConfig": {...} }
//! ```
//!
//! JSONBin wraps reads in `{"record": ..., "metadata": ...}` unless asked
//! not to; both forms are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::RemoteError;
use crate::models::{AppConfig, WorkflowDocument};

/// Default base URL of the hosted store.
pub const DEFAULT_BASE_URL: &str = "https://api.jsonbin.io/v3/b";
/// Header carrying the write credential.
pub const MASTER_KEY_HEADER: &str = "X-Master-Key";
/// Header carrying the optional read credential.
pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";
/// Asks the store to return the bare record without metadata.
pub const BIN_META_HEADER: &str = "X-Bin-Meta";

/// Shortest endpoint id accepted as real rather than a placeholder.
pub const MIN_ENDPOINT_ID_LEN: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Endpoint id is empty")]
    Empty,

    #[error("Endpoint id '{0}' is too short to be real")]
    TooShort(String),

    #[error("Endpoint id '{0}' contains characters other than letters, digits, '-' or '_'")]
    InvalidCharacters(String),
}

/// A plausible document endpoint id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let id = input.trim();
        if id.is_empty() {
            return Err(EndpointError::Empty);
        }
        if id.len() < MIN_ENDPOINT_ID_LEN {
            return Err(EndpointError::TooShort(id.to_string()));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(EndpointError::InvalidCharacters(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The shared document as exchanged with the store. Either field may be
/// missing on read; writes always carry both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_data: Option<WorkflowDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_config: Option<AppConfig>,
}

impl RemoteSnapshot {
    pub fn full(workflow_data: WorkflowDocument, app_config: AppConfig) -> Self {
        Self {
            workflow_data: Some(workflow_data),
            app_config: Some(app_config),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workflow_data.is_none() && self.app_config.is_none()
    }
}

/// Decodes a read response body.
///
/// Fails when the body is not JSON, does not match the document shape
/// (duplicate step ids included), or carries neither field.
pub fn decode_snapshot(body: &[u8]) -> Result<RemoteSnapshot, RemoteError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| RemoteError::Malformed(e.to_string()))?;

    let value = match value {
        serde_json::Value::Object(mut map)
            if !map.contains_key("workflowData")
                && !map.contains_key("appConfig")
                && map.contains_key("record") =>
        {
            map.remove("record").unwrap_or_default()
        }
        other => other,
    };

    let snapshot: RemoteSnapshot =
        serde_json::from_value(value).map_err(|e| RemoteError::Malformed(e.to_string()))?;

    if snapshot.is_empty() {
        return Err(RemoteError::Malformed(
            "neither workflowData nor appConfig present".to_string(),
        ));
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_id_accepts_plausible_ids() {
        let id = EndpointId::parse(" 656f0a1b2c3d4e5f60718293 ").unwrap();
        assert_eq!(id.as_str(), "656f0a1b2c3d4e5f60718293");
    }

    #[test]
    fn test_endpoint_id_rejects_placeholders() {
        assert_eq!(EndpointId::parse(""), Err(EndpointError::Empty));
        assert_eq!(EndpointId::parse("   "), Err(EndpointError::Empty));
        assert!(matches!(
            EndpointId::parse("656xxx"),
            Err(EndpointError::TooShort(_))
        ));
        assert!(matches!(
            EndpointId::parse("your bin id goes here"),
            Err(EndpointError::InvalidCharacters(_))
        ));
        assert!(matches!(
            EndpointId::parse("../../etc/passwd"),
            Err(EndpointError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_decode_bare_snapshot() {
        let body = br#"{"workflowData": [{"id": "a", "title": "A"}], "appConfig": {"version": "v2", "authority": "Office"}}"#;
        let snapshot = decode_snapshot(body).unwrap();
        assert_eq!(snapshot.workflow_data.unwrap().len(), 1);
        assert_eq!(snapshot.app_config.unwrap().version, "v2");
    }

    #[test]
    fn test_decode_unwraps_record_envelope() {
        let body = br#"{"record": {"appConfig": {"version": "v3", "authority": "x"}}, "metadata": {"id": "abc"}}"#;
        let snapshot = decode_snapshot(body).unwrap();
        assert!(snapshot.workflow_data.is_none());
        assert_eq!(snapshot.app_config.unwrap().version, "v3");
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert!(matches!(
            decode_snapshot(b"{}"),
            Err(RemoteError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode_snapshot(b"<html>oops</html>"),
            Err(RemoteError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_duplicate_ids() {
        let body = br#"{"workflowData": [{"id": 1, "title": "a"}, {"id": 1, "title": "b"}]}"#;
        let err = decode_snapshot(body).unwrap_err();
        assert!(err.to_string().contains("Duplicate step id"));
    }

    #[test]
    fn test_full_snapshot_serializes_both_fields() {
        let snapshot = RemoteSnapshot::full(WorkflowDocument::default(), AppConfig::default());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("workflowData").unwrap().is_array());
        assert!(json.get("appConfig").unwrap().is_object());
    }
}
