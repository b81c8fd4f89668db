//! On-disk layout of the persisted global state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current state.json format version
pub const STATE_FORMAT_VERSION: &str = "1";

/// Contents of state.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State format version
    pub format_version: String,

    /// Last time any entry was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Key/value entries; values other than strings are kept as-is
    #[serde(default)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            format_version: STATE_FORMAT_VERSION.to_string(),
            updated_at: None,
            entries: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Mark the state as written now
    pub fn touch(&mut self) {
        self.format_version = STATE_FORMAT_VERSION.to_string();
        self.updated_at = Some(Utc::now());
    }
}
