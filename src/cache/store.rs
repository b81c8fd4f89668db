//! Global state store - persisted key/value entries in state.json

#[cfg(test)]
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::cache::meta::StateFile;

/// State file name
pub const STATE_FILE: &str = "state.json";

/// Failures reading or writing persisted state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid state: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key/value storage scoped to the whole installation
pub trait GlobalState: Send + Sync {
    /// Read a string entry; non-string values read as absent
    fn get(&self, key: &str) -> Option<String>;

    /// Write an entry, or remove it when `value` is `None`
    fn update(&self, key: &str, value: Option<&str>) -> Result<(), StateError>;
}

/// Path of state.json inside a state directory
pub fn state_file(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE)
}

/// Read state.json; a missing file is empty state
pub fn read_state(path: &Path) -> Result<StateFile, StateError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StateFile::default()),
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Write state.json via a temp file and rename
pub fn write_state(path: &Path, state: &StateFile) -> Result<(), StateError> {
    let write_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
    fs::write(&tmp, json).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

/// File-backed global state, written through on update.
///
/// Each update re-reads state.json and applies its one change on top, so
/// processes touching different keys do not undo each other. Two processes
/// updating at the same instant still race; the last rename wins.
pub struct FileGlobalState {
    path: PathBuf,
    state: Mutex<StateFile>,
}

impl FileGlobalState {
    /// Open (or lazily create) the state file in `state_dir`
    pub fn open(state_dir: &Path) -> Result<Self, StateError> {
        let path = state_file(state_dir);
        let state = read_state(&path)?;
        tracing::debug!(path = %path.display(), entries = state.entries.len(), "opened global state");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open the state file, starting over with empty state when it is corrupt.
    /// The corrupt file is replaced by the next update.
    pub fn open_or_reset(state_dir: &Path) -> Result<Self, StateError> {
        match Self::open(state_dir) {
            Err(StateError::Corrupt { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "global state is corrupt, starting with empty state"
                );
                Ok(Self {
                    path,
                    state: Mutex::new(StateFile::default()),
                })
            }
            other => other,
        }
    }

    /// Snapshot of the loaded state
    pub fn snapshot(&self) -> StateFile {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entry keys currently stored
    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        self.snapshot().entries.into_keys().collect()
    }
}

impl GlobalState for FileGlobalState {
    fn get(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn update(&self, key: &str, value: Option<&str>) -> Result<(), StateError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // Write a copy first so a failed write leaves the loaded state as it was
        let mut next = match read_state(&self.path) {
            Ok(on_disk) => on_disk,
            Err(StateError::Corrupt { .. }) => state.clone(),
            Err(err) => return Err(err),
        };
        match value {
            Some(v) => {
                next.entries
                    .insert(key.to_string(), serde_json::Value::String(v.to_string()));
            }
            None => {
                next.entries.remove(key);
            }
        }
        next.touch();

        write_state(&self.path, &next)?;
        *state = next;
        Ok(())
    }
}

/// Volatile global state for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryGlobalState {
    entries: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryGlobalState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl GlobalState for MemoryGlobalState {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn update(&self, key: &str, value: Option<&str>) -> Result<(), StateError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(v) => entries.insert(key.to_string(), v.to_string()),
            None => entries.remove(key),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_state_is_empty() {
        let temp = tempdir().unwrap();
        let state = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(state.get("last-porter-yaml-schema"), None);
        assert!(!state_file(temp.path()).exists());
    }

    #[test]
    fn test_update_persists_across_open() {
        let temp = tempdir().unwrap();
        let state = FileGlobalState::open(temp.path()).unwrap();
        state.update("schema", Some("{\"a\":1}")).unwrap();

        let reopened = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(reopened.get("schema").as_deref(), Some("{\"a\":1}"));
        assert!(reopened.snapshot().updated_at.is_some());
    }

    #[test]
    fn test_update_none_removes_entry() {
        let temp = tempdir().unwrap();
        let state = FileGlobalState::open(temp.path()).unwrap();
        state.update("schema", Some("{}")).unwrap();
        state.update("schema", None).unwrap();

        let reopened = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(reopened.get("schema"), None);
    }

    #[test]
    fn test_unknown_entries_preserved() {
        let temp = tempdir().unwrap();
        fs::write(
            state_file(temp.path()),
            r#"{"format_version":"1","entries":{"other":{"nested":true}}}"#,
        )
        .unwrap();

        let state = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(state.get("other"), None);
        state.update("schema", Some("{}")).unwrap();

        let reopened = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(reopened.keys(), vec!["other".to_string(), "schema".to_string()]);
    }

    #[test]
    fn test_corrupt_state_is_error() {
        let temp = tempdir().unwrap();
        fs::write(state_file(temp.path()), "not json").unwrap();

        let result = FileGlobalState::open(temp.path());
        assert!(matches!(result, Err(StateError::Corrupt { .. })));
    }

    #[test]
    fn test_open_or_reset_recovers_from_corrupt_state() {
        let temp = tempdir().unwrap();
        fs::write(state_file(temp.path()), "{ not json").unwrap();

        let state = FileGlobalState::open_or_reset(temp.path()).unwrap();
        assert_eq!(state.get("schema"), None);
        state.update("schema", Some("{}")).unwrap();

        let reopened = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(reopened.get("schema").as_deref(), Some("{}"));
    }

    #[test]
    fn test_update_merges_entries_written_by_other_handles() {
        let temp = tempdir().unwrap();
        let first = FileGlobalState::open(temp.path()).unwrap();
        let second = FileGlobalState::open(temp.path()).unwrap();

        first.update("a", Some("1")).unwrap();
        second.update("b", Some("2")).unwrap();
        // `first` opened before "b" existed; removing "a" must not drop it
        first.update("a", None).unwrap();

        let reopened = FileGlobalState::open(temp.path()).unwrap();
        assert_eq!(reopened.keys(), vec!["b".to_string()]);
        assert_eq!(first.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_creates_missing_state_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("nested").join("state");
        let state = FileGlobalState::open(&dir).unwrap();
        state.update("schema", Some("{}")).unwrap();
        assert!(state_file(&dir).exists());
    }

    #[test]
    fn test_memory_state() {
        let state = MemoryGlobalState::new();
        state.update("k", Some("v")).unwrap();
        assert_eq!(state.get("k").as_deref(), Some("v"));
        state.update("k", None).unwrap();
        assert_eq!(state.get("k"), None);
    }
}
