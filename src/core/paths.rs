//! State directory and resource path helpers

use std::path::{Path, PathBuf};

/// Directory name used under $HOME when no state dir is configured
pub const STATE_DIR_NAME: &str = ".porter-yaml";

/// Default state directory ($HOME/.porter-yaml, or ./.porter-yaml without a home)
pub fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR_NAME)
}

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
