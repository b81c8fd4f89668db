//! Runtime settings resolved once from CLI flags and environment

use std::path::PathBuf;

use crate::core::render::RenderConfig;

/// Resolved configuration shared by all commands
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding state.json
    pub state_dir: PathBuf,

    /// Porter executable used for `porter schema`
    pub porter_bin: PathBuf,

    pub render: RenderConfig,

    /// Colorize dialogs on stderr
    pub color: bool,

    /// Suppress informational dialogs
    pub quiet: bool,
}

impl Settings {
    /// Path of the persisted global state file
    pub fn state_file(&self) -> PathBuf {
        crate::cache::store::state_file(&self.state_dir)
    }
}
