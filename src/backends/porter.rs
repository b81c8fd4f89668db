//! Porter CLI integration
//!
//! Runs `porter schema` and hands back the generated porter.yaml JSON schema.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

use crate::core::util::command_exists;

/// Default Porter executable name
pub const PORTER_BIN: &str = "porter";

/// Why a schema could not be obtained
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unable to run Porter: {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },

    /// Non-zero exit; `stderr` falls back to the exit status when empty
    #[error("Unable to run Porter: {stderr}")]
    Exit { stderr: String },
}

/// Anything that can produce the current porter.yaml schema text
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn schema(&self) -> Result<String, FetchError>;
}

/// Shells out to the Porter binary
#[derive(Debug, Clone)]
pub struct PorterCli {
    binary: PathBuf,
}

impl PorterCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Check if the binary is reachable (bare names are looked up in PATH)
    pub fn is_available(&self) -> bool {
        if self.binary.components().count() > 1 {
            return self.binary.is_file();
        }
        command_exists(&self.binary.to_string_lossy())
    }

    /// Run `porter <args>` and return stdout
    async fn invoke(&self, args: &[&str]) -> Result<String, FetchError> {
        tracing::debug!(binary = %self.binary.display(), ?args, "invoking porter");

        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(FetchError::Exit {
                stderr: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `porter version`, used by doctor
    pub async fn version(&self) -> Result<String, FetchError> {
        self.invoke(&["version"])
            .await
            .map(|out| out.trim().to_string())
    }
}

impl Default for PorterCli {
    fn default() -> Self {
        Self::new(PORTER_BIN)
    }
}

#[async_trait]
impl SchemaSource for PorterCli {
    async fn schema(&self) -> Result<String, FetchError> {
        self.invoke(&["schema"]).await
    }
}
