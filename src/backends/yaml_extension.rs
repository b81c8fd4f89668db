//! YAML language-service extension lookup
//!
//! The YAML service owns validation; we only contribute a schema to it.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Extension id of the YAML language service
pub const YAML_EXTENSION_ID: &str = "redhat.vscode-yaml";

/// Maps a resource (file path or URI) to a schema URI
pub type SchemaUriResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Maps a schema URI to schema text
pub type SchemaContentResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Contributor API exposed by the YAML service
pub trait YamlExtensionApi: Send + Sync {
    /// Register a schema contributor for `scheme`; returns false if the
    /// scheme is already taken
    fn register_contributor(
        &self,
        scheme: &str,
        request_schema: SchemaUriResolver,
        request_schema_content: SchemaContentResolver,
    ) -> bool;
}

/// An activated extension; `api` is absent when it predates the contributor API
pub struct ExtensionHandle {
    pub id: String,
    pub api: Option<Arc<dyn YamlExtensionApi>>,
}

/// Extension registry of the editor host
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Activate an installed extension, or `None` if it is not installed
    async fn activate(&self, id: &str) -> Option<ExtensionHandle>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("Please install 'YAML Support by Red Hat' via the Extensions pane.")]
    NotInstalled,

    #[error("The installed Red Hat YAML extension doesn't support Porter intellisense. Please upgrade 'YAML Support by Red Hat' via the Extensions pane.")]
    ContributorApiUnsupported,
}

/// Obtain the YAML service's contributor API
pub async fn activate_yaml_extension(
    host: &dyn ExtensionHost,
) -> Result<Arc<dyn YamlExtensionApi>, ActivationError> {
    let handle = host
        .activate(YAML_EXTENSION_ID)
        .await
        .ok_or(ActivationError::NotInstalled)?;
    tracing::debug!(id = %handle.id, contributor_api = handle.api.is_some(), "activated YAML extension");

    handle.api.ok_or(ActivationError::ContributorApiUnsupported)
}
