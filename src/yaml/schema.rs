//! porter.yaml schema contributor
//!
//! The YAML service asks for schemas synchronously, but `porter schema` is
//! slow. Resolvers always answer from the `SchemaCache` snapshot (seeded from
//! the last persisted schema); `update` refreshes that snapshot out of band.

use std::sync::Arc;

use crate::backends::host::{long_running, Host};
use crate::backends::porter::{FetchError, SchemaSource};
use crate::backends::yaml_extension::{
    activate_yaml_extension, ActivationError, ExtensionHost, SchemaContentResolver,
    SchemaUriResolver,
};
use crate::cache::schema::SchemaCache;
use crate::cache::store::GlobalState;
use crate::core::util::fingerprint;
use crate::yaml::uri::Uri;

/// Contributor scheme
pub const PORTER_SCHEMA: &str = "porter";

/// Global state key of the last loaded schema
pub const LAST_SCHEMA_CACHE_KEY: &str = "last-porter-yaml-schema";

/// The one schema URI handed out
pub const PORTER_SCHEMA_URI: &str = "porter://schema/porter";

/// Resources whose name ends with this get the Porter schema
pub const PORTER_MANIFEST: &str = "porter.yaml";

/// Busy indicator title for the first load
pub const LOADING_TITLE: &str = "Loading porter.yaml schema...";

/// Result of `register`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    YamlUnavailable(ActivationError),
}

/// Result of `update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// First schema loaded
    Loaded,
    /// Cached schema replaced
    Updated,
    /// Fetched schema matched the cache (or was empty)
    Unchanged,
    /// Fetch failed; the cache was left alone
    FetchFailed { message: String, had_cache: bool },
}

/// Resolve the schema URI for a resource
pub fn on_request_schema_uri(resource: &str) -> Option<String> {
    if resource.ends_with(PORTER_MANIFEST) {
        return Some(PORTER_SCHEMA_URI.to_string());
    }
    None
}

/// Resolve schema text for a schema URI from the cached snapshot
pub fn on_request_schema_content(cache: &SchemaCache, schema_uri: &str) -> Option<String> {
    let parsed = Uri::parse(schema_uri);
    if parsed.scheme != PORTER_SCHEMA {
        return None;
    }
    if parsed.path.is_empty() || !parsed.path.starts_with('/') {
        return None;
    }
    // Without an authority the path cannot start with `//`
    if parsed.authority.is_empty() && parsed.path.starts_with("//") {
        return None;
    }

    cache.get()
}

/// Schema contributor wiring Porter, the global state and the YAML service
pub struct PorterYamlSchema {
    cache: SchemaCache,
    state: Arc<dyn GlobalState>,
    host: Arc<dyn Host>,
    source: Arc<dyn SchemaSource>,
}

impl PorterYamlSchema {
    pub fn new(
        state: Arc<dyn GlobalState>,
        host: Arc<dyn Host>,
        source: Arc<dyn SchemaSource>,
    ) -> Self {
        Self {
            cache: SchemaCache::new(),
            state,
            host,
            source,
        }
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Load the last persisted schema into the cache
    pub fn seed_from_state(&self) {
        let persisted = self.state.get(LAST_SCHEMA_CACHE_KEY);
        if let Some(schema) = persisted.as_deref() {
            tracing::debug!(
                bytes = schema.len(),
                xxh3 = %fingerprint(schema.as_bytes()),
                "seeded schema from global state"
            );
        }
        self.cache.set(persisted);
    }

    /// Resolver pair handed to the YAML service; both share this cache
    pub fn resolvers(&self) -> (SchemaUriResolver, SchemaContentResolver) {
        let cache = self.cache.clone();
        let request_schema: SchemaUriResolver = Arc::new(on_request_schema_uri);
        let request_schema_content: SchemaContentResolver =
            Arc::new(move |uri: &str| on_request_schema_content(&cache, uri));
        (request_schema, request_schema_content)
    }

    /// Seed the cache, then register with the YAML service if it is there
    pub async fn register(&self, extensions: &dyn ExtensionHost) -> RegistrationOutcome {
        self.seed_from_state();

        let yaml = match activate_yaml_extension(extensions).await {
            Ok(api) => api,
            Err(err) => {
                tracing::warn!(error = %err, "YAML extension unavailable");
                self.host.show_warning_message(&err.to_string()).await;
                return RegistrationOutcome::YamlUnavailable(err);
            }
        };

        let (request_schema, request_schema_content) = self.resolvers();
        if !yaml.register_contributor(PORTER_SCHEMA, request_schema, request_schema_content) {
            tracing::warn!(scheme = PORTER_SCHEMA, "YAML service refused contributor");
        } else {
            tracing::info!(scheme = PORTER_SCHEMA, "registered schema contributor");
        }
        RegistrationOutcome::Registered
    }

    /// Fetch the schema and, if it changed, cache and persist it
    pub async fn update(&self) -> RefreshOutcome {
        let had_cache = self.cache.has_schema();

        let schema = match self.fetch_schema().await {
            Ok(schema) => schema,
            Err(err) => {
                let message = if had_cache {
                    format!("Error checking for Porter schema updates. Porter intellisense may be out of date.\n\nDetails: {}", err)
                } else {
                    format!("Error loading Porter schema. Porter intellisense will not be available.\n\nDetails: {}", err)
                };
                tracing::warn!(error = %err, had_cache, "porter schema fetch failed");
                self.host.show_warning_message(&message).await;
                return RefreshOutcome::FetchFailed {
                    message: err.to_string(),
                    had_cache,
                };
            }
        };

        if schema.is_empty() || self.cache.matches(&schema) {
            tracing::debug!("porter schema unchanged");
            return RefreshOutcome::Unchanged;
        }

        let (message, outcome) = if had_cache {
            (
                "Updated porter.yaml schema. Please close and re-open porter.yaml for updated intellisense.",
                RefreshOutcome::Updated,
            )
        } else {
            (
                "Loaded porter.yaml schema. Please close and re-open porter.yaml for intellisense.",
                RefreshOutcome::Loaded,
            )
        };

        tracing::info!(
            bytes = schema.len(),
            xxh3 = %fingerprint(schema.as_bytes()),
            "porter schema changed"
        );
        self.cache.set(Some(schema.clone()));
        if let Err(err) = self.state.update(LAST_SCHEMA_CACHE_KEY, Some(&schema)) {
            tracing::warn!(error = %err, "failed to persist porter schema");
        }
        self.host.show_information_message(message).await;

        outcome
    }

    /// Run the fetch, behind a busy indicator only when nothing is cached yet
    pub async fn fetch_schema(&self) -> Result<String, FetchError> {
        if self.cache.has_schema() {
            self.source.schema().await
        } else {
            long_running(self.host.as_ref(), LOADING_TITLE, self.source.schema()).await
        }
    }
}
