//! In-process YAML service
//!
//! Stands in for the editor's YAML extension when running from a terminal:
//! keeps the registered contributors and answers schema requests the way the
//! YAML language server asks them (URI first, then content by scheme).

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backends::yaml_extension::{
    ExtensionHandle, ExtensionHost, SchemaContentResolver, SchemaUriResolver, YamlExtensionApi,
    YAML_EXTENSION_ID,
};
use crate::yaml::uri::Uri;

struct Contributor {
    request_schema: SchemaUriResolver,
    request_schema_content: SchemaContentResolver,
}

/// Schema resolved for a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub uri: String,
    pub content: Option<String>,
}

/// Contributor registry keyed by scheme
#[derive(Default)]
pub struct YamlService {
    contributors: RwLock<BTreeMap<String, Contributor>>,
}

impl YamlService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<String> {
        self.contributors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Ask every contributor for a schema URI; the first answer wins
    pub fn request_schema(&self, resource: &str) -> Option<String> {
        self.contributors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find_map(|c| (c.request_schema)(resource))
    }

    /// Ask the contributor owning the URI's scheme for the schema text
    pub fn request_schema_content(&self, schema_uri: &str) -> Option<String> {
        let scheme = Uri::parse(schema_uri).scheme;
        let contributors = self
            .contributors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let contributor = contributors.get(&scheme)?;
        (contributor.request_schema_content)(schema_uri)
    }

    /// Full round trip for a resource
    pub fn resolve(&self, resource: &str) -> Option<ResolvedSchema> {
        let uri = self.request_schema(resource)?;
        let content = self.request_schema_content(&uri);
        Some(ResolvedSchema { uri, content })
    }
}

impl YamlExtensionApi for YamlService {
    fn register_contributor(
        &self,
        scheme: &str,
        request_schema: SchemaUriResolver,
        request_schema_content: SchemaContentResolver,
    ) -> bool {
        let mut contributors = self
            .contributors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if contributors.contains_key(scheme) {
            tracing::warn!(scheme, "schema contributor already registered");
            return false;
        }
        contributors.insert(
            scheme.to_string(),
            Contributor {
                request_schema,
                request_schema_content,
            },
        );
        true
    }
}

/// Extension host with the in-process YAML service installed
pub struct LocalExtensionHost {
    yaml: Arc<YamlService>,
}

impl LocalExtensionHost {
    pub fn new(yaml: Arc<YamlService>) -> Self {
        Self { yaml }
    }
}

#[async_trait]
impl ExtensionHost for LocalExtensionHost {
    async fn activate(&self, id: &str) -> Option<ExtensionHandle> {
        if id != YAML_EXTENSION_ID {
            return None;
        }
        let api: Arc<dyn YamlExtensionApi> = self.yaml.clone();
        Some(ExtensionHandle {
            id: id.to_string(),
            api: Some(api),
        })
    }
}
