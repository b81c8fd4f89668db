//! In-memory schema snapshot shared with the resolver callbacks

use std::sync::{Arc, PoisonError, RwLock};

/// Last-known schema text, shared by the refresh task and the resolvers.
///
/// Cloning is cheap and every clone sees the same snapshot. Reads never block
/// on a fetch; writers replace the whole value, so overlapping refreshes end
/// with whichever finished last.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    inner: Arc<RwLock<Option<String>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot (may be absent)
    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the snapshot
    pub fn set(&self, schema: Option<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = schema;
    }

    /// Whether a usable (non-empty) schema is cached
    pub fn has_schema(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Whether the cached text is exactly `schema`
    pub fn matches(&self, schema: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(schema)
    }
}
