//! YAML module - porter.yaml schema contribution
//!
//! Provides:
//! - schema: the cached schema contributor (registration, refresh, resolvers)
//! - uri: URI parsing for schema requests

pub mod schema;
pub mod uri;
