//! Cache module - Schema cache and its persisted mirror
//!
//! Provides:
//! - The in-memory schema snapshot served to the resolver callbacks
//! - Global key/value state persisted to state.json

pub mod meta;
pub mod schema;
pub mod store;
