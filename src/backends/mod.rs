//! Backends module - Collaborators of the schema contributor
//!
//! Provides:
//! - porter: `porter schema` invocation
//! - host: dialogs and long-running indicators
//! - yaml_extension: YAML service lookup and contributor API
//! - yaml_service: in-process YAML service for terminal use
//! - doctor: Dependency checking

pub mod doctor;
pub mod host;
pub mod porter;
pub mod yaml_extension;
pub mod yaml_service;
