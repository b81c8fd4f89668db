//! Core module - Shared data structures and utilities
//!
//! This module provides:
//! - Unified report model (ReportItem)
//! - Rendering functions for different output formats
//! - Runtime settings
//! - Path helpers and common utilities

pub mod model;
pub mod paths;
pub mod render;
pub mod settings;
pub mod util;
