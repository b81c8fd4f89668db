//! Unified report model
//!
//! Every command maps what happened onto a `Report` before rendering output.

use serde::{Deserialize, Serialize};

/// The kind of report item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Contributor registered with the YAML service
    Registered,
    /// YAML service could not be activated
    Unavailable,
    /// First schema load
    Loaded,
    /// Schema changed since the last load
    Updated,
    /// Schema fetched but identical to the cached one
    Unchanged,
    /// `porter schema` failed
    FetchFailed,
    /// Schema URI resolved for a resource
    SchemaUri,
    /// Schema content resolved for a URI
    SchemaContent,
    /// Nothing resolved
    NoMatch,
    /// Persisted state summary
    State,
    /// Dependency check
    Dependency,
}

/// Metadata for a report item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Schema size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,

    /// XXH3 fingerprint of the schema text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Last time the persisted state was written (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Meta {
    /// Describe a schema text
    pub fn for_schema(schema: &str) -> Self {
        Self {
            bytes: Some(schema.len() as u64),
            fingerprint: Some(crate::core::util::fingerprint(schema.as_bytes())),
            updated_at: None,
        }
    }
}

/// Error information for a report item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A single entry in a command's report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub kind: Kind,

    /// What the item is about (resource path, URI, key, binary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Human-readable result or resolved value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorInfo>,
}

impl ReportItem {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            subject: None,
            detail: None,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }
}

/// Ordered collection of report items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ReportItem) {
        self.items.push(item);
    }
}

impl From<ReportItem> for Report {
    fn from(item: ReportItem) -> Self {
        Self { items: vec![item] }
    }
}
