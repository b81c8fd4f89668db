//! Renderer module
//!
//! Renders a Report to different output formats: jsonl, json, md, raw

use crate::core::model::{Kind, Report, ReportItem};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for reports
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a report to a string
    pub fn render(&self, report: &Report) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(report),
            OutputFormat::Json => self.render_json(report),
            OutputFormat::Markdown => self.render_markdown(report),
            OutputFormat::Raw => self.render_raw(report),
        }
    }

    /// Render and print to stdout, skipping empty output
    pub fn print(&self, report: &Report) {
        let output = self.render(report);
        if !output.is_empty() {
            println!("{}", output);
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, report: &Report) -> String {
        report
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, report: &Report) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&report.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&report.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, report: &Report) -> String {
        let mut output = String::new();
        for item in &report.items {
            self.render_item_md(&mut output, item);
        }
        output
    }

    fn render_item_md(&self, output: &mut String, item: &ReportItem) {
        output.push_str(&format!("### {}", kind_title(item.kind)));
        if let Some(subject) = &item.subject {
            output.push_str(&format!(" `{}`", subject));
        }
        output.push('\n');

        if let Some(bytes) = item.meta.bytes {
            output.push_str(&format!("\n- size: {} bytes\n", bytes));
        }
        if let Some(fingerprint) = &item.meta.fingerprint {
            output.push_str(&format!("- xxh3: `{}`\n", fingerprint));
        }
        if let Some(updated_at) = &item.meta.updated_at {
            output.push_str(&format!("- updated: {}\n", updated_at));
        }

        if let Some(detail) = &item.detail {
            output.push_str("\n```\n");
            output.push_str(detail);
            if !detail.ends_with('\n') {
                output.push('\n');
            }
            output.push_str("```\n");
        }

        for error in &item.errors {
            output.push_str(&format!("\n> **{}**: {}\n", error.code, error.message));
        }

        output.push('\n');
    }

    /// Raw mode: details only, so schema text can be piped straight to a file
    fn render_raw(&self, report: &Report) -> String {
        report
            .items
            .iter()
            .filter_map(|item| item.detail.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn kind_title(kind: Kind) -> &'static str {
    match kind {
        Kind::Registered => "Registered",
        Kind::Unavailable => "YAML service unavailable",
        Kind::Loaded => "Schema loaded",
        Kind::Updated => "Schema updated",
        Kind::Unchanged => "Schema unchanged",
        Kind::FetchFailed => "Schema fetch failed",
        Kind::SchemaUri => "Schema URI",
        Kind::SchemaContent => "Schema content",
        Kind::NoMatch => "No schema",
        Kind::State => "Persisted state",
        Kind::Dependency => "Dependency",
    }
}
