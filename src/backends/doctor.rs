//! Doctor - Dependency checking

use anyhow::Result;
use std::path::Path;

use crate::backends::porter::PorterCli;
use crate::cache::store::read_state;
use crate::core::model::{ErrorInfo, Kind, Report, ReportItem};
use crate::core::paths::normalize_path;
use crate::core::render::Renderer;
use crate::core::settings::Settings;

/// Dependency status
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub detail: Option<String>,
    pub required: bool,
    pub notes: Option<String>,
}

impl DependencyStatus {
    pub fn to_report_item(&self) -> ReportItem {
        let status = if self.available { "✓" } else { "✗" };
        let required = if self.required {
            "required"
        } else {
            "optional"
        };

        let mut message = format!(
            "{} {} ({}) - {}",
            status,
            self.name,
            required,
            self.detail.as_deref().unwrap_or("not found")
        );
        if let Some(notes) = &self.notes {
            message.push_str(&format!("\n  Note: {}", notes));
        }

        let mut item = ReportItem::new(Kind::Dependency)
            .with_subject(self.name.clone())
            .with_detail(message);

        if !self.available && self.required {
            item.errors.push(ErrorInfo::new(
                "MISSING_DEPENDENCY",
                format!("{} is required but not usable", self.name),
            ));
        }

        item
    }
}

/// Check the Porter binary: present, and answering `porter version`
pub async fn check_porter(porter: &PorterCli) -> DependencyStatus {
    let name = normalize_path(porter.binary());
    let notes = Some("Install: https://porter.sh/install/ or pass --porter <BIN>".to_string());

    if !porter.is_available() {
        return DependencyStatus {
            name,
            available: false,
            detail: None,
            required: true,
            notes,
        };
    }

    match porter.version().await {
        Ok(version) => DependencyStatus {
            name,
            available: true,
            detail: Some(format!("found: {}", version)),
            required: true,
            notes: None,
        },
        Err(err) => DependencyStatus {
            name,
            available: false,
            detail: Some(err.to_string()),
            required: true,
            notes,
        },
    }
}

/// Check that persisted state can be read
pub fn check_state(state_dir: &Path) -> DependencyStatus {
    let path = crate::cache::store::state_file(state_dir);
    let name = "global state".to_string();
    match read_state(&path) {
        Ok(state) => DependencyStatus {
            name,
            available: true,
            detail: Some(format!(
                "{} ({} entries)",
                normalize_path(&path),
                state.entries.len()
            )),
            required: false,
            notes: None,
        },
        Err(err) => DependencyStatus {
            name,
            available: false,
            detail: Some(err.to_string()),
            required: false,
            notes: Some("Run `porter-yaml clear` or delete the file to start over".to_string()),
        },
    }
}

/// Run the doctor command
pub async fn run_doctor(settings: &Settings) -> Result<()> {
    let deps = vec![
        check_porter(&PorterCli::new(&settings.porter_bin)).await,
        check_state(&settings.state_dir),
    ];

    let mut report = Report::new();
    for dep in &deps {
        report.push(dep.to_report_item());
    }
    Renderer::with_config(settings.render).print(&report);

    if deps.iter().any(|d| d.required && !d.available) {
        eprintln!("\n⚠️  Some required dependencies are missing!");
    }

    Ok(())
}
