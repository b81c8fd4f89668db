//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::backends::host::TerminalHost;
use crate::backends::porter::{PorterCli, PORTER_BIN};
use crate::backends::yaml_service::{LocalExtensionHost, YamlService};
use crate::cache::store::{FileGlobalState, GlobalState};
use crate::core::model::{ErrorInfo, Kind, Meta, Report, ReportItem};
use crate::core::paths::{default_state_dir, normalize_path};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::core::settings::Settings;
use crate::yaml::schema::{
    on_request_schema_content, on_request_schema_uri, PorterYamlSchema, RefreshOutcome,
    RegistrationOutcome, LAST_SCHEMA_CACHE_KEY, PORTER_SCHEMA,
};

/// porter-yaml - serve Porter's porter.yaml schema to a YAML language service.
#[derive(Parser, Debug)]
#[command(name = "porter-yaml")]
#[command(
    author,
    version,
    about,
    long_about = r#"porter-yaml keeps a cached copy of the JSON schema generated by
`porter schema` and answers schema requests for porter.yaml files from it.

Schema lookups never run Porter: they answer from the last schema that was
loaded, which is persisted between runs. `refresh` and `watch` fetch a new
schema and report whether it changed.

Output formats:
- jsonl: one JSON object per line (default)
- json: a single JSON array
- md: human-friendly Markdown
- raw: details only (schema text, URIs)

Examples:
    porter-yaml refresh
    porter-yaml resolve-uri bundles/wordpress/porter.yaml
    porter-yaml --format raw resolve-content porter://schema/porter > porter.schema.json
    porter-yaml watch --interval 600
"#
)]
pub struct Cli {
    /// Directory holding persisted state.
    #[arg(
        long,
        global = true,
        env = "PORTER_YAML_STATE_DIR",
        value_name = "DIR",
        long_help = "Directory holding state.json, where the last loaded schema is kept\n\
between runs (defaults to $HOME/.porter-yaml)."
    )]
    pub state_dir: Option<PathBuf>,

    /// Porter executable.
    #[arg(
        long,
        global = true,
        env = "PORTER_BIN",
        default_value = PORTER_BIN,
        value_name = "BIN",
        long_help = "Porter executable used to run `porter schema`. Bare names are looked\n\
up in PATH."
    )]
    pub porter: PathBuf,

    /// Output format (jsonl/json/md/raw).
    #[arg(long, global = true, default_value = "jsonl", value_name = "FORMAT")]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored dialogs.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no informational dialogs or progress).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug logging on stderr. RUST_LOG, when set, takes precedence."
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the schema from Porter and update the cache if it changed.
    #[command(
        long_about = "Register with the YAML service, run `porter schema`, and compare the\n\
result with the cached schema. A changed schema is cached and persisted.\n\n\
The first load shows a progress line; later refreshes run silently unless\n\
something changed or failed.\n"
    )]
    Refresh,

    /// Refresh periodically until interrupted.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value = "300", value_name = "SECS")]
        interval: u64,

        /// Stop after N refreshes.
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },

    /// Resolve the schema URI for a resource.
    ResolveUri {
        /// File path or URI of the YAML document.
        #[arg(value_name = "RESOURCE")]
        resource: String,
    },

    /// Resolve schema content for a schema URI from the cache.
    ResolveContent {
        /// Schema URI, e.g. porter://schema/porter.
        #[arg(value_name = "URI")]
        uri: String,
    },

    /// Resolve a document's schema through the YAML service.
    Schema {
        /// Path of the YAML document.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show the persisted schema.
    Status,

    /// Forget the persisted schema.
    Clear,

    /// Check that Porter and the state directory are usable.
    Doctor,
}

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let settings = Settings {
        state_dir: cli.state_dir.unwrap_or_else(default_state_dir),
        porter_bin: cli.porter,
        render: RenderConfig::with_pretty(format, cli.pretty),
        color: !cli.no_color,
        quiet: cli.quiet,
    };
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Refresh => run_refresh(&settings).await,
        Commands::Watch { interval, count } => run_watch(&settings, interval, count).await,
        Commands::ResolveUri { resource } => run_resolve_uri(&settings, &resource),
        Commands::ResolveContent { uri } => run_resolve_content(&settings, &uri),
        Commands::Schema { file } => run_schema(&settings, &file).await,
        Commands::Status => run_status(&settings),
        Commands::Clear => run_clear(&settings),
        Commands::Doctor => crate::backends::doctor::run_doctor(&settings).await,
    }
}

fn open_state(settings: &Settings) -> Result<Arc<FileGlobalState>> {
    let state = FileGlobalState::open_or_reset(&settings.state_dir).with_context(|| {
        format!(
            "Failed to open global state {}",
            normalize_path(&settings.state_file())
        )
    })?;
    Ok(Arc::new(state))
}

fn build_schema(settings: &Settings, state: Arc<FileGlobalState>) -> PorterYamlSchema {
    PorterYamlSchema::new(
        state,
        Arc::new(TerminalHost::new(settings.color, settings.quiet)),
        Arc::new(PorterCli::new(&settings.porter_bin)),
    )
}

/// Register with a fresh in-process YAML service
async fn register_local(schema: &PorterYamlSchema) -> (Arc<YamlService>, ReportItem) {
    let yaml = Arc::new(YamlService::new());
    let item = match schema
        .register(&LocalExtensionHost::new(yaml.clone()))
        .await
    {
        RegistrationOutcome::Registered => {
            tracing::debug!(schemes = ?yaml.schemes(), "YAML service contributors");
            ReportItem::new(Kind::Registered).with_subject(PORTER_SCHEMA)
        }
        RegistrationOutcome::YamlUnavailable(err) => ReportItem::new(Kind::Unavailable)
            .with_subject(PORTER_SCHEMA)
            .with_detail(err.to_string()),
    };
    (yaml, item)
}

fn refresh_item(outcome: &RefreshOutcome, schema: &PorterYamlSchema) -> ReportItem {
    let cached_meta = || {
        schema
            .cache()
            .get()
            .map(|s| Meta::for_schema(&s))
            .unwrap_or_default()
    };

    match outcome {
        RefreshOutcome::Loaded => ReportItem::new(Kind::Loaded).with_meta(cached_meta()),
        RefreshOutcome::Updated => ReportItem::new(Kind::Updated).with_meta(cached_meta()),
        RefreshOutcome::Unchanged => ReportItem::new(Kind::Unchanged).with_meta(cached_meta()),
        RefreshOutcome::FetchFailed { message, had_cache } => {
            let mut item = ReportItem::new(Kind::FetchFailed)
                .with_detail(if *had_cache {
                    "cached schema kept"
                } else {
                    "no schema available"
                })
                .with_meta(cached_meta());
            item.errors.push(ErrorInfo::new("FETCH_FAILED", message.clone()));
            item
        }
    }
}

async fn run_refresh(settings: &Settings) -> Result<()> {
    let schema = build_schema(settings, open_state(settings)?);

    let mut report = Report::new();
    let (_yaml, registered) = register_local(&schema).await;
    report.push(registered);

    let outcome = schema.update().await;
    report.push(refresh_item(&outcome, &schema));

    Renderer::with_config(settings.render).print(&report);
    Ok(())
}

async fn run_watch(settings: &Settings, interval: u64, count: Option<usize>) -> Result<()> {
    let schema = build_schema(settings, open_state(settings)?);
    let renderer = Renderer::with_config(settings.render);

    let (_yaml, registered) = register_local(&schema).await;
    renderer.print(&Report::from(registered));

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut refreshes = 0usize;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = schema.update().await;
                renderer.print(&Report::from(refresh_item(&outcome, &schema)));
                refreshes += 1;
                if count.is_some_and(|n| refreshes >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(refreshes, "watch interrupted");
                break;
            }
        }
    }

    Ok(())
}

fn run_resolve_uri(settings: &Settings, resource: &str) -> Result<()> {
    let item = match on_request_schema_uri(resource) {
        Some(uri) => ReportItem::new(Kind::SchemaUri)
            .with_subject(resource)
            .with_detail(uri),
        None => ReportItem::new(Kind::NoMatch).with_subject(resource),
    };

    Renderer::with_config(settings.render).print(&Report::from(item));
    Ok(())
}

fn run_resolve_content(settings: &Settings, uri: &str) -> Result<()> {
    let schema = build_schema(settings, open_state(settings)?);
    schema.seed_from_state();

    let item = match on_request_schema_content(schema.cache(), uri) {
        Some(content) => ReportItem::new(Kind::SchemaContent)
            .with_subject(uri)
            .with_meta(Meta::for_schema(&content))
            .with_detail(content),
        None => ReportItem::new(Kind::NoMatch).with_subject(uri),
    };

    Renderer::with_config(settings.render).print(&Report::from(item));
    Ok(())
}

async fn run_schema(settings: &Settings, file: &std::path::Path) -> Result<()> {
    let schema = build_schema(settings, open_state(settings)?);
    let (yaml, registered) = register_local(&schema).await;

    let resource = normalize_path(file);
    let item = match yaml.resolve(&resource) {
        Some(resolved) => {
            let mut item = ReportItem::new(Kind::SchemaContent).with_subject(resolved.uri);
            if let Some(content) = resolved.content {
                item = item.with_meta(Meta::for_schema(&content)).with_detail(content);
            }
            item
        }
        None if registered.kind == Kind::Registered => {
            ReportItem::new(Kind::NoMatch).with_subject(resource)
        }
        None => registered,
    };

    Renderer::with_config(settings.render).print(&Report::from(item));
    Ok(())
}

fn run_status(settings: &Settings) -> Result<()> {
    let state = open_state(settings)?;
    let snapshot = state.snapshot();

    let mut item = ReportItem::new(Kind::State).with_subject(LAST_SCHEMA_CACHE_KEY);
    match state.get(LAST_SCHEMA_CACHE_KEY) {
        Some(schema) if !schema.is_empty() => item.meta = Meta::for_schema(&schema),
        _ => item = item.with_detail("no schema cached"),
    }
    item.meta.updated_at = snapshot.updated_at.map(|t| t.to_rfc3339());

    Renderer::with_config(settings.render).print(&Report::from(item));
    Ok(())
}

fn run_clear(settings: &Settings) -> Result<()> {
    let state = open_state(settings)?;
    state
        .update(LAST_SCHEMA_CACHE_KEY, None)
        .context("Failed to clear persisted schema")?;

    let item = ReportItem::new(Kind::State)
        .with_subject(LAST_SCHEMA_CACHE_KEY)
        .with_detail("cleared");
    Renderer::with_config(settings.render).print(&Report::from(item));
    Ok(())
}
