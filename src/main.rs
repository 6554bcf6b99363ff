//! narrow-filter - Entry Point

use clap::Parser;
use narrow_filter::config::{self, CliOverrides};
use narrow_filter::model::error::AppError;
use narrow_filter::model::RealmSettings;
use narrow_filter::report::NarrowReport;
use narrow_filter::snapshot::{load_snapshot, InMemoryWorkspace};
use narrow_filter::{parser, Filter};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Parse a search query and report how the narrow behaves
#[derive(Parser, Debug)]
#[command(name = "narrow-filter")]
#[command(version)]
#[command(about = "Parse, classify and evaluate chat search narrows")]
pub struct Args {
    /// Search query, e.g. `channel:design topic:logo has:image`
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Workspace snapshot (JSON) providing users, channels and messages
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Parse in pill mode: `search:` operands stay a single term
    #[arg(long)]
    pub pills: bool,

    /// Treat the realm as a Zephyr mirror
    #[arg(long)]
    pub zephyr_mirror: bool,

    /// Describe the narrow as a logged-out spectator sees it
    #[arg(long)]
    pub spectator: bool,

    /// Emit compact single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    fn query_string(&self) -> String {
        self.query.join(" ")
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            zephyr_mirror_realm: self.zephyr_mirror.then_some(true),
            pretty: self.compact.then_some(false),
            snapshot_path: self.snapshot.clone(),
        }
    }
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults -> Config File -> Env Vars -> CLI Args
    let config = {
        let config_file = config::load_config_with_precedence(args.config.clone())?;
        let merged = config::merge_config(config_file);
        let with_env = config::apply_env_overrides(merged);
        config::apply_cli_overrides(with_env, args.overrides())
    };

    narrow_filter::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let workspace = match &config.snapshot_path {
        Some(path) => InMemoryWorkspace::from_snapshot(load_snapshot(path)?),
        None => InMemoryWorkspace::new(),
    };
    let messages: Vec<_> = workspace.messages().cloned().collect();
    let ctx = workspace.into_context(RealmSettings {
        zephyr_mirror_realm: config.zephyr_mirror_realm,
    });

    let query = args.query_string();
    let terms = parser::parse(&query, args.pills, ctx.people.as_ref());
    let mut filter = Filter::new(terms, ctx);
    filter.try_adjusting_for_moved_with_target(None);

    let report = NarrowReport::build(&query, &filter, &messages, args.spectator);
    info!(
        terms = report.terms.len(),
        matches = report.matching_message_ids.as_ref().map(Vec::len),
        "Narrow evaluated"
    );

    let json = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;

    Ok(())
}
