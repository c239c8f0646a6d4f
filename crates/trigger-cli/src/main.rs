mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::Context;
use std::path::PathBuf;
use trigger_core::types::{Category, Section, Timing};

#[derive(Parser)]
#[command(
    name = "trigger-explorer",
    about = "Browse, reorder and deploy trigger actions for an org snapshot",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .trigger-explorer/)
    #[arg(long, global = true, env = "TRIGGER_EXPLORER_ROOT")]
    root: Option<PathBuf>,

    /// Org snapshot JSON (default: <root>/org.json)
    #[arg(long, global = true, env = "TRIGGER_EXPLORER_ORG")]
    org: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log debug output to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List trigger settings
    Settings,

    /// Show the before/after actions for an object and event
    Actions {
        /// Object API name of the trigger setting
        #[arg(long)]
        object: String,
        #[arg(long, default_value = "created")]
        category: Category,
        /// Defaults to the object's default timing for the category
        #[arg(long)]
        timing: Option<Timing>,
    },

    /// Reorder a section by position
    Reorder {
        #[arg(long)]
        object: String,
        #[arg(long, default_value = "created")]
        category: Category,
        #[arg(long)]
        section: Section,
        /// Every action developer name in the section, in the desired order
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Assign explicit order values to actions in a section
    SetOrder {
        #[arg(long)]
        object: String,
        #[arg(long, default_value = "created")]
        category: Category,
        #[arg(long)]
        section: Section,
        /// NAME=VALUE pairs, e.g. TA_Validate=1.5
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Turn a trigger setting's bypass flag on (or off with --off)
    Bypass {
        #[arg(long)]
        object: String,
        #[arg(long)]
        off: bool,
    },

    /// Show the effective configuration and any warnings
    Config,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let ctx = Context {
        org_path: cli.org.unwrap_or_else(|| root.join("org.json")),
        root,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Settings => cmd::settings::run(&ctx),
        Commands::Actions {
            object,
            category,
            timing,
        } => cmd::actions::run(&ctx, &object, category, timing),
        Commands::Reorder {
            object,
            category,
            section,
            names,
        } => cmd::reorder::positional(&ctx, &object, category, section, &names),
        Commands::SetOrder {
            object,
            category,
            section,
            assignments,
        } => cmd::reorder::manual(&ctx, &object, category, section, &assignments),
        Commands::Bypass { object, off } => cmd::bypass::run(&ctx, &object, !off),
        Commands::Config => cmd::config::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
