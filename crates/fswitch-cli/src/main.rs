mod cmd;
mod output;
mod prompt;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fswitch",
    about = "Snapshot and restore feature branches with their database exports",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .project-x/ or .git/)
    #[arg(long, global = true, env = "FSWITCH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved features
    List,

    /// Show the record for a feature (default: current branch)
    Info { name: Option<String> },

    /// Check out a feature branch and re-import its database
    Checkout { name: String },

    /// Create a new feature from an existing branch
    Create { name: String },

    /// Export the database and record it for a feature (default: current branch)
    Save { name: Option<String> },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::List => cmd::list::run(&root, cli.json),
        Commands::Info { name } => cmd::info::run(&root, name.as_deref(), cli.json),
        Commands::Checkout { name } => cmd::checkout::run(&root, &name, cli.json),
        Commands::Create { name } => cmd::create::run(&root, &name, cli.json),
        Commands::Save { name } => cmd::save::run(&root, name.as_deref(), cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
