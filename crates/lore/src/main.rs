//! Lore CLI - navigation spine tools.
//!
//! Provides commands for:
//! - `build`: Rebuild and store a project's spine
//! - `show`: Print a project's spine as a tree or as JSON
//! - `nav`: Show breadcrumbs and prev/next links for one node
//! - `tags`: List tag counts of a project
//! - `watch`: Rebuild spines from change events read on stdin

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, NavArgs, ShowArgs, TagsArgs, WatchArgs};
use output::Output;

/// Lore - navigation spine for sectioned content.
#[derive(Parser)]
#[command(name = "lore", version, about)]
struct Cli {
    /// Enable verbose output (rebuild and timing logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a project's spine and store it.
    Build(BuildArgs),
    /// Print a project's spine.
    Show(ShowArgs),
    /// Show navigation links for one node.
    Nav(NavArgs),
    /// List tag counts of a project.
    Tags(TagsArgs),
    /// Rebuild spines from change events (JSON lines on stdin).
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Show(args) => args.execute(),
        Commands::Nav(args) => args.execute(),
        Commands::Tags(args) => args.execute(),
        Commands::Watch(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
