//! Scribe CLI - Command-line interface for Scribe
//!
//! This is the main entry point for users driving the documentation
//! pipeline: scanning a project into the symbol graph, inspecting the
//! generation plan, and running documentation passes.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(author = "Scribe Contributors")]
#[command(version)]
#[command(about = "LSP-driven documentation for codebases", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Scribe in a directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Scan the project and refresh the symbol graph
    Scan {
        /// Path to scan (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show graph statistics and scan state
    Status {
        /// Path to check (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show the order symbols will be documented in
    Plan {
        /// Path to plan (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum symbols to list
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show the generation context for a symbol
    Context {
        /// Path of the project (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Symbol id (defaults to the next scheduled symbol)
        #[arg(short, long)]
        symbol: Option<i64>,
    },

    /// Run a documentation pass over undocumented symbols
    Document {
        /// Path to document (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Generator attempts per symbol
        #[arg(short, long, default_value = "2")]
        attempts: u32,
    },

    /// List the configured language servers
    Servers {
        /// Path of the project (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Scan { path } => commands::scan(&path).await,
        Commands::Status { path } => commands::status(&path),
        Commands::Plan { path, limit } => commands::plan(&path, limit),
        Commands::Context { path, symbol } => commands::context(&path, symbol),
        Commands::Document { path, attempts } => commands::document(&path, attempts).await,
        Commands::Servers { path } => commands::servers(&path),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
