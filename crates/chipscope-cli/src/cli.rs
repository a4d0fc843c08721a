//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chipscope")]
#[command(about = "Identify contactless chips and match them to compatible products")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a recorded scan and print the result as JSON
    Scan {
        /// Recorded scan fixture (JSON)
        #[arg(short, long)]
        fixture: PathBuf,

        /// Detector configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the product catalog
    Catalog,

    /// Print the default detector configuration as TOML
    Config,
}
