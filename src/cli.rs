use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "pagesentry")]
#[command(about = "Watches registered URLs for content changes with adaptive check frequency")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Check a single URL once and print the result
    Check {
        /// URL to fetch
        #[arg(short, long)]
        url: String,

        /// Previously stored content hash to compare against
        #[arg(long)]
        last_hash: Option<String>,
    },

    /// Run one sweep over all monitored targets
    Sweep,

    /// Run the daemon: trigger endpoints plus the daily schedule
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path } => engine.init(path).await,
            Commands::Check { url, last_hash } => engine.check(&url, last_hash.as_deref()).await,
            Commands::Sweep => engine.sweep().await,
            Commands::Serve { bind } => engine.serve(bind).await,
        }
    }
}
