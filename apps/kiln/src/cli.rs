//! Command line interface definition

use clap::{Parser, Subcommand};
use kiln_types::ColorChoice;
use std::path::PathBuf;

/// kiln - Fetch resolved packages into a local content cache
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch resolved packages into a local content cache")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write structured debug logs to the kiln log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Package cache directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every package named in a lockfile
    #[command(alias = "f")]
    Fetch {
        /// Lockfile produced by the resolver
        #[arg(long, short, default_value = "kiln.lock.json")]
        lockfile: PathBuf,

        /// Maximum number of packages fetched at once
        #[arg(long, short = 'j')]
        concurrency: Option<usize>,

        /// Do not write resolved locators and hashes back to the lockfile
        #[arg(long)]
        frozen: bool,
    },

    /// Show which lockfile packages are already cached
    Status {
        /// Lockfile produced by the resolver
        #[arg(long, short, default_value = "kiln.lock.json")]
        lockfile: PathBuf,
    },
}
