//! kiln - Fetch resolved packages into a local content cache
//!
//! Reads a resolver lockfile, materializes every package it names in the
//! package cache, and writes resolved locators and content hashes back.

mod cli;
mod display;
mod error;
mod events;
mod lockfile;
mod logging;
mod manifests;

use crate::cli::{Cli, Commands};
use crate::display::{
    CommandResult, FetchReport, FetchRow, OutputRenderer, StatusReport, StatusRow,
};
use crate::error::CliError;
use crate::events::{EventHandler, PackageStatus};
use crate::lockfile::Lockfile;
use crate::manifests::ManifestCollector;
use clap::Parser;
use kiln_config::Config;
use kiln_errors::UserFacingError;
use kiln_events::{EventReceiver, EventSender};
use kiln_fetch::PackageFetcher;
use kiln_store::PackageStore;
use kiln_types::ColorChoice;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting kiln v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let (event_sender, event_receiver) = kiln_events::channel();

    let color = config.general.color;
    let renderer = OutputRenderer::new(cli.global.json, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.json, cli.global.debug);

    let result = execute_command_with_events(
        cli.command,
        config,
        event_sender,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    config: Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: Config,
    event_sender: EventSender,
) -> Result<CommandResult, CliError> {
    match command {
        Commands::Fetch {
            lockfile, frozen, ..
        } => fetch(&lockfile, frozen, config, event_sender).await,
        Commands::Status { lockfile } => status(&lockfile, &config).await,
    }
}

async fn fetch(
    lockfile_path: &Path,
    frozen: bool,
    config: Config,
    event_sender: EventSender,
) -> Result<CommandResult, CliError> {
    let lockfile = Lockfile::load(lockfile_path).await?;
    let collector = Arc::new(ManifestCollector::new());
    let fetcher = PackageFetcher::from_config(config)
        .with_event_sender(event_sender)
        .with_manifest_sink(Arc::clone(&collector) as Arc<dyn kiln_fetch::ManifestSink>);

    let started = Instant::now();
    let summary = fetcher.init(lockfile.packages.clone()).await?;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let lockfile_updated = !frozen && summary.references != lockfile.packages;
    if lockfile_updated {
        Lockfile {
            version: lockfile.version,
            packages: summary.references.clone(),
        }
        .save(lockfile_path)
        .await?;
        info!(path = %lockfile_path.display(), "lockfile updated");
    }

    let packages = summary
        .references
        .iter()
        .enumerate()
        .map(|(index, reference)| {
            let error = summary
                .tolerated
                .iter()
                .find(|failure| failure.index == index)
                .map(|failure| failure.error.user_message().into_owned());
            let status = if error.is_some() {
                PackageStatus::Skipped
            } else if summary.cache_hits.contains(&index) {
                PackageStatus::Cached
            } else {
                PackageStatus::Fetched
            };
            FetchRow {
                name: reference.name.clone(),
                version: reference.version.clone(),
                transport: reference.remote.transport.to_string(),
                status: status.as_str().to_string(),
                hash: reference.remote.hash.clone(),
                resolved: reference.remote.resolved.clone(),
                dependencies: collector.dependency_count(reference),
                error,
            }
        })
        .collect();

    Ok(CommandResult::Fetch(FetchReport {
        packages,
        fetched: summary.fetched,
        cached: summary.cached,
        skipped: summary.tolerated.len(),
        duration_ms,
        lockfile_updated,
    }))
}

async fn status(lockfile_path: &Path, config: &Config) -> Result<CommandResult, CliError> {
    let lockfile = Lockfile::load(lockfile_path).await?;
    let store = PackageStore::new(config.cache_path());

    let mut packages = Vec::with_capacity(lockfile.packages.len());
    for reference in &lockfile.packages {
        let dest = store.destination(reference);
        let cached = store.is_valid(&dest).await;
        packages.push(StatusRow {
            name: reference.name.clone(),
            version: reference.version.clone(),
            transport: reference.remote.transport.to_string(),
            cached,
            dest,
        });
    }

    Ok(CommandResult::Status(StatusReport {
        cache_dir: store.base_path().to_path_buf(),
        packages,
    }))
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &cli::GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(color) = &global.color {
        config.general.color = *color;
    }

    if let Some(cache_dir) = &global.cache_dir {
        if cache_dir.as_os_str().is_empty() {
            return Err(CliError::InvalidArguments(
                "--cache-dir must not be empty".to_string(),
            ));
        }
        config.paths.cache_path = Some(cache_dir.clone());
    }

    if let Commands::Fetch {
        concurrency: Some(concurrency),
        ..
    } = command
    {
        if *concurrency == 0 {
            return Err(CliError::InvalidArguments(
                "--concurrency must be at least 1".to_string(),
            ));
        }
        config.general.concurrency = *concurrency;
    }

    Ok(())
}

/// Directory for debug log files
fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kiln")
        .join("logs")
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let default_filter = "info,kiln=debug,kiln_fetch=debug";

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_dir = log_dir();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }

        let log_file = log_dir.join(format!(
            "kiln-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        if let Ok(file) = std::fs::File::create(&log_file) {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
                )
                .init();
            if !json_mode {
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            return;
        }
    }

    if json_mode {
        // JSON mode: keep stdout clean for the result document
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_target(false)
            .init();
    }
}
