//! shrinkwatch - keeps images in a directory under a size limit.
//!
//! This binary loads the settings, starts the directory watcher and runs the
//! sequential processing service until interrupted.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shrinkwatch::{
    config::{Cli, Command, Settings, ShrinkArgs},
    error::ConfigError,
    pipeline::{ImageProcessor, ProcessOutcome, WatchService},
    shrink::SizeBudget,
    watch::DirectoryWatcher,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (args, command) = cli.into_parts();

    init_logging(args.verbose);

    match command {
        Command::Watch => match args.load() {
            Ok(settings) => run_watch(settings).await,
            Err(e) => config_failure(e),
        },
        Command::Shrink(shrink) => match args.load_budget() {
            Ok(budget) => run_shrink(budget, shrink).await,
            Err(e) => config_failure(e),
        },
        Command::Check => match args.load() {
            Ok(settings) => run_check(&settings),
            Err(e) => config_failure(e),
        },
    }
}

fn config_failure(error: ConfigError) -> ExitCode {
    error!("Configuration error: {}", error);
    ExitCode::FAILURE
}

// =============================================================================
// Watch Command
// =============================================================================

async fn run_watch(settings: Settings) -> ExitCode {
    print_banner(&settings);

    let (watcher, events) =
        match DirectoryWatcher::start(&settings.directory, settings.queue_capacity) {
            Ok(started) => started,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        };

    info!("Waiting for new files... (press Ctrl+C to stop)");

    let stats = WatchService::new(&settings)
        .run(events, shutdown_signal())
        .await;

    drop(watcher);

    info!(
        "Service stopped: {} replaced, {} unchanged, {} failed",
        stats.replaced, stats.already_compliant, stats.failed
    );

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner(settings: &Settings) {
    let version = env!("CARGO_PKG_VERSION");
    info!("══════════════════════════════════════════════════");
    info!("  shrinkwatch v{}", version);
    info!("  Watched directory: {}", settings.directory.display());
    info!(
        "  Maximum file size: {} KB ({} bytes)",
        settings.max_size_kb,
        settings.budget.bytes()
    );
    info!("══════════════════════════════════════════════════");
}

/// Resolves on Ctrl+C.
///
/// If the signal handler cannot be installed the service keeps running.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "shrinkwatch=debug"
    } else {
        "shrinkwatch=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Shrink Command
// =============================================================================

async fn run_shrink(budget: SizeBudget, args: ShrinkArgs) -> ExitCode {
    let processor = ImageProcessor::new(budget);
    let mut failures = 0;

    for path in args.files {
        let job_path = path.clone();
        let result = tokio::task::spawn_blocking(move || processor.process_file(&job_path)).await;

        match result {
            Ok(Ok(ProcessOutcome::Replaced(replacement))) => {
                info!("{}: {}", path.display(), replacement.summary());
            }
            Ok(Ok(ProcessOutcome::AlreadyCompliant { .. })) => {
                info!("{}: already in its shrunk form", path.display());
            }
            Ok(Err(e)) => {
                failures += 1;
                error!("{}: {}", path.display(), e);
            }
            Err(e) => {
                failures += 1;
                error!("{}: processing task failed: {}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(settings: &Settings) -> ExitCode {
    println!("shrinkwatch Configuration Check");
    println!("═══════════════════════════════");
    println!();
    println!("✓ Directory: {}", settings.directory.display());
    println!(
        "✓ Max size: {} KB ({} bytes)",
        settings.max_size_kb,
        settings.budget.bytes()
    );
    println!("✓ Settle interval: {:?}", settings.settle_interval);
    println!("✓ Settle timeout: {:?}", settings.settle_timeout);
    println!("✓ Queue capacity: {}", settings.queue_capacity);
    println!();
    println!("═══════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
