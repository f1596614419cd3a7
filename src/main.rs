//! CLI entry point for the redirect checker.

use anyhow::{Context, Result};
use clap::Parser;
use redirect_checker::check::{BatchScheduler, HeaderFetcher, RedirectResolver};
use redirect_checker::config::{
    CheckerConfig, ConfigLayer, load_default_file_config, load_file_config,
};
use redirect_checker::parser::read_pairs;
use redirect_checker::report::{report_path_for, write_report};
use tracing::{debug, info};

mod cli;
mod progress;

use cli::Args;
use progress::CheckProgress;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = resolve_config(&args)?;
    debug!(?config, "effective configuration");

    // Input problems abort before any network traffic
    let parsed = read_pairs(&args.input, &config.column_names())
        .with_context(|| format!("Failed to read input '{}'", args.input.display()))?;
    info!(
        rows = parsed.len(),
        usable = parsed.usable_count(),
        "Redirect checker starting"
    );

    let fetcher = HeaderFetcher::new(config.request_timeout, config.retry_policy())?;
    let resolver =
        RedirectResolver::with_max_hops(fetcher, config.validity_policy(), config.max_redirections);
    let scheduler = BatchScheduler::new(resolver, config.chunk_size, config.chunk_delay)?;

    let progress = CheckProgress::new(!(args.no_progress || args.quiet), parsed.usable_count());
    let report = scheduler
        .run_with_observer(&parsed.pairs, |event| progress.observe(event))
        .await;
    progress.finish();

    let report_path = report_path_for(&args.input, config.output_dir.as_deref());
    write_report(&report, &report_path)
        .with_context(|| format!("Failed to write report '{}'", report_path.display()))?;

    let summary = report.summary();
    info!(
        valid = summary.valid,
        invalid = summary.invalid,
        total = summary.total,
        errored = summary.errored,
        skipped = summary.skipped,
        "Check complete"
    );
    if !args.quiet {
        println!(
            "valid: {}  invalid: {}  total: {}  errored: {}  skipped: {}",
            summary.valid, summary.invalid, summary.total, summary.errored, summary.skipped
        );
        println!("report: {}", report_path.display());
    }

    Ok(())
}

/// Merges defaults, config file, environment and CLI flags, in that order.
fn resolve_config(args: &Args) -> Result<CheckerConfig> {
    let mut config = CheckerConfig::default();

    let file_layer = match &args.config {
        Some(path) => Some(load_file_config(path)?),
        None => load_default_file_config()?,
    };
    if let Some(layer) = &file_layer {
        config.merge(layer);
    }

    config.merge(&ConfigLayer::from_env()?);
    config.merge(&args.config_layer());
    config.validate()?;
    Ok(config)
}
