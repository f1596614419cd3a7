//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use redirect_checker::config::ConfigLayer;

/// Verify that legacy URLs permanently redirect to their new destinations.
///
/// Reads a delimited file of (source, destination) pairs, follows each
/// source's redirect chain without auto-following, and writes a JSON report
/// listing invalid redirects first.
#[derive(Parser, Debug)]
#[command(name = "redirect-checker")]
#[command(author, version, about)]
pub struct Args {
    /// Delimited input file (comma, semicolon or tab separated) with a header row
    pub input: PathBuf,

    /// Config file (TOML). Defaults to $XDG_CONFIG_HOME/redirect-checker/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for the report (defaults to the input file's directory)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum redirects followed per source before giving up
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_redirections: Option<u32>,

    /// Retries after the first attempt on transient network failures
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Delay before the first retry in milliseconds (doubles per retry)
    #[arg(long, value_name = "MS")]
    pub initial_backoff: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout: Option<u64>,

    /// Pairs resolved concurrently per chunk
    #[arg(long, value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Pause between chunks in milliseconds
    #[arg(long, value_name = "MS")]
    pub chunk_delay: Option<u64>,

    /// Status codes accepted as permanent redirects
    #[arg(long, value_name = "CODES", value_delimiter = ',', value_parser = clap::value_parser!(u16).range(300..=399))]
    pub permanent_codes: Option<Vec<u16>>,

    /// Header of the source URL column
    #[arg(long, value_name = "NAME")]
    pub source_column: Option<String>,

    /// Header of the expected destination column
    #[arg(long, value_name = "NAME")]
    pub destination_column: Option<String>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Config values given on the command line.
    #[must_use]
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            max_redirections: self.max_redirections,
            max_retries: self.max_retries,
            initial_backoff_ms: self.initial_backoff,
            request_timeout_ms: self.request_timeout,
            chunk_size: self.chunk_size,
            chunk_delay_ms: self.chunk_delay,
            permanent_redirect_codes: self.permanent_codes.clone(),
            source_column: self.source_column.clone(),
            destination_column: self.destination_column.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

fn parse_chunk_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(value) => Ok(value),
        Err(e) => Err(e.to_string()),
    }
}
