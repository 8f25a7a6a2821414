//! search-batch command-line entry point
//!
//! Reads queries from the first column of a delimited file, sends them to the
//! configured search endpoint with bounded concurrency and writes one row per
//! query to the output file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use search_batch::{BatchSummary, Config, Dispatcher, csv_file};

/// Send one search request per input line and collect the results
#[derive(Parser, Debug)]
#[command(name = "search-batch", version, about)]
struct Cli {
    /// Input file; the first column of each record is a query
    input: PathBuf,

    /// Output file (Input, Result, Success, Error)
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key (overrides the configuration file)
    #[arg(long, env = "SEARCH_BATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Search endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Maximum number of requests in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Maximum attempts per query
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Load the configuration file, if any, then apply command-line overrides
    fn resolve_config(&self) -> search_batch::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(key) = &self.api_key {
            config.api.api_key = key.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.api.endpoint = endpoint.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.dispatch.max_concurrent = concurrency;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(secs) = self.timeout_secs {
            config.api.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> search_batch::Result<BatchSummary> {
    let config = cli.resolve_config()?;
    let inputs = csv_file::read_inputs(&cli.input)?;

    let dispatcher = Dispatcher::from_config(&config)?;
    let results = dispatcher.run(inputs).await;

    csv_file::write_results(&cli.output, &results)?;
    Ok(BatchSummary::from_results(&results))
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = cli.output.clone();
    match run(cli).await {
        Ok(summary) => {
            println!(
                "Processing complete. Results written to {} ({summary})",
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
