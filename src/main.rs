//! # PTS News Searcher
//!
//! Searches the PTS (公視新聞網) RSS feed by keyword and bulk-scrapes PTS
//! article pages into JSON.
//!
//! ## Usage
//!
//! ```sh
//! pts_news_searcher                       # scrape the default ID range
//! pts_news_searcher scrape -o ./out       # same, into ./out
//! pts_news_searcher search                # interactive keyword search
//! ```
//!
//! ## Architecture
//!
//! Two independent flows share one fetch primitive ([`fetch`]):
//! 1. **Scrape**: walk an ID range in order, extract each page
//!    ([`scrapers::pts`]), record successes and HTTP failures, flush both
//!    to `news{tries}.json` / `failed{tries}.json` however the run ends
//! 2. **Search**: fetch the RSS feed ([`feed`]) and answer keyword queries
//!    on the console ([`console`])

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod batch;
mod cli;
mod console;
mod feed;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod utils;

use batch::{BatchConfig, BatchDriver, RunOutcome, run_with_flush};
use cli::{Cli, Command, DEFAULT_TRIES, ScrapeArgs, SearchArgs};
use fetch::HttpFetcher;
use outputs::json::OutputPaths;
use url::Url;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs))?;
    match args.command() {
        Command::Scrape(scrape) => run_scrape(fetcher, args.base_url, scrape).await,
        Command::Search(search) => run_search(fetcher, search).await,
    }
}

async fn run_scrape(
    fetcher: HttpFetcher,
    base_url: Url,
    args: ScrapeArgs,
) -> Result<(), Box<dyn Error>> {
    // Early check: a bad output path should fail before hours of requests.
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    info!(start = args.start, end = args.end, tries = DEFAULT_TRIES, "Starting scrape");
    let driver = BatchDriver::new(
        fetcher,
        BatchConfig {
            base_url,
            ids: args.start..args.end,
            max_delay: Duration::from_millis(args.max_delay_ms),
        },
    );
    let paths = OutputPaths::new(&args.output_dir, DEFAULT_TRIES);

    let summary = run_with_flush(&driver, paths, ctrl_c()).await?;
    if summary.outcome == RunOutcome::Interrupted {
        warn!(
            succeeded = summary.log.output.len(),
            failed = summary.log.failed.len(),
            "Scrape interrupted; partial results written"
        );
    }
    Ok(())
}

async fn run_search(fetcher: HttpFetcher, args: SearchArgs) -> Result<(), Box<dyn Error>> {
    let input = console::spawn_stdin_reader();
    let mut stdout = std::io::stdout();
    console::run_session(&fetcher, &args.feed_url, input, &mut stdout, ctrl_c()).await?;
    Ok(())
}

/// Resolves on the first Ctrl+C.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
