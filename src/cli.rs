//! Command-line interface definitions for the PTS news searcher.
//!
//! Every option has a default, so running the binary with no arguments
//! scrapes the full default article range into `./news2.json` and
//! `./failed2.json`. The `2` in those names is [`DEFAULT_TRIES`], a fixed
//! label that is not configurable.

use crate::batch::{DEFAULT_MAX_DELAY, END_ARTICLE_ID, FIRST_ARTICLE_ID};
use crate::feed::DEFAULT_FEED_URL;
use crate::fetch::DEFAULT_TIMEOUT;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://news.pts.org.tw/";
pub const DEFAULT_TRIES: u32 = 2;

/// Command-line arguments for the PTS news searcher.
///
/// # Examples
///
/// ```sh
/// # Scrape the default range into the current directory
/// pts_news_searcher
///
/// # Scrape a slice of the range into ./out without pacing
/// pts_news_searcher scrape --start 706842 --end 706900 -o ./out --max-delay-ms 0
///
/// # Search the RSS feed interactively
/// pts_news_searcher search
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site root that article paths are joined onto
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scrape a range of article IDs into JSON files
    Scrape(ScrapeArgs),
    /// Search the RSS feed interactively
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ScrapeArgs {
    /// First article ID to scrape
    #[arg(long, default_value_t = FIRST_ARTICLE_ID)]
    pub start: u64,

    /// Article ID to stop before
    #[arg(long, default_value_t = END_ARTICLE_ID)]
    pub end: u64,

    /// Directory for the result files
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Upper bound of the random pause between requests, in milliseconds
    #[arg(long, default_value_t = DEFAULT_MAX_DELAY.as_millis() as u64)]
    pub max_delay_ms: u64,
}

impl Default for ScrapeArgs {
    fn default() -> Self {
        ScrapeArgs {
            start: FIRST_ARTICLE_ID,
            end: END_ARTICLE_ID,
            output_dir: PathBuf::from("."),
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    /// RSS feed to search
    #[arg(long, default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,
}

impl Cli {
    /// The subcommand to run; no subcommand means a default scrape.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Scrape(ScrapeArgs::default()))
    }
}
