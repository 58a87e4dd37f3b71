//! Interactive keyword search over the RSS feed.
//!
//! The session prints every entry, then prompts for keywords until Ctrl+C or
//! end of input. Lines are read on a dedicated thread
//! ([`spawn_stdin_reader`]) because a blocking stdin read cannot be cancelled
//! and would otherwise keep the runtime from shutting down.

use crate::feed::{fetch_feed, search_entries};
use crate::fetch::Fetch;
use crate::models::FeedEntry;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const PROMPT: &str = "Enter keyword to search (or Ctrl+C to exit): ";

/// Forward stdin lines to the returned channel until EOF or a read error.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Fetch the feed, list it, then answer keyword queries read from `input`.
///
/// Ends cleanly when `interrupt` resolves or `input` is closed.
pub async fn run_session<F, W, I>(
    fetcher: &F,
    feed_url: &str,
    mut input: mpsc::UnboundedReceiver<String>,
    out: &mut W,
    interrupt: I,
) -> io::Result<()>
where
    F: Fetch,
    W: Write,
    I: Future<Output = ()>,
{
    writeln!(out, "Fetching news from {feed_url}...")?;
    let entries = fetch_feed(fetcher, feed_url).await;
    if entries.is_empty() {
        writeln!(out, "Could not retrieve news. Exiting.")?;
        return Ok(());
    }

    writeln!(out, "Successfully fetched {} news articles.", entries.len())?;
    print_entries(&entries, out)?;

    tokio::pin!(interrupt);
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = tokio::select! {
            biased;
            () = &mut interrupt => None,
            line = input.recv() => line,
        };
        let Some(line) = line else { break };

        let keyword = line.trim();
        if keyword.is_empty() {
            continue;
        }
        let results = search_entries(&entries, keyword);
        debug!(%keyword, matches = results.len(), "Keyword search");
        print_results(keyword, &results, out)?;
    }

    writeln!(out, "\nExiting program.")?;
    info!("Search session ended");
    Ok(())
}

fn print_entries<W: Write>(entries: &[FeedEntry], out: &mut W) -> io::Result<()> {
    writeln!(out, "\n--- All News Articles ---")?;
    for entry in entries {
        writeln!(out, "{}\n\n{}", entry.title, entry.summary)?;
        writeln!(out, "{}", "-".repeat(40))?;
    }
    writeln!(out, "{}\n", "-".repeat(25))
}

fn print_results<W: Write>(keyword: &str, results: &[&FeedEntry], out: &mut W) -> io::Result<()> {
    if results.is_empty() {
        return writeln!(out, "No articles found matching '{keyword}'.");
    }

    writeln!(out, "\nFound {} articles matching '{keyword}':", results.len())?;
    for (i, entry) in results.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, entry.title)?;
        writeln!(out, "     Link: {}", entry.link)?;
        writeln!(out, "{}", "-".repeat(20))?;
    }
    Ok(())
}
