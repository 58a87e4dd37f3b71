//! Sequential bulk scrape over a contiguous range of PTS article IDs.
//!
//! # Flow
//!
//! For each ID, in increasing order and one request at a time:
//! 1. Build `{base}article/{id}`
//! 2. Fetch it; on success extract the fields and append an [`ArticleRecord`]
//! 3. On a non-success status append a [`FailureRecord`] and continue
//! 4. On a network failure stop the run
//! 5. Sleep a random pause before the next ID
//!
//! Results accumulate in a [`ScrapeLog`] owned by a [`ResultsSink`]. The sink
//! is flushed to disk however the run ends: completion, a network error,
//! Ctrl+C, or a panic unwinding through it.

use crate::fetch::{Fetch, FetchError};
use crate::models::{ArticlePage, ArticleRecord, FailureRecord};
use crate::outputs::json::{OutputPaths, write_results};
use crate::scrapers::pts::extract_article;
use crate::utils::{pacing_delay, truncate_for_log};
use std::error::Error;
use std::future::Future;
use std::mem;
use std::ops::Range;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// First article ID of the default scrape range.
pub const FIRST_ARTICLE_ID: u64 = 706842;
/// Exclusive end of the default scrape range.
pub const END_ARTICLE_ID: u64 = 786886;
/// Upper bound of the random pause between requests.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1);

/// Successes and failures collected so far, both in ID order.
#[derive(Debug, Default)]
pub struct ScrapeLog {
    pub output: Vec<ArticleRecord>,
    pub failed: Vec<FailureRecord>,
}

/// Owns a [`ScrapeLog`] and guarantees it reaches disk.
///
/// Call [`ResultsSink::flush`] on every normal exit path. If the sink is
/// dropped unflushed (a panic unwinding through the run) it writes the files
/// from `Drop` and logs any error, since nothing can be returned from there.
#[derive(Debug)]
pub struct ResultsSink {
    log: ScrapeLog,
    paths: OutputPaths,
    flushed: bool,
}

impl ResultsSink {
    pub fn new(paths: OutputPaths) -> Self {
        ResultsSink {
            log: ScrapeLog::default(),
            paths,
            flushed: false,
        }
    }

    pub fn log_mut(&mut self) -> &mut ScrapeLog {
        &mut self.log
    }

    /// Write both result files and hand back the collected log.
    pub fn flush(mut self) -> Result<ScrapeLog, Box<dyn Error>> {
        self.flushed = true;
        write_results(&self.log.output, &self.log.failed, &self.paths)?;
        Ok(mem::take(&mut self.log))
    }
}

impl Drop for ResultsSink {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }
        warn!(
            articles = self.log.output.len(),
            failures = self.log.failed.len(),
            "Results dropped without flush; writing them now"
        );
        if let Err(e) = write_results(&self.log.output, &self.log.failed, &self.paths) {
            error!(error = %e, "Failed to flush results on drop");
        }
    }
}

/// Settings for one scrape run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Site root; article URLs are `{base_url}article/{id}`.
    pub base_url: Url,
    pub ids: Range<u64>,
    /// Upper bound of the random pause after each ID. Zero disables pacing.
    pub max_delay: Duration,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub log: ScrapeLog,
}

/// Drives the fetcher and extractor across the configured ID range.
#[derive(Debug)]
pub struct BatchDriver<F> {
    fetcher: F,
    config: BatchConfig,
}

impl<F: Fetch> BatchDriver<F> {
    pub fn new(fetcher: F, config: BatchConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn article_url(&self, id: u64) -> Result<Url, url::ParseError> {
        self.config.base_url.join(&format!("article/{id}"))
    }

    /// Scrape every ID in the range into `log`.
    ///
    /// Non-success statuses are recorded and skipped. A network error stops
    /// the loop and is returned; `log` keeps everything gathered before it.
    #[instrument(level = "info", skip_all, fields(start = self.config.ids.start, end = self.config.ids.end))]
    pub async fn run(&self, log: &mut ScrapeLog) -> Result<(), Box<dyn Error>> {
        for id in self.config.ids.clone() {
            let href = self.article_url(id)?.to_string();
            info!(%href, "Scraping");

            match self.fetcher.fetch(&href).await {
                Ok(body) => {
                    let page = ArticlePage::decode(&body.bytes, body.declared_encoding.as_deref());
                    let record = extract_article(&page, &href).into_record(href);
                    info!(id, title = %truncate_for_log(&record.title, 80), "Succeeded");
                    log.output.push(record);
                }
                Err(e @ FetchError::Http { .. }) => {
                    warn!(id, error = %e, "Failed");
                    log.failed.push(FailureRecord {
                        id,
                        href,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(id, error = %e, "Network failure; stopping run");
                    return Err(e.into());
                }
            }

            sleep(pacing_delay(self.config.max_delay)).await;
        }
        Ok(())
    }
}

/// Run `driver` until it finishes, fails, or `interrupt` resolves, then flush
/// the results to `paths`.
///
/// The files are written on every path. A run error takes precedence over a
/// flush error in the returned result.
pub async fn run_with_flush<F, I>(
    driver: &BatchDriver<F>,
    paths: OutputPaths,
    interrupt: I,
) -> Result<RunSummary, Box<dyn Error>>
where
    F: Fetch,
    I: Future<Output = ()>,
{
    let t0 = Instant::now();
    let mut sink = ResultsSink::new(paths);

    let outcome = tokio::select! {
        biased;
        () = interrupt => {
            warn!("Interrupted; flushing partial results");
            Ok(RunOutcome::Interrupted)
        }
        result = driver.run(sink.log_mut()) => result.map(|()| RunOutcome::Completed),
    };

    let flushed = sink.flush();
    let outcome = outcome?;
    let log = flushed?;

    let elapsed = t0.elapsed();
    info!(
        ?outcome,
        succeeded = log.output.len(),
        failed = log.failed.len(),
        secs = elapsed.as_secs(),
        "Scrape run finished"
    );
    Ok(RunSummary { outcome, log })
}
