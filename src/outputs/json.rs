//! JSON output for scrape results.
//!
//! Both files are UTF-8, pretty printed with two-space indentation, and keep
//! non-ASCII text unescaped so Chinese titles stay readable.
//!
//! Writes are synchronous: [`crate::batch::ResultsSink`] also flushes from
//! `Drop`, where nothing can be awaited.

use crate::models::{ArticleRecord, FailureRecord};
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// Where one run's two result files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub news: PathBuf,
    pub failed: PathBuf,
}

impl OutputPaths {
    /// `{dir}/news{tries}.json` and `{dir}/failed{tries}.json`.
    pub fn new(dir: impl AsRef<Path>, tries: u32) -> Self {
        let dir = dir.as_ref();
        OutputPaths {
            news: dir.join(format!("news{tries}.json")),
            failed: dir.join(format!("failed{tries}.json")),
        }
    }
}

/// Write both result files.
///
/// The failures file is attempted even when the articles file could not be
/// written; the first error is returned.
#[instrument(level = "info", skip_all, fields(news = %paths.news.display(), failed = %paths.failed.display()))]
pub fn write_results(
    articles: &[ArticleRecord],
    failures: &[FailureRecord],
    paths: &OutputPaths,
) -> Result<(), Box<dyn Error>> {
    let news = write_json_array(&paths.news, articles);
    let failed = write_json_array(&paths.failed, failures);

    match (&news, &failed) {
        (Ok(()), Ok(())) => {
            info!(
                articles = articles.len(),
                failures = failures.len(),
                "Wrote scrape results"
            );
        }
        _ => {
            if let Err(e) = &news {
                error!(path = %paths.news.display(), error = %e, "Failed writing articles");
            }
            if let Err(e) = &failed {
                error!(path = %paths.failed.display(), error = %e, "Failed writing failures");
            }
        }
    }

    news.and(failed)
}

fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), Box<dyn Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
