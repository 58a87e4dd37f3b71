//! Output generation for scrape results.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news2.json     # ArticleRecord array, in ID order
//! └── failed2.json   # FailureRecord array, in ID order
//! ```
//!
//! The numeric suffix is the run's `tries` label.

pub mod json;
