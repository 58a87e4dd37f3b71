//! News source scrapers.
//!
//! Each scraper turns one fetched article page into structured fields without
//! touching the network; fetching and pacing belong to [`crate::batch`].
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | PTS News | [`pts`] | HTML scraping | Two historical page layouts |

pub mod pts;
