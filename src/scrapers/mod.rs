//! Archive scrapers for fetching and parsing vocabulary articles.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: Discover article URLs from a listing page
//! 2. **Fetching**: Download each article and parse its vocabulary table
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | 逐工一幅天文圖 (apod.tw) | [`apod`] | HTML scraping | Paginated daily archive, one glossary table per article |
//!
//! Failed article fetches are logged and skipped; a failed listing fetch is
//! reported to the caller, which decides whether to stop.

pub mod apod;
