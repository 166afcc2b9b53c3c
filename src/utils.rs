//! Utility functions for date handling, text cleanup, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Publication date extraction from archive URLs
//! - `yyyyMMdd` date stamps for identifiers and file names
//! - Whitespace normalisation for scraped table cells
//! - File system validation for the output directory

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// `chrono` format string for the compact `yyyyMMdd` form used in URLs.
pub const DATE_STAMP_FORMAT: &str = "%Y%m%d";

static TRAILING_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{8})/?$").expect("trailing date pattern is valid"));

/// Extract the publication date encoded at the end of an article URL.
///
/// The URL must end in eight digits, optionally followed by a single `/`
/// (e.g. `https://apod.tw/daily/20240115/`). Runs that are not a real
/// calendar date yield `None`, same as a missing run.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     date_from_url("https://apod.tw/daily/20240115/"),
///     NaiveDate::from_ymd_opt(2024, 1, 15)
/// );
/// assert_eq!(date_from_url("https://apod.tw/daily/"), None);
/// ```
pub fn date_from_url(url: &str) -> Option<NaiveDate> {
    let caps = TRAILING_DATE.captures(url)?;
    NaiveDate::parse_from_str(&caps[1], DATE_STAMP_FORMAT).ok()
}

/// Format a date as `yyyyMMdd`.
///
/// Dates outside the four-digit year range (including the unknown-date
/// sentinel) render as `00000000` so identifiers keep a fixed width.
pub fn date_stamp(date: NaiveDate) -> String {
    if (0..=9999).contains(&date.year()) {
        date.format(DATE_STAMP_FORMAT).to_string()
    } else {
        "00000000".to_string()
    }
}

/// Collect the visible text of an element with whitespace collapsed.
///
/// Text nodes are concatenated as-is; `<br>` elements contribute a space.
/// Runs of whitespace collapse to a single space and the result is trimmed.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) if el.name() == "br" => raw.push(' '),
            _ => {}
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
