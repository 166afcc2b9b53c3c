//! # apod.tw Vocabulary Exporter
//!
//! Crawls the daily archive of [逐工一幅天文圖](https://apod.tw), collects the
//! Taiwanese glossary table that closes every article, and writes all entries
//! to a single CSV file ordered by publication date, newest first.
//!
//! ## Usage
//!
//! ```sh
//! apod_tw_vocab
//! apod_tw_vocab -o ./exports --concurrency 4
//! ```
//!
//! ## Architecture
//!
//! The run is a single pipeline:
//! 1. **Pagination**: Visit listing pages in order until one is empty, fails
//!    to load, or links an article dated after today
//! 2. **Fetching**: Download each listed article, several at a time
//! 3. **Parsing**: Extract the date from the URL and the glossary rows from the page
//! 4. **Output**: Sort by date and write `<prefix>_<yyyyMMdd>.csv`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod crawler;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use crawler::Crawler;
use outputs::vocabulary_csv;
use scrapers::apod::ArchiveSite;
use utils::ensure_writable_dir;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
#[instrument]
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

    let start_time = std::time::Instant::now();
    info!("apod_tw_vocab starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let output_path = args.output_path(today);

    // Fail before crawling if the CSV can never be written
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let site = ArchiveSite::new(&args.listing_url)?;
    let mut client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10));
    if let Some(secs) = args.timeout_secs {
        client = client.timeout(Duration::from_secs(secs));
    }
    let client = client.build()?;

    // ---- Crawl ----
    let crawler = Crawler::new(client, site, today, usize::from(args.concurrency));
    let report = crawler.run().await;
    let pages_crawled = report.pages_crawled;
    let articles = report.articles.len();
    info!(
        articles,
        pages = pages_crawled,
        stop = %report.stop,
        "Crawl finished"
    );

    // ---- Export ----
    let rows = match vocabulary_csv::export(report.articles, Path::new(&output_path)) {
        Ok(rows) => rows,
        Err(e) => {
            error!(path = %output_path, error = %e, "Failed writing CSV");
            return Err(e);
        }
    };
    info!("Data saved to {output_path}");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        pages = pages_crawled,
        articles,
        rows,
        "Execution complete"
    );

    Ok(())
}
