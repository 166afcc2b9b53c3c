//! Command-line interface definitions for the apod.tw vocabulary exporter.
//!
//! Every option has a default, so a bare invocation crawls the live archive
//! and writes the CSV into the current directory. All options can also be
//! supplied through environment variables.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the vocabulary exporter.
///
/// # Examples
///
/// ```sh
/// # Crawl apod.tw and write ./apod_tw_vocabulary_YYYYMMDD.csv
/// apod_tw_vocab
///
/// # Write into ./exports with at most 4 article fetches in flight
/// apod_tw_vocab -o ./exports -c 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First listing page of the daily archive; later pages append `page/N/`
    #[arg(long, env = "APOD_LISTING_URL", default_value = "https://apod.tw/daily/")]
    pub listing_url: String,

    /// Directory the CSV file is written into
    #[arg(short, long, env = "APOD_OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// File name prefix; the run date and `.csv` are appended
    #[arg(long, env = "APOD_OUTPUT_PREFIX", default_value = "apod_tw_vocabulary")]
    pub prefix: String,

    /// Maximum number of article pages fetched at once
    #[arg(
        short,
        long,
        env = "APOD_CONCURRENCY",
        default_value_t = 8,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: u16,

    /// Per-request timeout in seconds (no timeout when omitted)
    #[arg(long, env = "APOD_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Run date used for the future-article cut-off and the file name (YYYY-MM-DD)
    #[arg(long, env = "APOD_TODAY")]
    pub today: Option<NaiveDate>,
}

impl Cli {
    /// Path of the CSV produced for a run on `today`.
    pub fn output_path(&self, today: NaiveDate) -> String {
        format!(
            "{}/{}_{}.csv",
            self.output_dir.trim_end_matches('/'),
            self.prefix,
            crate::utils::date_stamp(today)
        )
    }
}
