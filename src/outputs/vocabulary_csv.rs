//! CSV export of the collected vocabulary.
//!
//! Articles are ordered newest first, then flattened into one [`OutputRow`]
//! per glossary entry. Each row gets a `DictWordID` of the form
//! `APODTW-YYYYMMDD-NNN`, where `NNN` is the 1-based position of the entry
//! among the accepted rows of its article.
//!
//! # Output
//!
//! ```text
//! DictWordID,SuBe,漢羅,POJ,KIP,華語,English,LaigoanMia,LaigoanBangchi
//! APODTW-20240115-001,APODTW-20240115-001,天文,thian-bûn,...
//! ```

use crate::models::{Article, OutputRow};
use crate::utils::date_stamp;
use chrono::NaiveDate;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Prefix shared by every generated identifier.
pub const DICT_WORD_ID_PREFIX: &str = "APODTW";

/// Source label written into the `LaigoanMia` column.
pub const SOURCE_LABEL: &str = "逐工一幅天文圖 https://apod.tw";

/// Identifier for the `index`-th (1-based) entry of an article dated `date`.
///
/// # Examples
///
/// ```ignore
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(dict_word_id(date, 3), "APODTW-20240115-003");
/// ```
pub fn dict_word_id(date: NaiveDate, index: usize) -> String {
    format!("{DICT_WORD_ID_PREFIX}-{}-{index:03}", date_stamp(date))
}

/// Order articles by date, newest first.
///
/// The sort is stable, so articles sharing a date keep their collection
/// order. Articles with the unknown-date sentinel end up last.
pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Flatten already-sorted articles into CSV rows.
pub fn build_rows(articles: &[Article]) -> Vec<OutputRow> {
    articles
        .iter()
        .flat_map(|article| {
            article
                .vocabulary
                .iter()
                .enumerate()
                .map(move |(i, entry)| {
                    let id = dict_word_id(article.date, i + 1);
                    OutputRow {
                        DictWordID: id.clone(),
                        SuBe: id,
                        HanLo: entry.han_lo.clone(),
                        POJ: entry.poj.clone(),
                        KIP: entry.kip.clone(),
                        Mandarin: entry.mandarin.clone(),
                        English: entry.english.clone(),
                        LaigoanMia: SOURCE_LABEL.to_string(),
                        LaigoanBangchi: article.source.clone(),
                    }
                })
        })
        .collect()
}

/// Write the header followed by `rows` to a new CSV file at `path`.
///
/// Records end in CRLF and fields are quoted only when they need it.
/// An existing file at `path` is replaced.
#[instrument(level = "info", skip(rows), fields(rows = rows.len()))]
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<(), Box<dyn Error>> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(::csv::Terminator::CRLF)
        .from_path(path)?;
    writer.write_record(OutputRow::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Sort, flatten and write the collected articles.
///
/// Returns the number of vocabulary rows written (header excluded).
pub fn export(mut articles: Vec<Article>, path: &Path) -> Result<usize, Box<dyn Error>> {
    let undated = articles.iter().filter(|a| !a.has_known_date()).count();
    if undated > 0 {
        warn!(undated, "Some articles have no date in their URL; listing them last");
    }
    sort_articles(&mut articles);
    let rows = build_rows(&articles);
    write_rows(path, &rows)?;
    info!(
        path = %path.display(),
        articles = articles.len(),
        rows = rows.len(),
        "Wrote vocabulary CSV"
    );
    Ok(rows.len())
}
