//! Data models for crawled articles and their exported representation.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: One daily archive page with its publication date and glossary
//! - [`VocabularyEntry`]: A single row of an article's vocabulary table
//! - [`OutputRow`]: The flattened, CSV-ready form of one vocabulary entry
//!
//! The CSV column names are a mix of Latin and Han script headings, hence the
//! explicit `#[serde(rename)]` attributes on [`OutputRow`].

use chrono::NaiveDate;
use serde::Serialize;

/// A daily archive article after its vocabulary table has been extracted.
///
/// Articles whose URL carries no usable date get [`Article::UNKNOWN_DATE`],
/// which sorts after every real date when the export orders by date descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Publication date derived from the article URL.
    pub date: NaiveDate,
    /// The absolute URL the article was fetched from.
    pub source: String,
    /// Vocabulary rows in source table order.
    pub vocabulary: Vec<VocabularyEntry>,
}

impl Article {
    /// Sentinel used when the URL has no parseable `yyyyMMdd` run.
    pub const UNKNOWN_DATE: NaiveDate = NaiveDate::MIN;

    /// Whether the date came from the URL rather than the sentinel.
    pub fn has_known_date(&self) -> bool {
        self.date != Self::UNKNOWN_DATE
    }
}

/// One row of the five-column glossary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    /// Han-Latin mixed orthography (漢羅).
    pub han_lo: String,
    /// Pe̍h-ōe-jī romanisation.
    pub poj: String,
    /// Taiwanese Romanization System (KIP / Tâi-lô).
    pub kip: String,
    /// Mandarin gloss (華語).
    pub mandarin: String,
    /// English gloss.
    pub english: String,
}

/// A single exported CSV record.
///
/// Field order matches [`OutputRow::HEADER`].
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub DictWordID: String,
    pub SuBe: String,
    #[serde(rename = "漢羅")]
    pub HanLo: String,
    pub POJ: String,
    pub KIP: String,
    #[serde(rename = "華語")]
    pub Mandarin: String,
    pub English: String,
    pub LaigoanMia: String,
    pub LaigoanBangchi: String,
}

impl OutputRow {
    /// Header row written at the top of every export.
    pub const HEADER: [&'static str; 9] = [
        "DictWordID",
        "SuBe",
        "漢羅",
        "POJ",
        "KIP",
        "華語",
        "English",
        "LaigoanMia",
        "LaigoanBangchi",
    ];
}
