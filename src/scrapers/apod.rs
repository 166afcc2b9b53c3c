//! apod.tw daily archive scraper.
//!
//! This module scrapes [逐工一幅天文圖](https://apod.tw), the Taiwanese
//! translation of Astronomy Picture of the Day. Every daily article closes
//! with a `詞彙學習` heading followed by a five-column glossary table.
//!
//! # URL Pattern
//!
//! The listing is paginated as `https://apod.tw/daily/` (page 1) and
//! `https://apod.tw/daily/page/N/`. Articles live at
//! `https://apod.tw/daily/YYYYMMDD/`.

use crate::models::{Article, VocabularyEntry};
use crate::utils::{date_from_url, normalized_text};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument};
use url::Url;

/// Error type for fetches, `Send` so fetch futures can be polled from any task.
pub type FetchError = Box<dyn Error + Send + Sync>;

/// Text that identifies the glossary heading in an article.
pub const VOCABULARY_HEADING: &str = "詞彙學習";

/// Number of cells a glossary row must have to be accepted.
const VOCABULARY_COLUMNS: usize = 5;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector is valid"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2").expect("heading selector is valid"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("row selector is valid"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("cell selector is valid"));

/// The paginated archive being crawled.
///
/// Built from the URL of listing page 1; article links must sit directly
/// beneath it as an eight-digit date segment.
#[derive(Debug, Clone)]
pub struct ArchiveSite {
    listing_url: Url,
    article_pattern: Regex,
}

impl ArchiveSite {
    /// Describe an archive from its first listing page.
    ///
    /// A missing trailing `/` is added so that `page/N/` and article paths
    /// resolve beneath the listing path.
    pub fn new(listing_url: &str) -> Result<Self, Box<dyn Error>> {
        let mut listing_url = Url::parse(listing_url)?;
        if !listing_url.path().ends_with('/') {
            let path = format!("{}/", listing_url.path());
            listing_url.set_path(&path);
        }
        let article_pattern = Regex::new(&format!(
            r"^{}\d{{8}}/",
            regex::escape(listing_url.as_str())
        ))?;
        Ok(Self {
            listing_url,
            article_pattern,
        })
    }

    /// URL of listing page `page` (1-based).
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            return self.listing_url.to_string();
        }
        match self.listing_url.join(&format!("page/{page}/")) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}page/{page}/", self.listing_url),
        }
    }

    /// Whether an absolute URL points at a dated article of this archive.
    pub fn is_article_url(&self, url: &str) -> bool {
        self.article_pattern.is_match(url)
    }
}

/// Fetch a URL and return its body, following redirects.
///
/// Non-success HTTP statuses are errors.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, FetchError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Extract the dated article links from a listing page.
///
/// Every `a[href]` is resolved against `page_url` and kept when it matches
/// the archive's article pattern. Duplicates are dropped, keeping the first
/// occurrence, so the result preserves listing order.
pub fn extract_article_links(document: &Html, page_url: &str, site: &ArchiveSite) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(base) => base,
        Err(_) => return Vec::new(),
    };

    document
        .select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|url| url.to_string())
        .filter(|url| site.is_article_url(url))
        .unique()
        .collect()
}

/// Build an [`Article`] from a fetched article page.
///
/// The date comes from the URL; a missing or invalid date becomes
/// [`Article::UNKNOWN_DATE`]. A page without a glossary still produces an
/// article, just with no vocabulary.
pub fn parse_article(document: &Html, source: &str) -> Article {
    let vocabulary = vocabulary_table(document)
        .map(parse_vocabulary_rows)
        .unwrap_or_default();

    Article {
        date: date_from_url(source).unwrap_or(Article::UNKNOWN_DATE),
        source: source.to_string(),
        vocabulary,
    }
}

/// Locate the element right after the glossary heading.
fn vocabulary_table(document: &Html) -> Option<ElementRef<'_>> {
    let heading = document
        .select(&HEADING_SELECTOR)
        .find(|h| h.text().collect::<String>().contains(VOCABULARY_HEADING))?;
    heading.next_siblings().find_map(ElementRef::wrap)
}

/// Read the accepted rows of a glossary table, in order.
fn parse_vocabulary_rows(table: ElementRef<'_>) -> Vec<VocabularyEntry> {
    table
        .select(&ROW_SELECTOR)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL_SELECTOR).map(normalized_text).collect();
            if cells.len() != VOCABULARY_COLUMNS {
                debug!(cells = cells.len(), "Skipping glossary row with unexpected cell count");
                return None;
            }
            let [han_lo, poj, kip, mandarin, english]: [String; VOCABULARY_COLUMNS] =
                cells.try_into().ok()?;
            Some(VocabularyEntry {
                han_lo,
                poj,
                kip,
                mandarin,
                english,
            })
        })
        .collect()
}

/// Fetch and parse a single article.
///
/// Any fetch failure yields `None`; the article simply contributes nothing.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_article(client: &Client, url: String) -> Option<Article> {
    match fetch_html(client, &url).await {
        Ok(body) => {
            let document = Html::parse_document(&body);
            let article = parse_article(&document, &url);
            debug!(
                date = %article.date,
                entries = article.vocabulary.len(),
                "Parsed article"
            );
            Some(article)
        }
        Err(e) => {
            debug!(error = %e, "Article fetch failed; skipping");
            None
        }
    }
}

/// Fetch a listing page and extract its article links.
#[instrument(level = "info", skip(client, site))]
pub async fn index_page(
    client: &Client,
    site: &ArchiveSite,
    page_url: &str,
) -> Result<Vec<String>, FetchError> {
    let body = fetch_html(client, page_url).await?;
    let document = Html::parse_document(&body);
    let links = extract_article_links(&document, page_url, site);
    info!(count = links.len(), "Indexed article links");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn site() -> ArchiveSite {
        ArchiveSite::new("https://apod.tw/daily/").unwrap()
    }

    fn article_html(rows: &str) -> String {
        format!(
            r#"<html><body>
            <article>
              <h1>Thiⁿ-bûn</h1>
              <p>Some text.</p>
              <h2>詞彙學習</h2>
              <figure class="wp-block-table"><table>
                <thead><tr><th>漢羅</th><th>POJ</th><th>KIP</th><th>華語</th><th>English</th></tr></thead>
                <tbody>{rows}</tbody>
              </table></figure>
            </article>
            </body></html>"#
        )
    }

    fn row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    #[test]
    fn test_page_urls() {
        let site = site();
        assert_eq!(site.page_url(1), "https://apod.tw/daily/");
        assert_eq!(site.page_url(2), "https://apod.tw/daily/page/2/");
        assert_eq!(site.page_url(37), "https://apod.tw/daily/page/37/");
    }

    #[test]
    fn test_listing_url_gets_trailing_slash() {
        let site = ArchiveSite::new("https://apod.tw/daily").unwrap();
        assert_eq!(site.page_url(3), "https://apod.tw/daily/page/3/");
        assert!(site.is_article_url("https://apod.tw/daily/20240115/"));
    }

    #[test]
    fn test_is_article_url() {
        let site = site();
        assert!(site.is_article_url("https://apod.tw/daily/20240115/"));
        assert!(!site.is_article_url("https://apod.tw/daily/20240115"));
        assert!(!site.is_article_url("https://apod.tw/daily/page/2/"));
        assert!(!site.is_article_url("https://apod.tw/daily/2024011/"));
        assert!(!site.is_article_url("https://example.com/daily/20240115/"));
    }

    #[test]
    fn test_extract_article_links() {
        let html = Html::parse_document(
            r#"<html><body>
            <a href="https://apod.tw/daily/20240115/">Jan 15</a>
            <a href="https://apod.tw/daily/20240115/"><img src="x.jpg"></a>
            <a href="/daily/20240114/">Jan 14</a>
            <a href="https://apod.tw/daily/page/2/">Next</a>
            <a href="https://apod.tw/about/">About</a>
            <a href="20240113/">Jan 13</a>
            <a>No href</a>
            </body></html>"#,
        );

        let links = extract_article_links(&html, "https://apod.tw/daily/", &site());
        assert_eq!(
            links,
            vec![
                "https://apod.tw/daily/20240115/",
                "https://apod.tw/daily/20240114/",
                "https://apod.tw/daily/20240113/",
            ]
        );
    }

    #[test]
    fn test_extract_article_links_empty_page() {
        let html = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert!(extract_article_links(&html, "https://apod.tw/daily/page/900/", &site()).is_empty());
    }

    #[test]
    fn test_parse_article_rows_in_order() {
        let rows = [
            row(&["天文", "thian-bûn", "thian-bûn", "天文", "astronomy"]),
            row(&["星雲", "seng-hûn", "sing-hûn", "星雲", "nebula"]),
            row(&["月娘", "go̍eh-niû", "gue̍h-niû", "月亮", "moon"]),
        ]
        .concat();
        let doc = Html::parse_document(&article_html(&rows));

        let article = parse_article(&doc, "https://apod.tw/daily/20240115/");
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(article.source, "https://apod.tw/daily/20240115/");
        assert_eq!(article.vocabulary.len(), 3);
        assert_eq!(article.vocabulary[0].han_lo, "天文");
        assert_eq!(article.vocabulary[1].english, "nebula");
        assert_eq!(article.vocabulary[2].poj, "go̍eh-niû");
        assert_eq!(article.vocabulary[2].kip, "gue̍h-niû");
        assert_eq!(article.vocabulary[2].mandarin, "月亮");
    }

    #[test]
    fn test_parse_article_skips_rows_with_wrong_cell_count() {
        let rows = [
            row(&["天文", "thian-bûn", "thian-bûn", "天文", "astronomy"]),
            row(&["kāng", "kāng", "kāng", "kāng"]),
            row(&["星雲", "seng-hûn", "sing-hûn", "星雲", "nebula"]),
            row(&["a", "b", "c", "d", "e", "f"]),
        ]
        .concat();
        let doc = Html::parse_document(&article_html(&rows));

        let article = parse_article(&doc, "https://apod.tw/daily/20240115/");
        let words: Vec<&str> = article.vocabulary.iter().map(|v| v.english.as_str()).collect();
        assert_eq!(words, vec!["astronomy", "nebula"]);
    }

    #[test]
    fn test_skipped_row_does_not_shift_dict_word_ids() {
        let rows = [
            row(&["天文", "thian-bûn", "thian-bûn", "天文", "astronomy"]),
            row(&["kāng", "kāng", "kāng", "kāng"]),
            row(&["星雲", "seng-hûn", "sing-hûn", "星雲", "nebula"]),
        ]
        .concat();
        let doc = Html::parse_document(&article_html(&rows));

        let article = parse_article(&doc, "https://apod.tw/daily/20240115/");
        let rows = crate::outputs::vocabulary_csv::build_rows(&[article]);
        let ids: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.DictWordID.as_str(), r.English.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("APODTW-20240115-001", "astronomy"),
                ("APODTW-20240115-002", "nebula"),
            ]
        );
    }

    #[test]
    fn test_parse_article_without_glossary() {
        let doc = Html::parse_document("<html><body><h2>其他</h2><table><tr><td>x</td></tr></table></body></html>");

        let article = parse_article(&doc, "https://apod.tw/daily/20231231/");
        assert!(article.vocabulary.is_empty());
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_article_heading_with_extra_text() {
        let rows = row(&["彗星", "sàu-só͘-chhiⁿ", "sàu-sóo-tshenn", "彗星", "comet"]);
        let html = article_html(&rows).replace("<h2>詞彙學習</h2>", "<h2><span>📖</span> 詞彙學習 Vocabulary</h2>");
        let doc = Html::parse_document(&html);

        let article = parse_article(&doc, "https://apod.tw/daily/20240201/");
        assert_eq!(article.vocabulary.len(), 1);
        assert_eq!(article.vocabulary[0].english, "comet");
    }

    #[test]
    fn test_parse_article_unknown_date() {
        let doc = Html::parse_document(&article_html(""));
        let article = parse_article(&doc, "https://apod.tw/daily/special/");
        assert_eq!(article.date, Article::UNKNOWN_DATE);
        assert!(!article.has_known_date());
    }

    #[test]
    fn test_parse_article_normalizes_cell_text() {
        let rows = "<tr><td> 銀河\n</td><td>gîn-hô</td><td>gîn-hô</td><td>銀河</td><td>Milky<br>Way</td></tr>";
        let doc = Html::parse_document(&article_html(rows));

        let article = parse_article(&doc, "https://apod.tw/daily/20240301/");
        assert_eq!(article.vocabulary[0].han_lo, "銀河");
        assert_eq!(article.vocabulary[0].english, "Milky Way");
    }
}
