//! Pagination driver for the daily archive.
//!
//! Listing pages are visited one at a time, starting at page 1. Each page's
//! article links are fetched concurrently (up to the configured ceiling) and
//! every dispatched fetch finishes before the next listing page is requested.
//!
//! # Stop Conditions
//!
//! Crawling ends on the first of:
//! - a listing page that cannot be fetched ([`StopReason::FetchFailed`]),
//! - a listing page without article links ([`StopReason::NoLinks`]),
//! - an article dated after the run date ([`StopReason::FutureDated`]).
//!
//! A failed listing fetch is not told apart from the end of the archive: a
//! transient network error on page N stops the crawl exactly like a 404 past
//! the last page does. Whatever was collected up to that point is kept.

use crate::models::Article;
use crate::scrapers::apod::{self, ArchiveSite};
use crate::utils::date_from_url;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Result of crawling a single listing page.
#[derive(Debug)]
pub enum PageOutcome {
    /// Every link on the page was dispatched; move on to the next page.
    Collected(Vec<Article>),
    /// A future-dated link cut the page short; stop after it.
    FutureDated(Vec<Article>),
    /// The page held no article links.
    NoLinks,
    /// The page could not be fetched.
    FetchFailed(String),
}

/// Why [`Crawler::run`] stopped paginating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Listing page `page` had no article links.
    NoLinks { page: u32 },
    /// Listing page `page` linked an article dated after the run date.
    FutureDated { page: u32 },
    /// Listing page `page` could not be fetched.
    FetchFailed { page: u32, reason: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoLinks { page } => write!(f, "no article links on page {page}"),
            StopReason::FutureDated { page } => write!(f, "future-dated article on page {page}"),
            StopReason::FetchFailed { page, reason } => {
                write!(f, "failed to fetch page {page}: {reason}")
            }
        }
    }
}

/// Everything a finished crawl hands to the exporter.
#[derive(Debug)]
pub struct CrawlReport {
    /// Articles in the order their fetches were dispatched.
    pub articles: Vec<Article>,
    /// Listing pages whose links were dispatched.
    pub pages_crawled: u32,
    /// The condition that ended pagination.
    pub stop: StopReason,
}

/// Crawls the archive's listing pages and collects parsed articles.
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    site: ArchiveSite,
    today: NaiveDate,
    concurrency: usize,
}

impl Crawler {
    /// Create a crawler.
    ///
    /// `today` is the cut-off for future-dated articles. `concurrency` caps
    /// the article fetches in flight for one page and is clamped to at least 1.
    pub fn new(client: Client, site: ArchiveSite, today: NaiveDate, concurrency: usize) -> Self {
        Self {
            client,
            site,
            today,
            concurrency: concurrency.max(1),
        }
    }

    /// Crawl pages until one of the stop conditions fires.
    #[instrument(level = "info", skip(self), fields(today = %self.today, concurrency = self.concurrency))]
    pub async fn run(&self) -> CrawlReport {
        let mut articles = Vec::new();
        let mut page = 1u32;

        loop {
            let stop = match self.crawl_page(page).await {
                PageOutcome::Collected(batch) => {
                    articles.extend(batch);
                    page += 1;
                    continue;
                }
                PageOutcome::FutureDated(batch) => {
                    articles.extend(batch);
                    StopReason::FutureDated { page }
                }
                PageOutcome::NoLinks => StopReason::NoLinks { page },
                PageOutcome::FetchFailed(reason) => StopReason::FetchFailed { page, reason },
            };

            let pages_crawled = match stop {
                StopReason::FutureDated { page } => page,
                _ => page - 1,
            };
            info!(%stop, pages_crawled, articles = articles.len(), "Pagination finished");
            return CrawlReport {
                articles,
                pages_crawled,
                stop,
            };
        }
    }

    /// Fetch listing page `page`, then fetch and parse its articles.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_page(&self, page: u32) -> PageOutcome {
        let page_url = self.site.page_url(page);
        info!("Fetching page: {page_url}");

        let links = match apod::index_page(&self.client, &self.site, &page_url).await {
            Ok(links) => links,
            Err(e) => {
                error!("Error fetching page: {page_url} - {e}");
                return PageOutcome::FetchFailed(e.to_string());
            }
        };

        if links.is_empty() {
            info!("No more article links found on page {page}. Exiting pagination.");
            return PageOutcome::NoLinks;
        }

        let (dispatch, cut_short) = self.links_to_dispatch(links);
        let requested = dispatch.len();

        let articles: Vec<Article> = stream::iter(dispatch)
            .map(|url| apod::fetch_article(&self.client, url))
            .buffered(self.concurrency)
            .filter_map(std::future::ready)
            .collect()
            .await;

        let dropped = requested - articles.len();
        if dropped > 0 {
            warn!(page, dropped, "Some articles could not be fetched");
        }
        info!(page, requested, collected = articles.len(), "Page crawled");

        if cut_short {
            PageOutcome::FutureDated(articles)
        } else {
            PageOutcome::Collected(articles)
        }
    }

    /// Take links in listing order up to the first one dated after `today`.
    ///
    /// Returns the links to fetch and whether a future-dated link was hit.
    /// Links without a trailing `yyyyMMdd` date (e.g. `.../20240115/#respond`)
    /// are skipped.
    fn links_to_dispatch(&self, links: Vec<String>) -> (Vec<String>, bool) {
        let mut dispatch = Vec::with_capacity(links.len());
        for link in links {
            let Some(date) = date_from_url(&link) else {
                debug!(%link, "Link has no usable date; skipping");
                continue;
            };
            if date > self.today {
                info!(%link, %date, "Article is dated after today; stopping after this page");
                return (dispatch, true);
            }
            dispatch.push(link);
        }
        (dispatch, false)
    }
}
