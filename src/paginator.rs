//! Sequential page walk over the channel's "load older messages" chain.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use scraper::Html;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::extractor::{extract_posts_up_to, load_more_href, ExtractOptions};
use crate::fetch::{FetchError, PageFetcher};
use crate::post::Post;

/// Non-transport failure while walking pages.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid channel URL {url:?}: {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot resolve load-more link {href:?}: {source}")]
    InvalidNextLink {
        href: String,
        #[source]
        source: url::ParseError,
    },
}

/// Why the page walk ended.
#[derive(Debug)]
pub enum StopReason {
    /// The post target was reached.
    TargetReached,
    /// The last page had no "load more" link.
    Exhausted,
    /// A fetch failed; earlier pages' posts are kept.
    TransportFailed(FetchError),
    /// Something other than the transport failed; earlier pages' posts are kept.
    ProcessingFailed(HarvestError),
}

/// Result of one page walk.
#[derive(Debug)]
pub struct HarvestOutcome {
    /// Posts in page order, newest first, at most the configured target.
    pub posts: Vec<Post>,
    /// Pages fetched successfully.
    pub pages_fetched: usize,
    pub stop: StopReason,
}

impl HarvestOutcome {
    /// Whether the walk ended on a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.stop,
            StopReason::TransportFailed(_) | StopReason::ProcessingFailed(_)
        )
    }

    /// Ended on a failure but still collected something.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.is_failure() && !self.posts.is_empty()
    }

    /// No posts were obtained at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Walks channel pages from the seed URL until the target or the last page.
pub struct Paginator<F> {
    fetcher: F,
    seed_url: String,
    max_posts: usize,
    page_delay: Duration,
    options: ExtractOptions,
}

impl<F: PageFetcher> Paginator<F> {
    #[must_use]
    pub fn new(fetcher: F, config: &Config) -> Self {
        Self {
            fetcher,
            seed_url: config.channel_url.clone(),
            max_posts: config.max_posts,
            page_delay: config.page_delay,
            options: ExtractOptions::from_config(config),
        }
    }

    /// Fetch pages one at a time and accumulate their posts.
    ///
    /// Never fails: transport and processing failures end the walk and are
    /// reported in [`HarvestOutcome::stop`] alongside whatever was collected.
    pub async fn run(&self) -> HarvestOutcome {
        let mut posts = Vec::new();
        let mut pages_fetched = 0;

        let base = match origin_of(&self.seed_url) {
            Ok(base) => base,
            Err(e) => {
                warn!("Cannot start page walk: {e}");
                return HarvestOutcome {
                    posts,
                    pages_fetched,
                    stop: StopReason::ProcessingFailed(e),
                };
            }
        };

        let mut visited = HashSet::new();
        let mut url = self.seed_url.clone();

        let stop = loop {
            if pages_fetched > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            info!(url = %url, "Fetching page");
            visited.insert(url.clone());

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %url, collected = posts.len(), "Page fetch failed: {e}");
                    break StopReason::TransportFailed(e);
                }
            };
            pages_fetched += 1;

            let remaining = self.max_posts.saturating_sub(posts.len());
            let (page_posts, next_href) = self.scan_page(&body, remaining);
            debug!(url = %url, posts = page_posts.len(), "Page scanned");
            posts.extend(page_posts);

            if posts.len() >= self.max_posts {
                break StopReason::TargetReached;
            }

            let Some(href) = next_href else {
                info!("No older messages link, stopping");
                break StopReason::Exhausted;
            };

            match base.join(&href) {
                Ok(next) => {
                    let next = next.to_string();
                    if visited.contains(&next) {
                        warn!(url = %next, "Load-more link points at a page already fetched");
                        break StopReason::Exhausted;
                    }
                    url = next;
                }
                Err(source) => {
                    break StopReason::ProcessingFailed(HarvestError::InvalidNextLink {
                        href,
                        source,
                    });
                }
            }
        };

        info!(
            pages = pages_fetched,
            posts = posts.len(),
            stop = ?stop,
            "Page walk finished"
        );

        HarvestOutcome {
            posts,
            pages_fetched,
            stop,
        }
    }

    /// Parse one page body, returning up to `limit` posts and the next-page href.
    fn scan_page(&self, body: &[u8], limit: usize) -> (Vec<Post>, Option<String>) {
        let document = Html::parse_document(&String::from_utf8_lossy(body));
        let posts = extract_posts_up_to(&document, &self.options, Utc::now(), limit);
        (posts, load_more_href(&document))
    }
}

/// Root URL (`scheme://host[:port]/`) of the seed, for resolving load-more paths.
fn origin_of(seed: &str) -> Result<Url, HarvestError> {
    let mut base = Url::parse(seed).map_err(|source| HarvestError::InvalidSeed {
        url: seed.to_string(),
        source,
    })?;
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}
