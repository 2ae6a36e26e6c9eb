//! Message extraction from a parsed channel page.
//!
//! Extraction is a pure function of the document, the options and the `parsed_at`
//! stamp handed in by the caller: the same page always yields the same posts in the
//! same order.

mod links;
pub mod media;
pub mod selectors;

use chrono::{DateTime, Utc};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use tracing::trace;

use crate::config::Config;
use crate::constants::PLATFORM_HOSTS;
use crate::post::Post;

pub use links::collect_links;
use selectors::{DATE_ANCHOR, LOAD_MORE, MESSAGE, MESSAGE_WRAP, TEXT, TIME};

/// Knobs that shape extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Host of the channel page; links back to it are not outbound.
    pub source_host: Option<String>,
    /// Also run the lower-confidence media fallbacks.
    pub permissive_media: bool,
}

impl ExtractOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_host: config.source_host(),
            permissive_media: config.permissive_media,
        }
    }

    /// Whether an absolute URL points at the channel's host or the platform's own hosts.
    #[must_use]
    pub fn is_source_url(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.source_host
            .as_deref()
            .into_iter()
            .chain(PLATFORM_HOSTS.iter().copied())
            .any(|own| domains_match(host, own))
    }
}

/// Extract every post on the page, newest first (page order).
#[must_use]
pub fn extract_posts(
    document: &Html,
    options: &ExtractOptions,
    parsed_at: DateTime<Utc>,
) -> Vec<Post> {
    extract_posts_up_to(document, options, parsed_at, usize::MAX)
}

/// Extract at most `limit` posts, stopping as soon as the limit is hit.
#[must_use]
pub fn extract_posts_up_to(
    document: &Html,
    options: &ExtractOptions,
    parsed_at: DateTime<Utc>,
    limit: usize,
) -> Vec<Post> {
    let stamp = parsed_at.to_rfc3339();
    document
        .select(&MESSAGE_WRAP)
        .filter_map(|wrap| extract_post(wrap, options, &stamp))
        .take(limit)
        .collect()
}

/// Build a post from one message block, or `None` if the block carries no content.
#[must_use]
pub fn extract_post(
    block: ElementRef<'_>,
    options: &ExtractOptions,
    parsed_at: &str,
) -> Option<Post> {
    let post = Post {
        id: message_id(block),
        date: message_date(block),
        text: message_text(block),
        photo_urls: media::collect(
            block,
            options,
            media::PHOTO_STRATEGIES,
            media::PHOTO_FALLBACKS,
        ),
        video_urls: media::collect(
            block,
            options,
            media::VIDEO_STRATEGIES,
            media::VIDEO_FALLBACKS,
        ),
        links: collect_links(block, options),
        parsed_at: parsed_at.to_string(),
        extra: serde_json::Map::new(),
    };

    if !post.has_content() {
        trace!(id = ?post.id, "Skipping message block without content");
        return None;
    }

    trace!(
        id = ?post.id,
        photos = post.photo_urls.len(),
        videos = post.video_urls.len(),
        links = post.links.len(),
        "Extracted post"
    );
    Some(post)
}

/// `href` of the "load older messages" anchor, as given by the page (usually a path).
#[must_use]
pub fn load_more_href(document: &Html) -> Option<String> {
    document
        .select(&LOAD_MORE)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(ToString::to_string)
}

fn message_id(block: ElementRef<'_>) -> Option<String> {
    block
        .select(&MESSAGE)
        .next()
        .and_then(|el| el.value().attr("data-post"))
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
}

fn message_date(block: ElementRef<'_>) -> String {
    let Some(anchor) = block.select(&DATE_ANCHOR).next() else {
        return String::new();
    };
    if let Some(datetime) = anchor
        .select(&TIME)
        .next()
        .and_then(|time| time.value().attr("datetime"))
    {
        return datetime.to_string();
    }
    anchor.text().collect::<String>().trim().to_string()
}

fn message_text(block: ElementRef<'_>) -> String {
    block
        .select(&TEXT)
        .next()
        .map(|body| text_with_breaks(body).trim().to_string())
        .unwrap_or_default()
}

/// Flatten an element to text, turning `<br>` into `\n`.
fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Check if two domains match (ignoring www prefix and case).
fn domains_match(domain1: &str, domain2: &str) -> bool {
    let d1 = domain1.to_ascii_lowercase();
    let d2 = domain2.to_ascii_lowercase();
    let d1 = d1.strip_prefix("www.").unwrap_or(&d1);
    let d2 = d2.strip_prefix("www.").unwrap_or(&d2);
    d1 == d2
}
