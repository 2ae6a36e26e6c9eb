//! Outbound link discovery.

use scraper::ElementRef;

use super::selectors::{ANCHOR, LINK_PREVIEW, MESSAGE_LINK, TEXT};
use super::ExtractOptions;
use crate::post::UrlSet;

/// Collect outbound links from the message body, the link preview card and the
/// message-level link anchor, in that order.
#[must_use]
pub fn collect_links(block: ElementRef<'_>, options: &ExtractOptions) -> Vec<String> {
    let mut links = UrlSet::new();

    if let Some(body) = block.select(&TEXT).next() {
        push_outbound(&mut links, body.select(&ANCHOR), options);
    }
    push_outbound(&mut links, block.select(&LINK_PREVIEW), options);
    push_outbound(&mut links, block.select(&MESSAGE_LINK), options);

    links.into_vec()
}

fn push_outbound<'a>(
    links: &mut UrlSet,
    anchors: impl Iterator<Item = ElementRef<'a>>,
    options: &ExtractOptions,
) {
    for anchor in anchors {
        if let Some(href) = anchor.value().attr("href") {
            let href = href.trim();
            if is_outbound(href, options) {
                links.insert(href);
            }
        }
    }
}

/// Whether `href` leaves the source site.
///
/// Relative hrefs resolve against the source, so they never count as outbound.
fn is_outbound(href: &str, options: &ExtractOptions) -> bool {
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return false;
    }
    if url::Url::parse(href).is_err() {
        return false;
    }
    !options.is_source_url(href)
}
