//! CSS selectors for the channel preview markup.
//!
//! Class names are the ones the platform's web renderer emits for `/s/<channel>` pages.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// One rendered message, including service chrome around it.
pub static MESSAGE_WRAP: LazyLock<Selector> =
    LazyLock::new(|| selector("div.tgme_widget_message_wrap"));

/// Inner container carrying the `data-post` identifier.
pub static MESSAGE: LazyLock<Selector> = LazyLock::new(|| selector("div.tgme_widget_message"));

pub static DATE_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| selector("a.tgme_widget_message_date"));

pub static TIME: LazyLock<Selector> = LazyLock::new(|| selector("time"));

pub static TEXT: LazyLock<Selector> = LazyLock::new(|| selector("div.tgme_widget_message_text"));

pub static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

pub static LINK_PREVIEW: LazyLock<Selector> =
    LazyLock::new(|| selector("a.tgme_widget_message_link_preview[href]"));

pub static MESSAGE_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("a.tgme_widget_message_link[href]"));

pub static PHOTO_WRAP: LazyLock<Selector> =
    LazyLock::new(|| selector("a.tgme_widget_message_photo_wrap[style]"));

pub static PHOTO_IMG: LazyLock<Selector> =
    LazyLock::new(|| selector("img.tgme_widget_message_photo[src]"));

pub static CAROUSEL_IMG: LazyLock<Selector> = LazyLock::new(|| {
    selector(
        ".tgme_widget_message_grouped_wrap img[src], .tgme_widget_message_slide img[src]",
    )
});

/// Photo slides: any slide not marked as a video slide.
pub static PHOTO_SLIDE: LazyLock<Selector> = LazyLock::new(|| {
    selector(".tgme_widget_message_slide[style]:not(.tgme_widget_message_video_slide)")
});

pub static VIDEO_SLIDE: LazyLock<Selector> =
    LazyLock::new(|| selector(".tgme_widget_message_video_slide[style]"));

pub static VIDEO: LazyLock<Selector> = LazyLock::new(|| selector("video.tgme_widget_message_video"));

pub static SOURCE: LazyLock<Selector> = LazyLock::new(|| selector("source[src]"));

pub static ANY_IMG: LazyLock<Selector> = LazyLock::new(|| selector("img[src]"));

/// "Load older messages" navigation anchor.
pub static LOAD_MORE: LazyLock<Selector> =
    LazyLock::new(|| selector("a.tme_messages_more[href]"));

/// `url(...)` token of a CSS declaration, quoted or bare.
pub static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap());

/// Pull every `url(...)` target out of an inline `style` attribute.
pub fn style_urls(style: &str) -> impl Iterator<Item = &str> {
    CSS_URL
        .captures_iter(style)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
}
