//! Photo and video discovery strategies.
//!
//! The page marks media up in several ways depending on post type and renderer
//! revision. Each strategy looks at one of those shapes and returns candidate URLs
//! in document order; the caller folds them into a single [`UrlSet`] so a URL found
//! by several strategies is kept once, at its first position.

use scraper::ElementRef;

use super::selectors::{
    style_urls, ANCHOR, ANY_IMG, CAROUSEL_IMG, PHOTO_IMG, PHOTO_SLIDE, PHOTO_WRAP, SOURCE, VIDEO,
    VIDEO_SLIDE,
};
use super::ExtractOptions;
use crate::constants::PLATFORM_MARKER;
use crate::post::UrlSet;

/// A single discovery heuristic over one message block.
pub type Strategy = fn(ElementRef<'_>, &ExtractOptions) -> Vec<String>;

/// Photo strategies that match on explicit photo markup.
pub const PHOTO_STRATEGIES: &[Strategy] = &[photo_wrap_backgrounds, photo_images, carousel_photos];

/// Lower-confidence photo fallback, only run when permissive matching is enabled.
pub const PHOTO_FALLBACKS: &[Strategy] = &[platform_photo_images];

pub const VIDEO_STRATEGIES: &[Strategy] = &[video_sources, video_slide_backgrounds];

pub const VIDEO_FALLBACKS: &[Strategy] = &[platform_video_anchors];

/// Run the strategy chain for one media kind and merge the results.
#[must_use]
pub fn collect(
    block: ElementRef<'_>,
    options: &ExtractOptions,
    strategies: &[Strategy],
    fallbacks: &[Strategy],
) -> Vec<String> {
    let mut urls = UrlSet::new();
    for strategy in strategies {
        urls.extend(strategy(block, options));
    }
    if options.permissive_media {
        for strategy in fallbacks {
            urls.extend(strategy(block, options));
        }
    }
    urls.into_vec()
}

/// Photo wrappers render the image as a CSS background.
fn photo_wrap_backgrounds(block: ElementRef<'_>, _: &ExtractOptions) -> Vec<String> {
    block
        .select(&PHOTO_WRAP)
        .filter_map(|el| el.value().attr("style"))
        .flat_map(style_urls)
        .map(ToString::to_string)
        .collect()
}

fn photo_images(block: ElementRef<'_>, _: &ExtractOptions) -> Vec<String> {
    block
        .select(&PHOTO_IMG)
        .filter_map(|el| el.value().attr("src"))
        .map(ToString::to_string)
        .collect()
}

/// Multi-photo posts: `<img>` inside the carousel, then the slides' own backgrounds.
fn carousel_photos(block: ElementRef<'_>, _: &ExtractOptions) -> Vec<String> {
    let images = block
        .select(&CAROUSEL_IMG)
        .filter_map(|el| el.value().attr("src"))
        .map(ToString::to_string);

    let backgrounds = block
        .select(&PHOTO_SLIDE)
        .filter_map(|el| el.value().attr("style"))
        .flat_map(style_urls)
        .map(ToString::to_string);

    images.chain(backgrounds).collect()
}

/// Any image served from the platform whose path looks like a photo.
///
/// Catches photos when the renderer's class names drift; may also pick up
/// unrelated platform images.
fn platform_photo_images(block: ElementRef<'_>, _: &ExtractOptions) -> Vec<String> {
    block
        .select(&ANY_IMG)
        .filter_map(|el| el.value().attr("src"))
        .filter(|src| src.contains(PLATFORM_MARKER) && src.to_lowercase().contains("photo"))
        .map(ToString::to_string)
        .collect()
}

/// `<video>` elements: the element's own `src` first, then nested `<source>`s.
fn video_sources(block: ElementRef<'_>, _: &ExtractOptions) -> Vec<String> {
    let mut urls = Vec::new();
    for video in block.select(&VIDEO) {
        if let Some(src) = video.value().attr("src") {
            urls.push(src.to_string());
        }
        urls.extend(
            video
                .select(&SOURCE)
                .filter_map(|source| source.value().attr("src"))
                .map(ToString::to_string),
        );
    }
    urls
}

/// Video slides in a carousel reference the video through a background style.
fn video_slide_backgrounds(block: ElementRef<'_>, _: &ExtractOptions) -> Vec<String> {
    block
        .select(&VIDEO_SLIDE)
        .filter_map(|el| el.value().attr("style"))
        .flat_map(style_urls)
        .map(ToString::to_string)
        .collect()
}

/// Anchors on the platform's own domain that look like video files or pages.
fn platform_video_anchors(block: ElementRef<'_>, options: &ExtractOptions) -> Vec<String> {
    block
        .select(&ANCHOR)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| {
            let lower = href.to_lowercase();
            let looks_like_video =
                lower.contains("video") || lower.contains("mp4") || lower.contains("mov");
            looks_like_video && (href.contains(PLATFORM_MARKER) || options.is_source_url(href))
        })
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn options(permissive: bool) -> ExtractOptions {
        ExtractOptions {
            source_host: Some("t.me".to_string()),
            permissive_media: permissive,
        }
    }

    fn with_block<T>(html: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let doc = Html::parse_fragment(html);
        f(doc.root_element())
    }

    #[test]
    fn test_photo_strategies_dedup_across_sources() {
        let html = r#"
            <a class="tgme_widget_message_photo_wrap" style="background-image:url('https://cdn.telegram.org/file/p1.jpg')"></a>
            <img class="tgme_widget_message_photo" src="https://cdn.telegram.org/file/p1.jpg">
            <img class="tgme_widget_message_photo" src="https://cdn.telegram.org/file/p2.jpg">
        "#;
        let photos = with_block(html, |block| {
            collect(block, &options(true), PHOTO_STRATEGIES, PHOTO_FALLBACKS)
        });
        assert_eq!(
            photos,
            vec![
                "https://cdn.telegram.org/file/p1.jpg",
                "https://cdn.telegram.org/file/p2.jpg"
            ]
        );
    }

    #[test]
    fn test_carousel_images_and_slide_backgrounds() {
        let html = r#"
            <div class="tgme_widget_message_grouped_wrap">
                <div class="tgme_widget_message_slide" style="background-image:url('https://cdn.example/s1.jpg')">
                    <img src="https://cdn.example/s1-thumb.jpg">
                </div>
                <div class="tgme_widget_message_slide tgme_widget_message_video_slide" style="background-image:url('https://cdn.example/v1.mp4')"></div>
            </div>
        "#;
        let (photos, videos) = with_block(html, |block| {
            (
                collect(block, &options(false), PHOTO_STRATEGIES, PHOTO_FALLBACKS),
                collect(block, &options(false), VIDEO_STRATEGIES, VIDEO_FALLBACKS),
            )
        });
        assert_eq!(
            photos,
            vec!["https://cdn.example/s1-thumb.jpg", "https://cdn.example/s1.jpg"]
        );
        assert_eq!(videos, vec!["https://cdn.example/v1.mp4"]);
    }

    #[test]
    fn test_permissive_photo_fallback() {
        let html = r#"<img src="https://telegram.org/img/Photo_preview.jpg"><img src="https://other.example/photo.jpg">"#;
        let strict = with_block(html, |block| {
            collect(block, &options(false), PHOTO_STRATEGIES, PHOTO_FALLBACKS)
        });
        assert!(strict.is_empty());

        let permissive = with_block(html, |block| {
            collect(block, &options(true), PHOTO_STRATEGIES, PHOTO_FALLBACKS)
        });
        assert_eq!(permissive, vec!["https://telegram.org/img/Photo_preview.jpg"]);
    }

    #[test]
    fn test_video_element_src_and_sources() {
        let html = r#"
            <video class="tgme_widget_message_video" src="https://cdn.telegram.org/v/main.mp4">
                <source src="https://cdn.telegram.org/v/main.mp4">
                <source src="https://cdn.telegram.org/v/alt.webm">
            </video>
        "#;
        let videos = with_block(html, |block| {
            collect(block, &options(false), VIDEO_STRATEGIES, VIDEO_FALLBACKS)
        });
        assert_eq!(
            videos,
            vec![
                "https://cdn.telegram.org/v/main.mp4",
                "https://cdn.telegram.org/v/alt.webm"
            ]
        );
    }

    #[test]
    fn test_permissive_video_anchor_restricted_to_platform() {
        let html = r#"
            <a href="https://t.me/chan/55/video">watch</a>
            <a href="https://cdn.telegram.org/file/clip.MOV">clip</a>
            <a href="https://youtube.com/watch?v=video">external</a>
        "#;
        let videos = with_block(html, |block| {
            collect(block, &options(true), VIDEO_STRATEGIES, VIDEO_FALLBACKS)
        });
        assert_eq!(
            videos,
            vec![
                "https://t.me/chan/55/video",
                "https://cdn.telegram.org/file/clip.MOV"
            ]
        );
    }
}
