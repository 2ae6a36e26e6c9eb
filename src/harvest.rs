//! One harvest run: walk the channel, merge into the store, report.

use tracing::{info, warn};

use crate::config::Config;
use crate::fetch::PageFetcher;
use crate::paginator::{HarvestOutcome, Paginator};
use crate::post::Post;
use crate::store::{MergeOutcome, PostStore};

/// Per-run media and link counts over the freshly harvested posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub posts: usize,
    pub photos: usize,
    pub videos: usize,
    pub posts_with_photos: usize,
    pub posts_with_videos: usize,
    pub posts_with_links: usize,
    pub posts_with_multiple_photos: usize,
    pub posts_with_multiple_videos: usize,
}

impl HarvestStats {
    #[must_use]
    pub fn from_posts(posts: &[Post]) -> Self {
        posts.iter().fold(Self::default(), |mut stats, post| {
            stats.posts += 1;
            stats.photos += post.photo_urls.len();
            stats.videos += post.video_urls.len();
            stats.posts_with_photos += usize::from(!post.photo_urls.is_empty());
            stats.posts_with_videos += usize::from(!post.video_urls.is_empty());
            stats.posts_with_links += usize::from(!post.links.is_empty());
            stats.posts_with_multiple_photos += usize::from(post.photo_urls.len() > 1);
            stats.posts_with_multiple_videos += usize::from(post.video_urls.len() > 1);
            stats
        })
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub harvest: HarvestOutcome,
    pub stats: HarvestStats,
    /// `None` when nothing was harvested and the store was left untouched.
    pub merge: Option<MergeOutcome>,
}

/// Walk the channel and merge what was found into the store.
///
/// A run that collects nothing does not touch the store. Fetch and processing
/// failures only shorten the walk; store write failures are reported in
/// [`RunReport::merge`].
pub async fn run_once<F: PageFetcher>(config: &Config, fetcher: F) -> RunReport {
    let paginator = Paginator::new(fetcher, config);
    let harvest = paginator.run().await;

    if harvest.is_partial() {
        warn!(
            posts = harvest.posts.len(),
            "Page walk ended early, keeping posts collected so far"
        );
    }

    let stats = HarvestStats::from_posts(&harvest.posts);

    if harvest.is_empty() {
        warn!(pages = harvest.pages_fetched, "No posts obtained from the channel");
        return RunReport {
            harvest,
            stats,
            merge: None,
        };
    }

    let store = PostStore::from_config(config);
    let merge = store.update(harvest.posts.clone()).await;

    info!(
        new_posts = stats.posts,
        stored = merge.posts.len(),
        photos = stats.photos,
        videos = stats.videos,
        posts_with_photos = stats.posts_with_photos,
        posts_with_videos = stats.posts_with_videos,
        posts_with_links = stats.posts_with_links,
        posts_with_multiple_photos = stats.posts_with_multiple_photos,
        posts_with_multiple_videos = stats.posts_with_multiple_videos,
        "Harvest complete"
    );

    RunReport {
        harvest,
        stats,
        merge: Some(merge),
    }
}
