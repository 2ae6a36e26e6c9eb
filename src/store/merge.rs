//! Upsert, dedup and cap of the post store.

use std::collections::{HashMap, HashSet};

use crate::post::Post;

/// Counts from one merge, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// New posts that replaced a stored post with the same id.
    pub replaced: usize,
    /// New posts inserted at the front, one at a time.
    pub inserted: usize,
    /// Records dropped as repeats of an earlier id.
    pub duplicates_dropped: usize,
    /// Records dropped by the cap.
    pub truncated: usize,
}

/// Merge freshly extracted posts into the stored sequence.
///
/// `existing` must already be migrated. New posts are applied in the order
/// received: one whose id is already stored replaces that record where it sits,
/// any other (id-less ones included) is inserted at the front. A batch of
/// unmatched posts therefore ends up ahead of the stored records in reverse
/// order. The result keeps the first occurrence of each id, keeps every id-less
/// record, and is cut to `cap` entries.
#[must_use]
pub fn merge_posts(
    existing: Vec<Post>,
    new_posts: Vec<Post>,
    cap: usize,
) -> (Vec<Post>, MergeStats) {
    let mut stats = MergeStats::default();

    // First occurrence per id: that is the copy the dedup pass keeps.
    let mut index: HashMap<String, usize> = HashMap::new();
    for (pos, post) in existing.iter().enumerate() {
        if let Some(id) = &post.id {
            index.entry(id.clone()).or_insert(pos);
        }
    }

    let mut stored = existing;
    // Front insertions, oldest first; reversed when joined with `stored` so
    // stored positions stay valid while the batch is applied.
    let mut inserted: Vec<Post> = Vec::new();

    for post in new_posts {
        let stored_at = post.id.as_ref().and_then(|id| index.get(id)).copied();
        match stored_at {
            Some(pos) => {
                stored[pos] = post;
                stats.replaced += 1;
            }
            None => {
                inserted.push(post);
                stats.inserted += 1;
            }
        }
    }

    let mut front: Vec<Post> = inserted.into_iter().rev().collect();
    front.extend(stored);

    let before = front.len();
    let mut merged = dedup_by_id(front);
    stats.duplicates_dropped = before - merged.len();

    if merged.len() > cap {
        stats.truncated = merged.len() - cap;
        merged.truncate(cap);
    }

    (merged, stats)
}

/// Keep the first record for each id; id-less records are always kept.
#[must_use]
pub fn dedup_by_id(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| match &post.id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}

/// The first `count` records, as written to the recent-posts file.
#[must_use]
pub fn recent_subset(posts: &[Post], count: usize) -> &[Post] {
    &posts[..posts.len().min(count)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: Option<&str>, text: &str) -> Post {
        Post {
            id: id.map(ToString::to_string),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn ids(posts: &[Post]) -> Vec<Option<&str>> {
        posts.iter().map(|p| p.id.as_deref()).collect()
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let existing = vec![
            post(Some("c/125"), "a"),
            post(Some("c/123"), "old"),
            post(Some("c/120"), "b"),
        ];
        let (merged, stats) = merge_posts(existing, vec![post(Some("c/123"), "new")], 10);

        assert_eq!(ids(&merged), vec![Some("c/125"), Some("c/123"), Some("c/120")]);
        assert_eq!(merged[1].text, "new");
        assert_eq!(merged.iter().filter(|p| p.id.as_deref() == Some("c/123")).count(), 1);
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.inserted, 0);
    }

    #[test]
    fn test_replace_survives_earlier_front_insert() {
        // An insert before the replacement must not shift the replaced record.
        let existing = vec![post(Some("c/1"), "one"), post(Some("c/2"), "two")];
        let new_posts = vec![post(Some("c/9"), "nine"), post(Some("c/2"), "two v2")];
        let (merged, _) = merge_posts(existing, new_posts, 10);

        assert_eq!(ids(&merged), vec![Some("c/9"), Some("c/1"), Some("c/2")]);
        assert_eq!(merged[0].text, "nine");
        assert_eq!(merged[1].text, "one");
        assert_eq!(merged[2].text, "two v2");
    }

    #[test]
    fn test_new_posts_each_inserted_at_front() {
        let existing = vec![post(Some("c/1"), "one")];
        let new_posts = vec![
            post(Some("c/3"), "three"),
            post(None, "anon"),
            post(Some("c/2"), "two"),
        ];
        let (merged, stats) = merge_posts(existing, new_posts, 10);

        assert_eq!(ids(&merged), vec![Some("c/2"), None, Some("c/3"), Some("c/1")]);
        assert_eq!(stats.inserted, 3);
    }

    #[test]
    fn test_batch_into_empty_store_is_reversed() {
        let new_posts = vec![post(Some("c/2"), "two"), post(Some("c/1"), "one")];
        let (merged, _) = merge_posts(Vec::new(), new_posts, 10);

        assert_eq!(ids(&merged), vec![Some("c/1"), Some("c/2")]);
    }

    #[test]
    fn test_repeated_new_id_last_write_wins() {
        let new_posts = vec![post(Some("c/5"), "first"), post(Some("c/5"), "second")];
        let (merged, stats) = merge_posts(Vec::new(), new_posts, 10);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "second");
        assert_eq!(stats.duplicates_dropped, 1);
    }

    #[test]
    fn test_null_ids_never_collapse() {
        let existing = vec![post(None, "same")];
        let new_posts = vec![post(None, "same"), post(None, "same")];
        let (merged, _) = merge_posts(existing, new_posts, 10);

        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|p| p.id.is_none() && p.text == "same"));
    }

    #[test]
    fn test_cap_keeps_prefix() {
        let existing: Vec<Post> = (0..5).map(|i| post(Some(&format!("c/{i}")), "old")).collect();
        let new_posts = vec![post(Some("c/10"), "x"), post(Some("c/11"), "y")];
        let (merged, stats) = merge_posts(existing, new_posts, 5);

        assert_eq!(merged.len(), 5);
        assert_eq!(
            ids(&merged),
            vec![Some("c/11"), Some("c/10"), Some("c/0"), Some("c/1"), Some("c/2")]
        );
        assert_eq!(stats.truncated, 2);
    }

    #[test]
    fn test_empty_merge_is_fixed_point() {
        let existing = vec![
            post(Some("c/3"), "a"),
            post(None, "b"),
            post(Some("c/3"), "dup"),
            post(Some("c/1"), "c"),
        ];
        let (once, _) = merge_posts(existing, Vec::new(), 3);
        assert_eq!(ids(&once), vec![Some("c/3"), None, Some("c/1")]);
        assert_eq!(once[0].text, "a");

        let (twice, stats) = merge_posts(once.clone(), Vec::new(), 3);
        assert_eq!(once, twice);
        assert_eq!(stats, MergeStats::default());
    }

    #[test]
    fn test_upsert_targets_surviving_duplicate() {
        let existing = vec![post(Some("c/3"), "a"), post(Some("c/3"), "stale copy")];
        let (merged, stats) = merge_posts(existing, vec![post(Some("c/3"), "new")], 10);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "new");
        assert_eq!(stats.duplicates_dropped, 1);
    }

    #[test]
    fn test_recent_subset() {
        let posts: Vec<Post> = (0..4).map(|i| post(Some(&format!("c/{i}")), "x")).collect();
        assert_eq!(recent_subset(&posts, 2).len(), 2);
        assert_eq!(recent_subset(&posts, 10).len(), 4);
        assert!(recent_subset(&[], 10).is_empty());
    }
}
