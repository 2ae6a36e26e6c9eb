//! The harvested post record.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

/// One message extracted from the channel page.
///
/// Field names match the persisted JSON. Unknown fields carried by records from
/// other schema revisions survive a load/save cycle through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable message identifier (`channel/123`), the merge key.
    #[serde(default)]
    pub id: Option<String>,
    /// Machine-readable timestamp when the page had one, else the display text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photo_urls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_urls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<String>,
    /// When this record was extracted (RFC 3339), not the message's own date.
    #[serde(default, deserialize_with = "null_as_default")]
    pub parsed_at: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decode an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Post {
    /// Whether the record carries anything worth keeping.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.text.is_empty()
            || !self.photo_urls.is_empty()
            || !self.video_urls.is_empty()
            || !self.links.is_empty()
    }
}

/// Insertion-ordered set of URLs.
///
/// Discovery strategies push into the same set; the first sighting fixes the
/// position and later duplicates are dropped.
#[derive(Debug, Clone, Default)]
pub struct UrlSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl UrlSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL. Empty strings and repeats are ignored; returns whether it was new.
    pub fn insert(&mut self, url: &str) -> bool {
        if url.is_empty() || self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.order.push(url.to_string());
        true
    }

    pub fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.insert(url.as_ref());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}
