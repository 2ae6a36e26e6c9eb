//! Legacy record migration.
//!
//! Early store files held one media URL per post under `photo_url` / `video_url`.
//! Current records hold lists under `photo_urls` / `video_urls`.

use serde_json::{Map, Value};
use tracing::warn;

use crate::post::Post;

/// (legacy single-value field, current list field)
const MEDIA_FIELDS: &[(&str, &str)] = &[("photo_url", "photo_urls"), ("video_url", "video_urls")];

const LINKS_FIELD: &str = "links";

/// Rewrite one raw record into the current schema.
///
/// For each media kind, a legacy string value replaces the list field: a
/// non-empty string becomes a one-element list, an empty one an empty list. The
/// legacy field is removed whatever its value. Without a legacy string, a
/// missing or malformed list field becomes an empty list. `links` gets the same
/// list normalization. Applying this to its own output is a no-op.
#[must_use]
pub fn migrate_record(mut record: Map<String, Value>) -> Map<String, Value> {
    for (legacy, current) in MEDIA_FIELDS {
        let urls = match record.remove(*legacy) {
            Some(Value::String(single)) if single.is_empty() => Vec::new(),
            Some(Value::String(single)) => vec![Value::String(single)],
            _ => list_or_empty(record.remove(*current)),
        };
        record.insert((*current).to_string(), Value::Array(urls));
    }

    let links = list_or_empty(record.remove(LINKS_FIELD));
    record.insert(LINKS_FIELD.to_string(), Value::Array(links));
    record
}

fn list_or_empty(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Migrate and type every record of a loaded store.
///
/// Entries that are not objects, or that still fail to decode after migration,
/// are skipped with a warning.
#[must_use]
pub fn migrate_all(raw: Vec<Value>) -> Vec<Post> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let Value::Object(record) = value else {
                warn!(index, "Skipping stored entry that is not an object");
                return None;
            };
            match serde_json::from_value(Value::Object(migrate_record(record))) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!(index, "Skipping stored entry that does not decode: {e}");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_single_values_become_lists() {
        let migrated = migrate_record(object(json!({
            "id": "chan/1",
            "photo_url": "https://cdn.example/a.jpg",
            "video_url": ""
        })));

        assert_eq!(migrated["photo_urls"], json!(["https://cdn.example/a.jpg"]));
        assert_eq!(migrated["video_urls"], json!([]));
        assert!(!migrated.contains_key("photo_url"));
        assert!(!migrated.contains_key("video_url"));
    }

    #[test]
    fn test_missing_lists_default_empty() {
        let migrated = migrate_record(object(json!({"id": "chan/2", "text": "hi"})));
        assert_eq!(migrated["photo_urls"], json!([]));
        assert_eq!(migrated["video_urls"], json!([]));
    }

    #[test]
    fn test_legacy_value_replaces_existing_list() {
        let migrated = migrate_record(object(json!({
            "photo_urls": ["https://cdn.example/a.jpg"],
            "photo_url": "https://cdn.example/b.jpg",
            "video_urls": ["https://cdn.example/v.mp4"],
            "video_url": ""
        })));
        assert_eq!(migrated["photo_urls"], json!(["https://cdn.example/b.jpg"]));
        assert_eq!(migrated["video_urls"], json!([]));
        assert!(!migrated.contains_key("photo_url"));
        assert!(!migrated.contains_key("video_url"));
    }

    #[test]
    fn test_non_string_legacy_keeps_list() {
        let migrated = migrate_record(object(json!({
            "photo_urls": ["https://cdn.example/a.jpg"],
            "photo_url": 7
        })));
        assert_eq!(migrated["photo_urls"], json!(["https://cdn.example/a.jpg"]));
        assert!(!migrated.contains_key("photo_url"));
    }

    #[test]
    fn test_malformed_links_become_empty() {
        let migrated = migrate_record(object(json!({"links": null})));
        assert_eq!(migrated["links"], json!([]));
        let migrated = migrate_record(object(json!({"links": "https://example.com"})));
        assert_eq!(migrated["links"], json!([]));
    }

    #[test]
    fn test_null_legacy_field_removed() {
        let migrated = migrate_record(object(json!({"photo_url": null})));
        assert!(!migrated.contains_key("photo_url"));
        assert_eq!(migrated["photo_urls"], json!([]));
    }

    #[test]
    fn test_migration_idempotent() {
        let once = migrate_record(object(json!({
            "id": "chan/3",
            "photo_url": "https://cdn.example/a.jpg",
            "links": ["https://example.com"]
        })));
        let twice = migrate_record(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_migrate_all_skips_garbage() {
        let posts = migrate_all(vec![
            json!({"id": "chan/1", "photo_url": "https://cdn.example/a.jpg"}),
            json!("not a post"),
            json!({"id": 42}),
            json!({"text": "no id"}),
        ]);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].photo_urls, vec!["https://cdn.example/a.jpg"]);
        assert_eq!(posts[1].id, None);
        assert_eq!(posts[1].text, "no id");
    }

    #[test]
    fn test_migrate_all_keeps_records_with_null_fields() {
        let posts = migrate_all(vec![
            json!({"id": "c/1", "text": "kept", "links": null}),
            json!({"id": "c/2", "text": null, "date": null, "parsed_at": null}),
            json!({"id": "c/3", "photo_urls": null, "video_urls": null, "photo_url": null}),
        ]);
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].text, "kept");
        assert!(posts[0].links.is_empty());
        assert_eq!(posts[1].id.as_deref(), Some("c/2"));
        assert_eq!(posts[1].text, "");
        assert_eq!(posts[1].date, "");
        assert!(posts[2].photo_urls.is_empty());
        assert!(posts[2].video_urls.is_empty());
    }
}
