//! Channel post harvester library.
//!
//! Walks a public channel's web preview page by page, extracts each message into a
//! normalized [`post::Post`], and merges the results into a capped, deduplicated
//! JSON store with a small recent-posts projection next to it.

pub mod config;
pub mod constants;
pub mod extractor;
pub mod fetch;
pub mod harvest;
pub mod paginator;
pub mod post;
pub mod store;

pub use harvest::run_once;
