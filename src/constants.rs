//! Shared constants used across the application.

/// User agent string sent with every page request.
///
/// The channel preview pages are served to browsers; a realistic browser user agent
/// gets the same markup a visitor would see.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Substring identifying the platform's own CDN and media hosts.
pub const PLATFORM_MARKER: &str = "telegram";

/// Public hosts of the platform itself. Links to them are never outbound, whatever
/// host the channel page was fetched from.
pub const PLATFORM_HOSTS: &[&str] = &["t.me", "telegram.me"];
