use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::constants::BROWSER_USER_AGENT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Harvester configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Source
    pub channel_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub page_delay: Duration,

    // Pagination / extraction
    pub max_posts: usize,
    pub permissive_media: bool,

    // Store
    pub store_path: PathBuf,
    pub recent_path: PathBuf,
    pub store_cap: usize,
    pub recent_count: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset or empty values fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Source
            channel_url: env_or_default("CHANNEL_URL", "https://t.me/s/sochiautoparts"),
            user_agent: env_or_default("USER_AGENT", BROWSER_USER_AGENT),
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 30)?),
            page_delay: Duration::from_millis(parse_env("PAGE_DELAY_MS", 1000)?),

            // Pagination / extraction
            max_posts: parse_env("MAX_POSTS", 200)?,
            permissive_media: parse_env_bool("PERMISSIVE_MEDIA", true)?,

            // Store
            store_path: PathBuf::from(env_or_default("CACHE_FILE", "data/cached_posts.json")),
            recent_path: PathBuf::from(env_or_default("LATEST_FILE", "data/latest_posts.json")),
            store_cap: parse_env("STORE_CAP", 200)?,
            recent_count: parse_env("RECENT_COUNT", 10)?,
        })
    }

    /// Configuration with small limits, no inter-page delay and paths under `./target`.
    ///
    /// Tests override the fields they care about with struct update syntax.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            channel_url: "https://t.me/s/testchannel".to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(5),
            page_delay: Duration::ZERO,
            max_posts: 20,
            permissive_media: true,
            store_path: PathBuf::from("target/test-data/cached_posts.json"),
            recent_path: PathBuf::from("target/test-data/latest_posts.json"),
            store_cap: 20,
            recent_count: 3,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.channel_url).map_err(|e| ConfigError::InvalidValue {
            name: "CHANNEL_URL".to_string(),
            message: e.to_string(),
        })?;
        if parsed.host_str().is_none() {
            return Err(ConfigError::InvalidValue {
                name: "CHANNEL_URL".to_string(),
                message: "must include a host".to_string(),
            });
        }
        if self.max_posts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_POSTS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.store_cap == 0 {
            return Err(ConfigError::InvalidValue {
                name: "STORE_CAP".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.recent_count == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RECENT_COUNT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Host of the channel URL, used to tell the source's own links from outbound ones.
    #[must_use]
    pub fn source_host(&self) -> Option<String> {
        Url::parse(&self.channel_url)
            .ok()
            .and_then(|u| u.host_str().map(ToString::to_string))
    }
}

/// A set, non-empty environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_value(name).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError>,
{
    env_value(name).map_or(Ok(default), |value| {
        value.parse().map_err(|source| ConfigError::ParseInt {
            name: name.to_string(),
            source,
        })
    })
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = env_value(name) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseBool {
            name: name.to_string(),
            value,
        }),
    }
}
