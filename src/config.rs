//! Configuration module for the xcontext client.
//!
//! This module contains the credential bundles used by the client and the
//! environment variable handling for the binaries built on top of it.

use log::{debug, error, info, warn};
use std::env;
use std::fmt;

use crate::error::{TwitterError, TwitterResult};

/// Default cron expression for the mention watcher: every 5 minutes.
pub const DEFAULT_WATCH_SCHEDULE: &str = "0 0/5 * * * * *";

/// OAuth 1.0a User Context credentials.
///
/// Used to sign write operations (replies) and the general search. All four values
/// come from the Twitter Developer Portal.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The API Key (consumer key)
    pub api_key: String,
    /// The API Key Secret (consumer secret)
    pub api_key_secret: String,
    /// The Access Token of the acting account
    pub access_token: String,
    /// The Access Token Secret of the acting account
    pub access_token_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("api_key", &mask_token(&self.api_key))
            .field("api_key_secret", &"[REDACTED]")
            .field("access_token", &mask_token(&self.access_token))
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Configuration struct for Twitter/X API credentials.
///
/// Holds both credential sets for the lifetime of a client: the OAuth 1.0a bundle for
/// signed requests and the app-only Bearer Token for mention search. Both are required,
/// since both kinds of operation live on the same client.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterConfig {
    /// Signing credentials for replies and general search
    pub oauth: OAuthCredentials,
    /// App-only Bearer Token for mention search
    pub bearer_token: String,
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("oauth", &self.oauth)
            .field("bearer_token", &mask_token(&self.bearer_token))
            .finish()
    }
}

impl TwitterConfig {
    pub fn new(oauth: OAuthCredentials, bearer_token: impl Into<String>) -> Self {
        Self {
            oauth,
            bearer_token: bearer_token.into(),
        }
    }

    /// Creates a new `TwitterConfig` instance by loading credentials from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `TWITTER_API_KEY`: API Key (OAuth 1.0a consumer key)
    /// - `TWITTER_API_KEY_SECRET`: API Key Secret (OAuth 1.0a consumer secret)
    /// - `TWITTER_ACCESS_TOKEN`: Access Token of the bot account
    /// - `TWITTER_ACCESS_TOKEN_SECRET`: Access Token Secret of the bot account
    /// - `TWITTER_BEARER_TOKEN`: App-only Bearer Token for read operations
    ///
    /// # Returns
    ///
    /// - `Ok(TwitterConfig)`: If every variable is present and non-empty
    /// - `Err(TwitterError::Config)`: Naming the first missing variable
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use xcontext::TwitterConfig;
    ///
    /// let config = TwitterConfig::from_env().expect("Twitter credentials must be set");
    /// println!("{:?}", config);
    /// ```
    pub fn from_env() -> TwitterResult<Self> {
        info!("Loading Twitter configuration from environment variables");

        let oauth = OAuthCredentials {
            api_key: required_secret("TWITTER_API_KEY")?,
            api_key_secret: required_secret("TWITTER_API_KEY_SECRET")?,
            access_token: required_secret("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: required_secret("TWITTER_ACCESS_TOKEN_SECRET")?,
        };
        let bearer_token = required_secret("TWITTER_BEARER_TOKEN")?;

        info!("Twitter configuration loaded successfully");
        Ok(Self::new(oauth, bearer_token))
    }
}

/// Settings for the mention watcher binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Handle whose mentions are watched, without the leading `@`
    pub username: String,
    /// Only mentions sent by these handles are returned; empty means everyone
    pub allowed_authors: Vec<String>,
    /// Tweet ID to start after, if any
    pub since_id: Option<String>,
    /// Cron expression driving the poll
    pub schedule: String,
}

impl WatcherConfig {
    /// Loads the watcher settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WATCH_USERNAME` (required): Handle to watch, `@` prefix optional
    /// - `WATCH_ALLOWED_AUTHORS`: Comma-separated handles allowed to trigger the bot
    /// - `WATCH_SINCE_ID`: Only fetch mentions newer than this tweet ID
    /// - `WATCH_SCHEDULE`: Cron expression, defaults to every 5 minutes
    pub fn from_env() -> TwitterResult<Self> {
        let username = match env::var("WATCH_USERNAME") {
            Ok(value) if !value.trim().is_empty() => {
                value.trim().trim_start_matches('@').to_string()
            }
            _ => {
                error!("WATCH_USERNAME environment variable is not set");
                return Err(TwitterError::Config(
                    "WATCH_USERNAME must be set to the handle to watch".to_string(),
                ));
            }
        };

        let allowed_authors = env::var("WATCH_ALLOWED_AUTHORS")
            .map(|value| parse_author_list(&value))
            .unwrap_or_default();

        let since_id = env::var("WATCH_SINCE_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let schedule = env::var("WATCH_SCHEDULE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WATCH_SCHEDULE.to_string());

        info!(
            "Watching mentions of @{} (allowed authors: {}, since_id: {:?}, schedule: '{}')",
            username,
            allowed_authors.len(),
            since_id,
            schedule
        );

        Ok(Self {
            username,
            allowed_authors,
            since_id,
            schedule,
        })
    }
}

/// Splits a comma-separated list of handles, trimming whitespace and `@` prefixes.
pub fn parse_author_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|author| author.trim().trim_start_matches('@'))
        .filter(|author| !author.is_empty())
        .map(str::to_string)
        .collect()
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();
    if len > 16 {
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else if len > 8 {
        let prefix: String = chars[..8].iter().collect();
        format!("{}...", prefix)
    } else {
        "...".to_string()
    }
}

fn required_secret(name: &str) -> TwitterResult<String> {
    match env::var(name) {
        Ok(value) => {
            let value_length = value.len();
            info!(
                "Found {} environment variable with length: {}",
                name, value_length
            );
            debug!("{} (masked): {}", name, mask_token(&value));

            if value.trim().is_empty() {
                error!("{} is empty", name);
                return Err(TwitterError::Config(format!("{} cannot be empty", name)));
            }
            if value_length < 10 {
                warn!(
                    "{} seems unusually short ({} characters)",
                    name, value_length
                );
            }
            Ok(value)
        }
        Err(e) => {
            error!("Failed to load {} from environment: {}", name, e);
            Err(TwitterError::Config(format!("Not set {} in env", name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> TwitterConfig {
        TwitterConfig::new(
            OAuthCredentials {
                api_key: "consumer-key-0123456789".to_string(),
                api_key_secret: "consumer-secret-value".to_string(),
                access_token: "1234-access-token-abcdefgh".to_string(),
                access_token_secret: "access-secret-value".to_string(),
            },
            "AAAAAAAAAAAAAAAAAAAAAbearer",
        )
    }

    #[test]
    fn debug_output_masks_secrets() {
        let rendered = format!("{:?}", sample_config());
        assert!(!rendered.contains("consumer-secret-value"));
        assert!(!rendered.contains("access-secret-value"));
        assert!(!rendered.contains("AAAAAAAAAAAAAAAAAAAAAbearer"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("consumer...23456789"));
    }

    #[test]
    fn mask_token_lengths() {
        assert_eq!(mask_token("short"), "...");
        assert_eq!(mask_token("0123456789"), "01234567...");
        assert_eq!(mask_token("0123456789abcdefXYZ"), "01234567...bcdefXYZ");
    }

    #[test]
    fn parse_author_list_trims_entries() {
        assert_eq!(
            parse_author_list(" alice, @bob ,,carol "),
            vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
        );
        assert!(parse_author_list("").is_empty());
        assert!(parse_author_list(" , ").is_empty());
    }

    /// Loads credentials from the environment, then verifies a missing value is reported.
    #[test]
    fn test_twitter_config_from_env() {
        let vars = [
            ("TWITTER_API_KEY", "consumer-key-0123456789"),
            ("TWITTER_API_KEY_SECRET", "consumer-secret-value"),
            ("TWITTER_ACCESS_TOKEN", "1234-access-token-abcdefgh"),
            ("TWITTER_ACCESS_TOKEN_SECRET", "access-secret-value"),
            ("TWITTER_BEARER_TOKEN", "AAAAAAAAAAAAAAAAAAAAAbearer"),
        ];
        for (name, value) in vars {
            env::set_var(name, value);
        }

        let config = TwitterConfig::from_env().unwrap();
        assert_eq!(config, sample_config());

        env::remove_var("TWITTER_BEARER_TOKEN");
        let err = TwitterConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("TWITTER_BEARER_TOKEN"));

        env::set_var("TWITTER_BEARER_TOKEN", "   ");
        assert!(matches!(
            TwitterConfig::from_env(),
            Err(TwitterError::Config(_))
        ));

        // Clean up
        for (name, _) in vars {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_watcher_config_from_env() {
        env::remove_var("WATCH_USERNAME");
        assert!(WatcherConfig::from_env().is_err());

        env::set_var("WATCH_USERNAME", "@RateteBOT");
        env::set_var("WATCH_ALLOWED_AUTHORS", "RateteDev, AnotherUser");
        env::remove_var("WATCH_SINCE_ID");
        env::remove_var("WATCH_SCHEDULE");

        let watcher = WatcherConfig::from_env().unwrap();
        assert_eq!(watcher.username, "RateteBOT");
        assert_eq!(watcher.allowed_authors, vec!["RateteDev", "AnotherUser"]);
        assert_eq!(watcher.since_id, None);
        assert_eq!(watcher.schedule, DEFAULT_WATCH_SCHEDULE);

        env::set_var("WATCH_SINCE_ID", "1892178130493944087");
        let watcher = WatcherConfig::from_env().unwrap();
        assert_eq!(watcher.since_id.as_deref(), Some("1892178130493944087"));

        // Clean up
        for name in [
            "WATCH_USERNAME",
            "WATCH_ALLOWED_AUTHORS",
            "WATCH_SINCE_ID",
            "WATCH_SCHEDULE",
        ] {
            env::remove_var(name);
        }
    }
}
