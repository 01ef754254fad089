//! # xcontext watcher
//!
//! Watches mentions of a handle on a schedule and writes each one to stdout as a
//! structured JSON line, ready to be fed to an automated agent.
//!
//! ## Environment Variables
//!
//! - `TWITTER_API_KEY`, `TWITTER_API_KEY_SECRET`, `TWITTER_ACCESS_TOKEN`,
//!   `TWITTER_ACCESS_TOKEN_SECRET`: OAuth 1.0a credentials
//! - `TWITTER_BEARER_TOKEN`: App-only Bearer Token for mention search
//! - `WATCH_USERNAME`: Handle to watch
//! - `WATCH_ALLOWED_AUTHORS`: Comma-separated handles allowed to mention the bot
//! - `WATCH_SINCE_ID`: Start after this tweet ID
//! - `WATCH_SCHEDULE`: Cron expression (defaults to every 5 minutes)

use std::sync::Arc;

use log::{error, info};

use xcontext::{run_mention_cronjob, MentionWatcher, TwitterClient, TwitterConfig, WatcherConfig};

/// Main entry point for the mention watcher.
///
/// # Logging
///
/// The application uses the `env_logger` crate for structured logging. Log levels
/// can be controlled via the `RUST_LOG` environment variable. Logs go to stderr, so
/// stdout carries only the JSON lines.
///
/// # Example Usage
///
/// ```bash
/// WATCH_USERNAME=RateteBOT WATCH_ALLOWED_AUTHORS=RateteDev RUST_LOG=info cargo run
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize the logging system
    env_logger::init();

    let config = TwitterConfig::from_env().map_err(|e| {
        error!("Failed to load Twitter credentials: {}", e);
        e
    })?;
    let settings = WatcherConfig::from_env().map_err(|e| {
        error!("Failed to load watcher settings: {}", e);
        e
    })?;

    info!("Starting mention watcher for @{}", settings.username);
    let watcher = Arc::new(MentionWatcher::new(TwitterClient::new(config), settings));

    run_mention_cronjob(watcher).await
}
