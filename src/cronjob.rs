//! Cronjob module for scheduled tasks.
//!
//! This module contains the mention watcher: a scheduled job that polls mentions of
//! a handle, hands them on as structured context and backs off while rate limited.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::WatcherConfig;
use crate::error::{TwitterError, TwitterResult};
use crate::twitter::{normalize_mentions, StructuredMention, Transport, TwitterClient};

#[derive(Debug, Default)]
struct WatchState {
    since_id: Option<String>,
    blocked_until: Option<DateTime<Utc>>,
}

/// Polls mentions of one handle, remembering the newest id seen.
///
/// Polls are serialized: a tick that fires while the previous one is still running
/// waits for it to finish.
pub struct MentionWatcher<T> {
    client: TwitterClient<T>,
    settings: WatcherConfig,
    state: Mutex<WatchState>,
}

impl<T: Transport> MentionWatcher<T> {
    pub fn new(client: TwitterClient<T>, settings: WatcherConfig) -> Self {
        let state = WatchState {
            since_id: settings.since_id.clone(),
            blocked_until: None,
        };
        Self {
            client,
            settings,
            state: Mutex::new(state),
        }
    }

    pub fn settings(&self) -> &WatcherConfig {
        &self.settings
    }

    /// The id new mentions must be newer than on the next poll.
    pub async fn since_id(&self) -> Option<String> {
        self.state.lock().await.since_id.clone()
    }

    /// Until when polls are skipped after a rate-limit response.
    pub async fn blocked_until(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.blocked_until
    }

    /// Fetches mentions newer than the last seen id.
    ///
    /// Follows `meta.next_token` until the last page. The cursor only advances once
    /// every page is in, so a failure part way through re-polls the same window.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<StructuredMention>)`: New mentions in API order; empty when nothing
    ///   is new or while backing off from a rate limit
    /// - `Err(TwitterError)`: The failure from the client. A rate limit additionally
    ///   blocks polling until the reset instant.
    pub async fn poll_once(&self) -> TwitterResult<Vec<StructuredMention>> {
        self.poll_at(Utc::now()).await
    }

    pub(crate) async fn poll_at(&self, now: DateTime<Utc>) -> TwitterResult<Vec<StructuredMention>> {
        let mut state = self.state.lock().await;

        if let Some(until) = state.blocked_until {
            if now < until {
                info!(
                    "Skipping mention poll for @{}: rate limited until {}",
                    self.settings.username, until
                );
                return Ok(Vec::new());
            }
            state.blocked_until = None;
        }

        let mut mentions = Vec::new();
        let mut newest_id: Option<String> = None;
        let mut pagination_token: Option<String> = None;

        // The cursor moves only after the last page
        loop {
            let result = self
                .client
                .search_recent_mentions_page(
                    &self.settings.username,
                    state.since_id.as_deref(),
                    self.settings.allowed_authors.as_slice(),
                    pagination_token.as_deref(),
                )
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    if let Some(wait) = e.retry_after() {
                        let wait = Duration::from_std(wait).unwrap_or_else(|_| Duration::zero());
                        state.blocked_until = Some(now + wait);
                        warn!(
                            "Mention polling for @{} paused for {} seconds",
                            self.settings.username,
                            wait.num_seconds()
                        );
                    }
                    return Err(e);
                }
            };

            mentions.extend(normalize_mentions(&response)?);

            // Pages run newest to oldest, so the first page holds the newest id
            if newest_id.is_none() {
                newest_id = response.meta.newest_id;
            }

            match response.meta.next_token {
                Some(token) if pagination_token.as_deref() != Some(token.as_str()) => {
                    debug!("Fetching next page of mentions for @{}", self.settings.username);
                    pagination_token = Some(token);
                }
                Some(token) => {
                    warn!("Mention search returned the same next_token {} twice, stopping", token);
                    break;
                }
                None => break,
            }
        }

        if let Some(newest_id) = newest_id {
            info!("Advancing since_id to {}", newest_id);
            state.since_id = Some(newest_id);
        }

        Ok(mentions)
    }
}

/// Writes each mention as one JSON line on stdout.
pub fn emit_mentions(mentions: &[StructuredMention]) {
    for mention in mentions {
        match serde_json::to_string(mention) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to serialize mention {}: {}", mention.mention.id, e),
        }
    }
}

async fn run_poll<T: Transport>(watcher: &MentionWatcher<T>) {
    info!(
        "Starting scheduled check for @{} mentions",
        watcher.settings().username
    );
    match watcher.poll_once().await {
        Ok(mentions) => {
            if mentions.is_empty() {
                info!("No new mentions found");
            } else {
                info!("Found {} new mentions", mentions.len());
                emit_mentions(&mentions);
            }
        }
        Err(e @ TwitterError::RateLimitExceeded { .. }) => {
            warn!("Scheduled check for mentions rate limited: {}", e);
        }
        Err(e) if e.is_auth_error() => {
            error!("Scheduled check for mentions rejected credentials: {}", e);
        }
        Err(e) => {
            error!("Scheduled check for mentions failed: {}", e);
        }
    }
}

/// Creates a scheduler with the mention watcher job on `watcher`'s schedule.
///
/// # Returns
///
/// - `Ok(JobScheduler)`: The configured, not yet started, job scheduler
/// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If the scheduler cannot be
///   created, the cron expression is invalid or the job cannot be added
pub async fn start_mention_cronjob<T: Transport + 'static>(
    watcher: Arc<MentionWatcher<T>>,
) -> Result<JobScheduler, Box<dyn std::error::Error + Send + Sync>> {
    let sched = JobScheduler::new().await?;
    let schedule = watcher.settings().schedule.clone();

    sched
        .add(Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let watcher = Arc::clone(&watcher);
            Box::pin(async move {
                run_poll(&watcher).await;
            })
        })?)
        .await?;

    info!(
        "Cronjob scheduler configured to check mentions on schedule '{}'",
        schedule
    );
    Ok(sched)
}

/// Polls once immediately, then runs the scheduled watcher until Ctrl+C.
pub async fn run_mention_cronjob<T: Transport + 'static>(
    watcher: Arc<MentionWatcher<T>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_poll(&watcher).await;

    let mut sched = start_mention_cronjob(watcher).await?;
    sched.start().await?;

    info!("Cronjob scheduler started successfully");

    // Wait for Ctrl+C signal to gracefully shutdown
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, stopping cronjob scheduler");

    sched.shutdown().await?;
    info!("Cronjob scheduler stopped");

    Ok(())
}
