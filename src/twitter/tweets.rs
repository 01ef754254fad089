//! Tweet operations for Twitter API.
//!
//! This module contains the reply operation using the Twitter API v2.

use log::{debug, info};
use reqwest::Method;
use serde_json::json;

use super::api::{sanitize_for_logging, HttpRequest, Transport, TwitterClient};
use super::types::ReplyResponse;
use crate::error::TwitterResult;

const TWEETS_PATH: &str = "tweets";

impl<T: Transport> TwitterClient<T> {
    /// Replies to a tweet using the Twitter/X API v2 endpoint.
    ///
    /// Posts a new tweet whose `reply.in_reply_to_tweet_id` is `tweet_id`, signed with
    /// OAuth 1.0a. There is no idempotency key: calling this twice posts two replies.
    ///
    /// # Parameters
    ///
    /// - `tweet_id`: The ID of the tweet to reply to
    /// - `text`: The text content of the reply
    ///
    /// # Returns
    ///
    /// - `Ok(ReplyResponse)`: The created tweet's id, text and edit history
    /// - `Err(TwitterError)`: Rate limit, auth failure, signing, transport or decoding error
    pub async fn reply_to_tweet(&self, tweet_id: &str, text: &str) -> TwitterResult<ReplyResponse> {
        info!(
            "Starting reply operation to tweet {} with text: '{}'",
            tweet_id,
            sanitize_for_logging(text, 100)
        );

        let url = self.endpoint(TWEETS_PATH);
        info!("Target URL: {}", url);

        let payload = json!({
            "text": text,
            "reply": {
                "in_reply_to_tweet_id": tweet_id
            }
        });
        debug!("Reply payload: {}", serde_json::to_string_pretty(&payload)?);

        debug!("Building OAuth 1.0a authorization header");
        let auth_header = self.oauth1_header(&Method::POST, &url)?;

        let request = HttpRequest::new(Method::POST, url)
            .header("Authorization", auth_header)
            .header("Content-Type", "application/json")
            .body(payload.to_string());

        let body = self.execute(request, "reply_to_tweet").await?;
        let response: ReplyResponse = serde_json::from_value(body)?;
        info!("Reply posted with id {}", response.data.id);
        Ok(response)
    }
}
