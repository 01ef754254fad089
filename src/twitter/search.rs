//! Tweet search functionality for Twitter API.
//!
//! This module contains functions for searching mentions of a handle and for
//! free-form recent search using the Twitter API v2.

use log::{debug, info};
use reqwest::Method;

use super::api::{sanitize_for_logging, HttpRequest, Transport, TwitterClient};
use super::types::SearchResponse;
use crate::error::TwitterResult;

const SEARCH_PATH: &str = "tweets/search/recent";

/// Tweet fields requested for mention search.
pub const MENTION_TWEET_FIELDS: &str =
    "text,referenced_tweets,author_id,created_at,in_reply_to_user_id,conversation_id";
/// Expansions requested for mention search so `includes` can resolve every reference.
pub const MENTION_EXPANSIONS: &str =
    "referenced_tweets.id,author_id,in_reply_to_user_id,referenced_tweets.id.author_id";
pub const MENTION_USER_FIELDS: &str = "username";

/// Tweet fields requested for general search.
pub const SEARCH_TWEET_FIELDS: &str = "conversation_id,id,in_reply_to_user_id,referenced_tweets,context_annotations,created_at,text,author_id";
pub const SEARCH_EXPANSIONS: &str =
    "referenced_tweets.id,referenced_tweets.id.author_id,in_reply_to_user_id,author_id";
pub const SEARCH_USER_FIELDS: &str = "username,name,verified,protected";

/// Builds the search query for mentions of `username`.
///
/// With allowed authors the result is `(@username) (from:a OR from:b)`; without
/// any, only the mention clause `@username` is used.
///
/// # Example
///
/// ```rust
/// use xcontext::twitter::build_mention_query;
///
/// assert_eq!(build_mention_query("bot", &["alice", "bob"]), "(@bot) (from:alice OR from:bob)");
/// assert_eq!(build_mention_query("bot", &[] as &[&str]), "@bot");
/// ```
pub fn build_mention_query<S: AsRef<str>>(username: &str, allowed_authors: &[S]) -> String {
    let username = username.trim_start_matches('@');

    if allowed_authors.is_empty() {
        return format!("@{}", username);
    }

    let from_query = allowed_authors
        .iter()
        .map(|author| format!("from:{}", author.as_ref().trim_start_matches('@')))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!("(@{}) ({})", username, from_query)
}

/// Encodes `params` as a query string, preserving their order.
pub(crate) fn encode_query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

impl<T: Transport> TwitterClient<T> {
    /// Searches recent mentions of `username`, optionally newer than `since_id`
    /// and restricted to `allowed_authors`.
    ///
    /// Uses the app-only Bearer Token. The requested expansions populate
    /// `includes` with the authors and referenced tweets needed by
    /// [`normalize_mentions`](super::normalize_mentions). Only the first page is
    /// fetched; `meta.next_token` tells whether more exist.
    ///
    /// # Parameters
    ///
    /// - `username`: Handle being mentioned, e.g. `"RateteBOT"`
    /// - `since_id`: Only return tweets newer than this ID
    /// - `allowed_authors`: Handles allowed as senders; empty allows everyone
    ///
    /// # Returns
    ///
    /// - `Ok(SearchResponse)`: The decoded API response
    /// - `Err(TwitterError)`: Rate limit, auth failure, transport or decoding error
    pub async fn search_recent_mentions<S: AsRef<str>>(
        &self,
        username: &str,
        since_id: Option<&str>,
        allowed_authors: &[S],
    ) -> TwitterResult<SearchResponse> {
        self.search_recent_mentions_page(username, since_id, allowed_authors, None)
            .await
    }

    /// Same as [`search_recent_mentions`](TwitterClient::search_recent_mentions), but
    /// fetches the page identified by `pagination_token` (a previous page's
    /// `meta.next_token`) when one is given.
    pub async fn search_recent_mentions_page<S: AsRef<str>>(
        &self,
        username: &str,
        since_id: Option<&str>,
        allowed_authors: &[S],
        pagination_token: Option<&str>,
    ) -> TwitterResult<SearchResponse> {
        let query = build_mention_query(username, allowed_authors);
        info!("Searching recent mentions with query: {}", query);

        let mut params = vec![("query", query.as_str())];
        if let Some(since_id) = since_id {
            params.push(("since_id", since_id));
        }
        params.extend([
            ("tweet.fields", MENTION_TWEET_FIELDS),
            ("expansions", MENTION_EXPANSIONS),
            ("user.fields", MENTION_USER_FIELDS),
        ]);
        if let Some(token) = pagination_token {
            params.push(("pagination_token", token));
        }

        let url = format!("{}?{}", self.endpoint(SEARCH_PATH), encode_query_string(&params));
        info!("Mentions search URL: {}", url);

        let request =
            HttpRequest::new(Method::GET, url).header("Authorization", self.bearer_header());

        let body = self.execute(request, "search_recent_mentions").await?;
        let response: SearchResponse = serde_json::from_value(body)?;
        info!(
            "Found {} mentions (result_count: {}, more pages: {})",
            response.data.len(),
            response.meta.result_count,
            response.meta.next_token.is_some()
        );
        Ok(response)
    }

    /// Runs a free-form recent search with the broader field set.
    ///
    /// Uses OAuth 1.0a signed authentication. The signature covers the query string.
    ///
    /// # Parameters
    ///
    /// - `query`: Search query in the API's query syntax, e.g. `"#rustlang -is:retweet"`
    ///
    /// # Returns
    ///
    /// - `Ok(SearchResponse)`: The decoded API response
    /// - `Err(TwitterError)`: Rate limit, auth failure, signing, transport or decoding error
    pub async fn search_tweets(&self, query: &str) -> TwitterResult<SearchResponse> {
        info!("Searching tweets with query: {}", sanitize_for_logging(query, 200));

        let params = [
            ("query", query),
            ("tweet.fields", SEARCH_TWEET_FIELDS),
            ("expansions", SEARCH_EXPANSIONS),
            ("user.fields", SEARCH_USER_FIELDS),
        ];
        let url = format!("{}?{}", self.endpoint(SEARCH_PATH), encode_query_string(&params));
        debug!("Search URL: {}", url);

        let auth_header = self.oauth1_header(&Method::GET, &url)?;
        let request = HttpRequest::new(Method::GET, url).header("Authorization", auth_header);

        let body = self.execute(request, "search_tweets").await?;
        let response: SearchResponse = serde_json::from_value(body)?;
        info!("Found {} tweets", response.data.len());
        Ok(response)
    }
}
