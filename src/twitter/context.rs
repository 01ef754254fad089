//! Structured conversational context for mentions.
//!
//! Turns a flat search response into one self-contained [`StructuredMention`] per
//! tweet, resolving the author, the replied-to tweet and the quoted tweet against
//! the response's `includes` table.

use std::collections::HashMap;

use log::{debug, info};

use super::api::{Transport, TwitterClient};
use super::types::{
    MentionContext, ReferenceType, ResolvedTweet, SearchResponse, StructuredMention, Tweet, User,
};
use crate::error::{EntityKind, TwitterError, TwitterResult};

/// Id-indexed view over a response's `includes`, built once per normalization.
struct IncludesIndex<'a> {
    users: HashMap<&'a str, &'a User>,
    tweets: HashMap<&'a str, &'a Tweet>,
}

impl<'a> IncludesIndex<'a> {
    fn new(response: &'a SearchResponse) -> Self {
        let mut users = HashMap::new();
        let mut tweets = HashMap::new();

        if let Some(includes) = &response.includes {
            // First occurrence wins on duplicate ids
            for user in &includes.users {
                users.entry(user.id.as_str()).or_insert(user);
            }
            for tweet in &includes.tweets {
                tweets.entry(tweet.id.as_str()).or_insert(tweet);
            }
        }

        Self { users, tweets }
    }

    fn user(&self, id: &str) -> TwitterResult<&'a User> {
        self.users
            .get(id)
            .copied()
            .ok_or_else(|| TwitterError::EntityNotFound {
                kind: EntityKind::User,
                id: id.to_string(),
            })
    }

    fn tweet(&self, id: &str) -> TwitterResult<&'a Tweet> {
        self.tweets
            .get(id)
            .copied()
            .ok_or_else(|| TwitterError::EntityNotFound {
                kind: EntityKind::Tweet,
                id: id.to_string(),
            })
    }

    fn resolve(&self, tweet: &Tweet) -> TwitterResult<ResolvedTweet> {
        Ok(ResolvedTweet {
            id: tweet.id.clone(),
            text: tweet.text.clone(),
            author: self.user(&tweet.author_id)?.clone(),
            created_at: tweet.created_at.clone(),
        })
    }

    /// Resolves the first reference of `kind` on `tweet`, if it has one.
    fn resolve_reference(
        &self,
        tweet: &Tweet,
        kind: ReferenceType,
    ) -> TwitterResult<Option<ResolvedTweet>> {
        match tweet.first_reference(kind) {
            Some(reference) => {
                let referenced = self.tweet(&reference.id)?;
                self.resolve(referenced).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Converts every tweet in `response.data` into a [`StructuredMention`], in order.
///
/// A context block is attached when the tweet has a `conversation_id` or a
/// `referenced_tweets` list; its conversation id falls back to the tweet's own id.
/// Only the first `replied_to` and the first `quoted` reference are used.
///
/// # Errors
///
/// Returns [`TwitterError::EntityNotFound`] as soon as an author or referenced tweet
/// is missing from `includes`. No partial result is returned.
pub fn normalize_mentions(response: &SearchResponse) -> TwitterResult<Vec<StructuredMention>> {
    let index = IncludesIndex::new(response);

    response
        .data
        .iter()
        .map(|tweet| normalize_tweet(&index, tweet))
        .collect()
}

fn normalize_tweet(index: &IncludesIndex<'_>, tweet: &Tweet) -> TwitterResult<StructuredMention> {
    let mention = index.resolve(tweet)?;

    // An empty conversation id counts as absent
    let conversation_id = tweet.conversation_id.as_deref().filter(|id| !id.is_empty());

    let context = if conversation_id.is_some() || tweet.referenced_tweets.is_some() {
        Some(MentionContext {
            replied_to: index.resolve_reference(tweet, ReferenceType::RepliedTo)?,
            quoted: index.resolve_reference(tweet, ReferenceType::Quoted)?,
            conversation_id: conversation_id.unwrap_or(&tweet.id).to_string(),
        })
    } else {
        None
    };

    Ok(StructuredMention { mention, context })
}

impl<T: Transport> TwitterClient<T> {
    /// Fetches mentions of `username` and returns them as structured context.
    ///
    /// Combines [`search_recent_mentions`](TwitterClient::search_recent_mentions) with
    /// [`normalize_mentions`].
    pub async fn get_structured_mentions<S: AsRef<str>>(
        &self,
        username: &str,
        since_id: Option<&str>,
        allowed_authors: &[S],
    ) -> TwitterResult<Vec<StructuredMention>> {
        let response = self
            .search_recent_mentions(username, since_id, allowed_authors)
            .await?;
        let mentions = normalize_mentions(&response)?;

        let with_context = mentions.iter().filter(|m| m.context.is_some()).count();
        info!(
            "Structured {} mentions of @{} ({} with conversation context)",
            mentions.len(),
            username.trim_start_matches('@'),
            with_context
        );
        debug!(
            "Structured mention ids: {:?}",
            mentions.iter().map(|m| &m.mention.id).collect::<Vec<_>>()
        );

        Ok(mentions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    fn example_response() -> SearchResponse {
        response(json!({
            "data": [{
                "id": "1",
                "text": "hi @bot",
                "author_id": "u1",
                "created_at": "t1",
                "referenced_tweets": [{"type": "replied_to", "id": "2"}],
                "conversation_id": "100"
            }],
            "includes": {
                "users": [
                    {"id": "u1", "username": "alice", "name": "Alice"},
                    {"id": "u2", "username": "bob", "name": "Bob"}
                ],
                "tweets": [
                    {"id": "2", "text": "original", "author_id": "u2", "created_at": "t0"}
                ]
            },
            "meta": {"newest_id": "1", "oldest_id": "1", "result_count": 1}
        }))
    }

    #[test]
    fn test_reply_context_is_resolved() {
        let mentions = normalize_mentions(&example_response()).unwrap();
        assert_eq!(mentions.len(), 1);

        let mention = &mentions[0];
        assert_eq!(mention.mention.id, "1");
        assert_eq!(mention.mention.author.username, "alice");
        assert_eq!(mention.mention.created_at, "t1");

        let context = mention.context.as_ref().unwrap();
        assert_eq!(context.conversation_id, "100");
        assert!(context.quoted.is_none());

        let parent = context.replied_to.as_ref().unwrap();
        assert_eq!(parent.id, "2");
        assert_eq!(parent.text, "original");
        assert_eq!(parent.author.id, "u2");
        assert_eq!(parent.author.name, "Bob");
        assert_eq!(parent.created_at, "t0");
    }

    #[test]
    fn test_plain_tweet_has_no_context() {
        let mentions = normalize_mentions(&response(json!({
            "data": [{"id": "5", "text": "@bot hello", "author_id": "u1", "created_at": "t5"}],
            "includes": {"users": [{"id": "u1", "username": "alice", "name": "Alice"}]},
            "meta": {"result_count": 1}
        })))
        .unwrap();

        assert!(mentions[0].context.is_none());
        let value = serde_json::to_value(&mentions[0]).unwrap();
        assert!(value.get("context").is_none());
    }

    #[test]
    fn test_conversation_id_defaults_to_tweet_id() {
        let mentions = normalize_mentions(&response(json!({
            "data": [{
                "id": "7",
                "text": "look @bot",
                "author_id": "u1",
                "created_at": "t7",
                "referenced_tweets": [{"type": "quoted", "id": "3"}]
            }],
            "includes": {
                "users": [{"id": "u1", "username": "alice", "name": "Alice"}],
                "tweets": [{"id": "3", "text": "quotable", "author_id": "u1", "created_at": "t3"}]
            }
        })))
        .unwrap();

        let context = mentions[0].context.as_ref().unwrap();
        assert_eq!(context.conversation_id, "7");
        assert!(context.replied_to.is_none());
        assert_eq!(context.quoted.as_ref().unwrap().text, "quotable");
    }

    #[test]
    fn test_first_reference_of_each_kind_wins() {
        let mentions = normalize_mentions(&response(json!({
            "data": [{
                "id": "9",
                "text": "@bot both",
                "author_id": "u1",
                "created_at": "t9",
                "conversation_id": "2",
                "referenced_tweets": [
                    {"type": "quoted", "id": "3"},
                    {"type": "replied_to", "id": "2"},
                    {"type": "replied_to", "id": "missing"},
                    {"type": "quoted", "id": "also-missing"}
                ]
            }],
            "includes": {
                "users": [
                    {"id": "u1", "username": "alice", "name": "Alice"},
                    {"id": "u2", "username": "bob", "name": "Bob"}
                ],
                "tweets": [
                    {"id": "2", "text": "parent", "author_id": "u2", "created_at": "t2"},
                    {"id": "3", "text": "quoted", "author_id": "u1", "created_at": "t3"}
                ]
            }
        })))
        .unwrap();

        let context = mentions[0].context.as_ref().unwrap();
        assert_eq!(context.replied_to.as_ref().unwrap().id, "2");
        assert_eq!(context.quoted.as_ref().unwrap().id, "3");
    }

    #[test]
    fn test_missing_author_fails() {
        let err = normalize_mentions(&response(json!({
            "data": [{"id": "1", "text": "hi", "author_id": "ghost", "created_at": "t1"}],
            "includes": {"users": []}
        })))
        .unwrap_err();

        match err {
            TwitterError::EntityNotFound { kind, id } => {
                assert_eq!(kind, EntityKind::User);
                assert_eq!(id, "ghost");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_includes_fails_for_author() {
        let err = normalize_mentions(&response(json!({
            "data": [{"id": "1", "text": "hi", "author_id": "u1", "created_at": "t1"}]
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            TwitterError::EntityNotFound {
                kind: EntityKind::User,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_parent_tweet_fails() {
        let mut response = example_response();
        response.includes.as_mut().unwrap().tweets.clear();

        let err = normalize_mentions(&response).unwrap_err();
        assert_eq!(err.to_string(), "Tweet not found: 2");
    }

    #[test]
    fn test_missing_quoted_tweet_fails() {
        let err = normalize_mentions(&response(json!({
            "data": [{
                "id": "8",
                "text": "@bot look at this",
                "author_id": "u1",
                "created_at": "t8",
                "referenced_tweets": [{"type": "quoted", "id": "404"}]
            }],
            "includes": {
                "users": [{"id": "u1", "username": "alice", "name": "Alice"}],
                "tweets": []
            }
        })))
        .unwrap_err();

        match err {
            TwitterError::EntityNotFound { kind, id } => {
                assert_eq!(kind, EntityKind::Tweet);
                assert_eq!(id, "404");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_conversation_id_counts_as_absent() {
        let mentions = normalize_mentions(&response(json!({
            "data": [
                {"id": "11", "text": "@bot hi", "author_id": "u1", "created_at": "t11", "conversation_id": ""},
                {
                    "id": "12",
                    "text": "@bot again",
                    "author_id": "u1",
                    "created_at": "t12",
                    "conversation_id": "",
                    "referenced_tweets": [{"type": "quoted", "id": "3"}]
                }
            ],
            "includes": {
                "users": [{"id": "u1", "username": "alice", "name": "Alice"}],
                "tweets": [{"id": "3", "text": "quotable", "author_id": "u1", "created_at": "t3"}]
            }
        })))
        .unwrap();

        assert!(mentions[0].context.is_none());
        assert_eq!(mentions[1].context.as_ref().unwrap().conversation_id, "12");
    }

    #[test]
    fn test_missing_parent_author_fails() {
        let mut response = example_response();
        response
            .includes
            .as_mut()
            .unwrap()
            .users
            .retain(|user| user.id != "u2");

        let err = normalize_mentions(&response).unwrap_err();
        assert_eq!(err.to_string(), "User not found: u2");
    }

    #[test]
    fn test_order_and_length_are_preserved() {
        let mentions = normalize_mentions(&response(json!({
            "data": [
                {"id": "30", "text": "c", "author_id": "u1", "created_at": "t3"},
                {"id": "10", "text": "a", "author_id": "u2", "created_at": "t1"},
                {"id": "20", "text": "b", "author_id": "u1", "created_at": "t2", "conversation_id": "10"}
            ],
            "includes": {"users": [
                {"id": "u1", "username": "alice", "name": "Alice"},
                {"id": "u2", "username": "bob", "name": "Bob"}
            ]}
        })))
        .unwrap();

        let ids: Vec<&str> = mentions.iter().map(|m| m.mention.id.as_str()).collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
        assert!(mentions[2].context.is_some());
    }

    #[test]
    fn test_empty_response_normalizes_to_empty_list() {
        let mentions = normalize_mentions(&SearchResponse::default()).unwrap();
        assert!(mentions.is_empty());
    }
}
