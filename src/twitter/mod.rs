//! Twitter/X API integration module.
//!
//! This module contains the client for the Twitter/X API v2: mention search with an
//! app-only Bearer Token, replies and general search signed with OAuth 1.0a, and the
//! normalizer that turns mention search results into structured context.

mod api;
mod context;
mod search;
mod tweets;
mod types;

// Re-export public API
pub use api::{
    classify_response, HttpRequest, HttpResponse, ReqwestTransport, Transport, TwitterClient,
    DEFAULT_API_BASE_URL, RATE_LIMIT_RESET_HEADER,
};
pub use context::normalize_mentions;
pub use search::{
    build_mention_query, MENTION_EXPANSIONS, MENTION_TWEET_FIELDS, MENTION_USER_FIELDS,
    SEARCH_EXPANSIONS, SEARCH_TWEET_FIELDS, SEARCH_USER_FIELDS,
};
pub use types::{
    AnnotationItem, ContextAnnotation, Includes, MentionContext, PostedTweet, ReferenceType,
    ReferencedTweet, ReplyResponse, ResolvedTweet, SearchMeta, SearchResponse,
    StructuredMention, Tweet, User,
};
