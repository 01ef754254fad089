//! OAuth authentication module for Twitter/X API integration.
//!
//! This module builds the two kinds of Authorization header the client sends:
//! an app-only OAuth 2.0 Bearer Token (read-only mention search) and an
//! OAuth 1.0a HMAC-SHA1 signed header (replies and general search).

use base64::Engine;
use hmac::{Hmac, Mac};
use log::debug;
use rand::Rng;
use sha1::Sha1;
use url::Url;

use crate::config::OAuthCredentials;
use crate::error::{TwitterError, TwitterResult};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;

/// Builds the Authorization header for OAuth 2.0 Bearer Token authentication.
///
/// # Example
///
/// ```rust
/// use xcontext::build_bearer_auth_header;
///
/// let header = build_bearer_auth_header("your_bearer_token");
/// assert_eq!(header, "Bearer your_bearer_token");
/// ```
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}

/// Builds a signed OAuth 1.0a Authorization header for a single request.
///
/// A fresh nonce and timestamp are generated on every call. Query parameters present
/// in `url` are part of the signature base string; request bodies are not.
///
/// # Parameters
///
/// - `credentials`: Consumer key/secret and access token/secret
/// - `method`: HTTP method, e.g. `"GET"` or `"POST"`
/// - `url`: Absolute request URL, including any query string
///
/// # Returns
///
/// - `Ok(String)`: A header of the form `OAuth oauth_consumer_key="...", ...`
/// - `Err(TwitterError::Signing)`: If the URL cannot be parsed or the HMAC key is rejected
pub fn build_oauth1_header(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
) -> TwitterResult<String> {
    let nonce = generate_nonce();
    let timestamp = chrono::Utc::now().timestamp();
    debug!("Signing {} request with OAuth 1.0a (timestamp {})", method, timestamp);
    sign_request(credentials, method, url, &nonce, timestamp)
}

/// Builds the OAuth 1.0a header with a caller-supplied nonce and timestamp.
///
/// This is the deterministic core of [`build_oauth1_header`].
pub fn sign_request(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    nonce: &str,
    timestamp: i64,
) -> TwitterResult<String> {
    let timestamp = timestamp.to_string();
    let oauth_params = [
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let base_string = signature_base_string(method, url, &oauth_params)?;
    let signing_key = format!(
        "{}&{}",
        percent_encode(&credentials.api_key_secret),
        percent_encode(&credentials.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| TwitterError::Signing(format!("Invalid HMAC key: {}", e)))?;
    mac.update(base_string.as_bytes());
    let signature =
        base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
    header_params.push(("oauth_signature", signature.as_str()));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}

/// Builds `METHOD&encoded_base_url&encoded_parameter_string`.
///
/// The parameter string is the union of the OAuth parameters and the URL's query
/// parameters, percent-encoded and sorted by key then value.
pub(crate) fn signature_base_string(
    method: &str,
    url: &str,
    oauth_params: &[(&str, &str)],
) -> TwitterResult<String> {
    let parsed =
        Url::parse(url).map_err(|e| TwitterError::Signing(format!("Invalid URL '{}': {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| TwitterError::Signing(format!("URL '{}' has no host", url)))?;

    let base_url = match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    };

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
        .collect();
    params.extend(
        oauth_params
            .iter()
            .map(|(key, value)| (percent_encode(key), percent_encode(value))),
    );
    params.sort();

    let parameter_string = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_url),
        percent_encode(&parameter_string)
    ))
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
pub(crate) fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn generate_nonce() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..NONCE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
