//! Twitter Reply Script
//!
//! This script posts a reply to a tweet using the OAuth 1.0a credentials from the
//! environment. It prompts for the tweet ID and the reply text.

use std::io::{self, Write};

use xcontext::{TwitterClient, TwitterConfig, TwitterError};

/// Twitter's limit for a single tweet
const MAX_TWEET_CHARS: usize = 280;

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    println!("🐦 Twitter Reply Tool");
    println!("=====================");

    let config = TwitterConfig::from_env()?;
    let client = TwitterClient::new(config);

    let tweet_id = prompt("🔗 Enter the ID of the tweet to reply to: ")?;
    if tweet_id.is_empty() || !tweet_id.chars().all(|c| c.is_ascii_digit()) {
        println!("❌ Tweet ID must be a non-empty number!");
        return Err("A numeric tweet ID is required".into());
    }

    let reply_text = prompt("📝 Enter your reply: ")?;
    if reply_text.is_empty() {
        println!("❌ Reply cannot be empty!");
        return Err("Reply text is required".into());
    }

    let length = reply_text.chars().count();
    if length > MAX_TWEET_CHARS {
        println!(
            "❌ Reply is too long! {} characters (max {})",
            length, MAX_TWEET_CHARS
        );
        return Err("Reply exceeds 280 character limit".into());
    }
    println!("📏 Reply length: {} characters", length);

    println!("\n🚀 Posting your reply...");
    match client.reply_to_tweet(&tweet_id, &reply_text).await {
        Ok(response) => {
            println!("\n🎉 Success! Your reply has been posted.");
            println!("🆔 Reply ID: {}", response.data.id);
            println!("📄 Text: {}", response.data.text);
        }
        Err(e @ TwitterError::RateLimitExceeded { .. }) => {
            println!("\n⏳ {}", e);
            return Err(e.into());
        }
        Err(e) => {
            println!("\n💥 Failed to post reply: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
