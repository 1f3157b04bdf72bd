use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde_json::{Value, json};

const API_BASE: &str = "https://discord.com/api/v10";

async fn check(resp: reqwest::Response, what: &str) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("{what} failed: {status} {body}");
    }
    serde_json::from_str(&body).with_context(|| format!("{what}: non-JSON response"))
}

/// Post a message to a channel with the bot token. `payload` is the
/// full message object so callers control allowed_mentions and
/// components.
pub async fn post_message(
    http: &Client,
    bot_token: &str,
    channel_id: &str,
    payload: Value,
) -> Result<Value> {
    let url = format!("{API_BASE}/channels/{channel_id}/messages");
    let resp = http
        .post(&url)
        .header("Authorization", format!("Bot {bot_token}"))
        .json(&payload)
        .send()
        .await
        .context("post message: request error")?;
    check(resp, "post message").await
}

pub async fn edit_message(
    http: &Client,
    bot_token: &str,
    channel_id: &str,
    message_id: &str,
    payload: Value,
) -> Result<Value> {
    let url = format!("{API_BASE}/channels/{channel_id}/messages/{message_id}");
    let resp = http
        .patch(&url)
        .header("Authorization", format!("Bot {bot_token}"))
        .json(&payload)
        .send()
        .await
        .context("edit message: request error")?;
    check(resp, "edit message").await
}

pub async fn fetch_message(
    http: &Client,
    bot_token: &str,
    channel_id: &str,
    message_id: &str,
) -> Result<Value> {
    let url = format!("{API_BASE}/channels/{channel_id}/messages/{message_id}");
    let resp = http
        .get(&url)
        .header("Authorization", format!("Bot {bot_token}"))
        .send()
        .await
        .context("fetch message: request error")?;
    check(resp, "fetch message").await
}

/// Open (or reuse) the DM channel with a user.
pub async fn open_dm(http: &Client, bot_token: &str, user_id: &str) -> Result<String> {
    let url = format!("{API_BASE}/users/@me/channels");
    let resp = http
        .post(&url)
        .header("Authorization", format!("Bot {bot_token}"))
        .json(&json!({"recipient_id": user_id}))
        .send()
        .await
        .context("open dm: request error")?;
    let channel = check(resp, "open dm").await?;
    channel["id"]
        .as_str()
        .map(str::to_string)
        .context("open dm: response missing channel id")
}

pub async fn send_dm(
    http: &Client,
    bot_token: &str,
    user_id: &str,
    content: &str,
) -> Result<Value> {
    let channel_id = open_dm(http, bot_token, user_id).await?;
    post_message(http, bot_token, &channel_id, json!({"content": content})).await
}
