use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use crate::google::auth::{SCOPE_CALENDAR, ServiceAccountKey, access_token};

const EVENTS_URL: &str =
    "https://www.googleapis.com/calendar/v3/calendars/primary/events?conferenceDataVersion=1";

/// Insert a calendar event with an attached Meet conference and
/// return the join link. `start`/`end` are RFC3339 with offset.
pub async fn create_meet_event(
    http: &Client,
    key: &ServiceAccountKey,
    subject: &str,
    title: &str,
    start: &str,
    end: &str,
) -> Result<String> {
    let token = access_token(http, key, SCOPE_CALENDAR, Some(subject)).await?;
    let payload = json!({
        "summary": title,
        "start": {"dateTime": start},
        "end": {"dateTime": end},
        "conferenceData": {
            "createRequest": {
                "requestId": format!("discord-meet-{}", Uuid::new_v4()),
                "conferenceSolutionKey": {"type": "hangoutsMeet"},
            }
        },
    });
    let resp = http
        .post(EVENTS_URL)
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .context("calendar insert: request error")?;
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("calendar insert failed: {status} {body}");
    }
    let event: serde_json::Value =
        serde_json::from_str(&body).context("calendar insert: unexpected response shape")?;
    event["hangoutLink"]
        .as_str()
        .map(str::to_string)
        .context("calendar insert: event has no hangoutLink")
}
