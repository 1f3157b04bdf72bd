use std::collections::BTreeSet;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde_json::Value;

use crate::google::auth::{SCOPE_REPORTS, ServiceAccountKey, access_token};

const ACTIVITIES_URL: &str =
    "https://admin.googleapis.com/admin/reports/v1/activity/users/all/applications/meet";

/// Distinct participant emails for a Meet code within the audit
/// window starting at `start_time` (RFC3339). Pages through the
/// reports API until nextPageToken runs out. Requires impersonating
/// the admin subject; the reports scope is not grantable to the
/// service account directly.
pub async fn meet_participants(
    http: &Client,
    key: &ServiceAccountKey,
    subject: &str,
    meet_code: &str,
    start_time: &str,
) -> Result<Vec<String>> {
    let token = access_token(http, key, SCOPE_REPORTS, Some(subject)).await?;
    let filter = format!("meeting_code=={meet_code}");

    let mut emails = BTreeSet::new();
    let mut page_token: Option<String> = None;
    loop {
        let mut query: Vec<(&str, &str)> = vec![
            ("startTime", start_time),
            ("maxResults", "1000"),
            ("filters", &filter),
        ];
        if let Some(token) = page_token.as_deref() {
            query.push(("pageToken", token));
        }
        let resp = http
            .get(ACTIVITIES_URL)
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await
            .context("meet audit: request error")?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("meet audit failed: {status} {body}");
        }
        let page: Value =
            serde_json::from_str(&body).context("meet audit: unexpected response shape")?;

        collect_emails(&page, &mut emails);

        match page["nextPageToken"].as_str() {
            Some(next) if !next.is_empty() => page_token = Some(next.to_string()),
            _ => break,
        }
    }
    Ok(emails.into_iter().collect())
}

fn collect_emails(page: &Value, emails: &mut BTreeSet<String>) {
    let Some(items) = page["items"].as_array() else {
        return;
    };
    for item in items {
        let Some(events) = item["events"].as_array() else {
            continue;
        };
        for event in events {
            let Some(params) = event["parameters"].as_array() else {
                continue;
            };
            for param in params {
                let name = param["name"].as_str().unwrap_or("");
                if name.eq_ignore_ascii_case("participant_email")
                    || name.eq_ignore_ascii_case("organizer_email")
                {
                    if let Some(email) = param["value"].as_str() {
                        let email = email.trim().to_lowercase();
                        if !email.is_empty() {
                            emails.insert(email);
                        }
                    }
                }
            }
        }
    }
}
