use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::interactions::Ctx;
use crate::discord::interaction::Interaction;
use crate::discord::response::InteractionResponse;
use crate::google::calendar::create_meet_event;
use crate::google::reports::meet_participants;

const DEFAULT_AUDIT_HOURS: i64 = 72;

static MEET_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:meet\.google\.com/)?([a-z]{3}-[a-z]{4}-[a-z]{3})\b")
        .expect("meet code pattern")
});

/// Accepts a full meet.google.com link or a bare xxx-xxxx-xxx code;
/// the reports filter wants the lowercase dashed form.
fn extract_meet_code(input: &str) -> Option<String> {
    MEET_CODE
        .captures(input.trim())
        .map(|caps| caps[1].to_lowercase())
}

pub async fn schedule_meet(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let title = interaction.option_str("title");
    let start = interaction.option_str("start");
    let end = interaction.option_str("end");
    let (Some(title), Some(start), Some(end)) = (title, start, end) else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Missing required fields (title/start/end).",
        ));
    };

    let link = create_meet_event(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.admin_subject,
        &title,
        &start,
        &end,
    )
    .await
    .context("scheduling Meet")?;

    // Visible to the whole channel so invitees can grab the link.
    Ok(InteractionResponse::message(format!(
        "✅ **Google Meet Scheduled!**\n\
         📅 **{title}**\n\
         🕒 {start} → {end}\n\
         🔗 {link}"
    )))
}

pub async fn audit_meet(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let link = interaction.option_str("meetlink").unwrap_or_default();
    let Some(code) = extract_meet_code(&link) else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Please provide a valid Google Meet link or code (e.g., https://meet.google.com/abc-defg-hij).",
        ));
    };
    let hours = interaction
        .option_f64("hours")
        .map(|h| h as i64)
        .unwrap_or(DEFAULT_AUDIT_HOURS)
        .max(1);

    let start_time = (Utc::now() - Duration::hours(hours))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();
    let emails = meet_participants(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.admin_subject,
        &code,
        &start_time,
    )
    .await
    .context("auditing Meet attendance")?;

    if emails.is_empty() {
        return Ok(InteractionResponse::ephemeral(format!(
            "ℹ️ No attendees found for meeting `{code}` in the last {hours}h window."
        )));
    }

    let lines: Vec<String> = emails
        .iter()
        .enumerate()
        .map(|(i, email)| format!("{}. {email}", i + 1))
        .collect();
    Ok(InteractionResponse::ephemeral(format!(
        "👥 **Meet attendance (unique emails)**\n\
         🧩 Code: `{code}`  •  ⏱️ Window: last {hours}h\n\n{}",
        lines.join("\n")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_extracts_from_full_link() {
        assert_eq!(
            extract_meet_code("https://meet.google.com/abc-defg-hij"),
            Some("abc-defg-hij".to_string())
        );
    }

    #[test]
    fn code_extracts_from_bare_code_any_case() {
        assert_eq!(
            extract_meet_code("  ABC-DEFG-HIJ "),
            Some("abc-defg-hij".to_string())
        );
    }

    #[test]
    fn code_rejects_other_urls() {
        assert_eq!(extract_meet_code("https://zoom.us/j/123456"), None);
        assert_eq!(extract_meet_code(""), None);
        assert_eq!(extract_meet_code("abc-defg"), None);
    }
}
