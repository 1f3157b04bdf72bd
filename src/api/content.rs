use anyhow::{Context, Result};
use serde_json::json;
use tracing::warn;

use crate::api::interactions::Ctx;
use crate::discord::interaction::Interaction;
use crate::discord::rest;
use crate::discord::response::{InteractionResponse, approve_reject_row, text_input};
use crate::google::sheets::{self, ValueInput};
use crate::model::content::{
    ReviewCard, ReviewKind, decision_row, format_asset_card, format_content_card, parse_review_card,
};
use crate::model::decision::{Decision, status_line};
use crate::utils::dates::ist_timestamp;

const CONTENT_DECISIONS_RANGE: &str = "'Content Decisions'!A:H";
const ASSET_DECISIONS_RANGE: &str = "'Asset Decisions'!A:H";

fn decisions_range(kind: ReviewKind) -> &'static str {
    match kind {
        ReviewKind::Content => CONTENT_DECISIONS_RANGE,
        ReviewKind::Asset => ASSET_DECISIONS_RANGE,
    }
}

fn button_ids(kind: ReviewKind) -> (&'static str, &'static str) {
    match kind {
        ReviewKind::Content => ("cr_approve", "cr_reject"),
        ReviewKind::Asset => ("ar_approve", "ar_reject"),
    }
}

pub async fn review_request_command(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    kind: ReviewKind,
) -> Result<InteractionResponse> {
    let requester = interaction.invoker().name;
    let (subject, attachment) = match kind {
        ReviewKind::Content => (interaction.option_str("topic"), interaction.attachment("file")),
        ReviewKind::Asset => (interaction.option_str("name"), interaction.attachment("file")),
    };
    let (Some(subject), Some(file)) = (subject, attachment) else {
        let hint = match kind {
            ReviewKind::Content => "❌ Provide a **topic** and attach a **file**.",
            ReviewKind::Asset => "❌ Provide a **name** and attach a **file**.",
        };
        return Ok(InteractionResponse::ephemeral(hint));
    };

    let card = match kind {
        ReviewKind::Content => format_content_card(&requester, &subject, &file.filename, &file.url),
        ReviewKind::Asset => format_asset_card(&requester, &subject, &file.filename, &file.url),
    };

    let configured = match kind {
        ReviewKind::Content => ctx.config.content_requests_channel_id.as_str(),
        ReviewKind::Asset => ctx.config.assets_reviews_channel_id.as_str(),
    };
    let origin = interaction.channel_id.clone().unwrap_or_default();
    let channel = if configured.is_empty() { origin.as_str() } else { configured };
    if channel.is_empty() {
        return Ok(InteractionResponse::ephemeral(
            "❌ No review channel is configured.",
        ));
    }

    let (approve_id, reject_id) = button_ids(kind);
    rest::post_message(
        ctx.http,
        &ctx.config.bot_token,
        channel,
        json!({
            "content": card,
            "components": [approve_reject_row(approve_id, reject_id, false)],
        }),
    )
    .await
    .context("posting review card")?;

    let ack = match kind {
        ReviewKind::Content => "✅ Sent to **#content-requests** for review.",
        ReviewKind::Asset => "✅ Sent to **#assets-reviews** for verification.",
    };
    Ok(InteractionResponse::ephemeral(ack))
}

/// Both decisions collect a note first; approvals carry improvement
/// comments, rejections carry the reason.
pub fn decision_prompt(
    interaction: &Interaction,
    kind: ReviewKind,
    approve: bool,
) -> Result<InteractionResponse> {
    let channel_id = interaction.channel_id.clone().unwrap_or_default();
    let message_id = interaction
        .message
        .as_ref()
        .map(|m| m.id.clone())
        .unwrap_or_default();
    let (custom_id, title) = modal_spec(kind, approve, &channel_id, &message_id);
    let label = if approve {
        "Improvement comments"
    } else {
        "Rejection comments"
    };
    Ok(InteractionResponse::Modal {
        custom_id,
        title,
        components: vec![text_input(
            "comments",
            label,
            true,
            true,
            Some(1000),
            Some("Write your feedback here"),
        )],
    })
}

fn modal_spec(
    kind: ReviewKind,
    approve: bool,
    channel_id: &str,
    message_id: &str,
) -> (String, String) {
    let prefix = match kind {
        ReviewKind::Content => "cr",
        ReviewKind::Asset => "ar",
    };
    let verb = if approve { "approve" } else { "reject" };
    let title = match (kind, approve) {
        (ReviewKind::Content, true) => "Approve Content (add improvement notes)",
        (ReviewKind::Content, false) => "Reject Content (add reason)",
        (ReviewKind::Asset, true) => "Approve Asset (add improvement notes)",
        (ReviewKind::Asset, false) => "Reject Asset (add reason)",
    };
    (
        format!("{prefix}_{verb}_reason::{channel_id}::{message_id}"),
        title.to_string(),
    )
}

pub async fn decision_modal(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    kind: ReviewKind,
    approve: bool,
    channel_id: &str,
    message_id: &str,
) -> Result<InteractionResponse> {
    if channel_id.is_empty() || message_id.is_empty() {
        return Ok(InteractionResponse::ephemeral("❌ Missing context."));
    }
    let message = rest::fetch_message(ctx.http, &ctx.config.bot_token, channel_id, message_id)
        .await
        .context("loading review card")?;
    let content = message["content"].as_str().unwrap_or_default().to_string();
    let Some(card) = parse_review_card(kind, &content) else {
        return Ok(InteractionResponse::ephemeral("❌ Could not parse the review card."));
    };

    let comment = interaction.modal_value("comments").unwrap_or_default();
    let decision = Decision::from_approve(approve);
    let reviewer = interaction.invoker().name;
    let stamp = ist_timestamp();

    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        decisions_range(kind),
        decision_row(&stamp, decision, &reviewer, &card, &comment),
        ValueInput::UserEntered,
    )
    .await
    .context("recording review decision")?;

    let mut new_content = format!("{content}{}", status_line(decision, &reviewer, &stamp));
    if !comment.is_empty() {
        new_content.push_str(&format!("\n📝 **Comments:** {comment}"));
    }
    let (approve_id, reject_id) = button_ids(kind);
    let edit = json!({
        "content": new_content,
        "components": [approve_reject_row(approve_id, reject_id, true)],
    });
    if let Err(e) =
        rest::edit_message(ctx.http, &ctx.config.bot_token, channel_id, message_id, edit).await
    {
        warn!(error = format!("{e:#}"), "disabling review card failed");
    }

    spawn_team_notify(ctx, kind, decision, reviewer, card, comment);

    Ok(InteractionResponse::ephemeral("✅ Decision recorded."))
}

fn notify_text(
    kind: ReviewKind,
    decision: Decision,
    reviewer: &str,
    card: &ReviewCard,
    comment: &str,
) -> String {
    let (header, subject_label) = match kind {
        ReviewKind::Content => ("Content Request Decision", "📌 **Topic:**"),
        ReviewKind::Asset => ("Asset Review Decision", "🏷️ **Asset:**"),
    };
    let mut text = format!(
        "📣 **{header}**\n\
         🧑‍💼 **Reviewer:** {reviewer}\n\
         {} **Decision:** {decision}",
        decision.icon()
    );
    if !comment.is_empty() {
        text.push_str(&format!("\n📝 **Comments:** {comment}"));
    }
    text.push_str(&format!("\n👤 **Requester:** {}", card.requester));
    text.push_str(&format!("\n{subject_label} {}", card.subject));
    if !card.filename.is_empty() {
        text.push_str(&format!("\n📎 **File:** [{}]({})", card.filename, card.file_url));
    }
    text
}

fn spawn_team_notify(
    ctx: &Ctx<'_>,
    kind: ReviewKind,
    decision: Decision,
    reviewer: String,
    card: ReviewCard,
    comment: String,
) {
    if ctx.config.content_team_channel_id.is_empty() {
        return;
    }
    let config = ctx.config.clone();
    let http = ctx.http.clone();
    actix_web::rt::spawn(async move {
        let content = notify_text(kind, decision, &reviewer, &card, &comment);
        if let Err(e) = rest::post_message(
            &http,
            &config.bot_token,
            &config.content_team_channel_id,
            json!({"content": content}),
        )
        .await
        {
            warn!(error = format!("{e:#}"), "review decision notify failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_ids_encode_kind_verb_and_message_ref() {
        let (id, title) = modal_spec(ReviewKind::Content, true, "c1", "m1");
        assert_eq!(id, "cr_approve_reason::c1::m1");
        assert_eq!(title, "Approve Content (add improvement notes)");

        let (id, title) = modal_spec(ReviewKind::Asset, false, "c2", "m2");
        assert_eq!(id, "ar_reject_reason::c2::m2");
        assert_eq!(title, "Reject Asset (add reason)");
    }

    #[test]
    fn notify_text_varies_by_kind_and_comment() {
        let card = ReviewCard {
            requester: "Zoya".into(),
            subject: "Q2 newsletter".into(),
            filename: "brief.pdf".into(),
            file_url: "https://cdn.example/brief.pdf".into(),
        };
        let approved = notify_text(ReviewKind::Content, Decision::Approved, "Priya", &card, "");
        assert!(approved.starts_with("📣 **Content Request Decision**"));
        assert!(approved.contains("✅ **Decision:** Approved"));
        assert!(approved.contains("📌 **Topic:** Q2 newsletter"));
        assert!(approved.contains("[brief.pdf](https://cdn.example/brief.pdf)"));
        assert!(!approved.contains("**Comments:**"));

        let card = ReviewCard {
            requester: "Arun".into(),
            subject: "hero-banner".into(),
            filename: String::new(),
            file_url: String::new(),
        };
        let rejected = notify_text(ReviewKind::Asset, Decision::Rejected, "Priya", &card, "wrong size");
        assert!(rejected.starts_with("📣 **Asset Review Decision**"));
        assert!(rejected.contains("❌ **Decision:** Rejected"));
        assert!(rejected.contains("🏷️ **Asset:** hero-banner"));
        assert!(rejected.contains("📝 **Comments:** wrong size"));
        assert!(!rejected.contains("**File:**"));
    }
}
