use anyhow::{Context, Result};
use serde_json::json;
use tracing::warn;

use crate::api::interactions::Ctx;
use crate::discord::interaction::Interaction;
use crate::discord::rest;
use crate::discord::response::{InteractionResponse, approve_reject_row, text_input};
use crate::google::sheets::{self, ValueInput};
use crate::model::decision::{Decision, status_line};
use crate::model::wfh::{ParsedWfhCard, decision_row, format_wfh_card, parse_wfh_card, request_row};
use crate::utils::dates::{ist_timestamp, parse_ymd};

const REQUESTS_RANGE: &str = "'WFH Requests'!A:D";
const DECISIONS_RANGE: &str = "'WFH Decisions'!A:G";

/// `/wfh` collects both fields in one modal instead of a picker
/// chain; a single day needs no From/To dance.
pub fn wfh_command() -> Result<InteractionResponse> {
    Ok(InteractionResponse::Modal {
        custom_id: "wfh_modal".into(),
        title: "Work From Home Request".into(),
        components: vec![
            text_input(
                "wfh_date",
                "Date (YYYY-MM-DD)",
                false,
                true,
                Some(10),
                Some("e.g., 2025-03-14"),
            ),
            text_input("wfh_reason", "Reason (optional)", true, false, Some(1000), None),
        ],
    })
}

pub async fn request_modal(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let day = interaction.modal_value("wfh_date").unwrap_or_default();
    if parse_ymd(&day).is_none() {
        return Ok(InteractionResponse::ephemeral(
            "❌ Please provide the date as **YYYY-MM-DD**.",
        ));
    }
    let reason = interaction.modal_value("wfh_reason").unwrap_or_default();
    let name = interaction.invoker().name;

    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        REQUESTS_RANGE,
        request_row(&ist_timestamp(), &name, &day, &reason),
        ValueInput::UserEntered,
    )
    .await
    .context("recording WFH request")?;

    spawn_approver_notify(ctx, interaction, format_wfh_card(&name, &day, &reason));

    let shown_reason = if reason.is_empty() {
        "(not provided)".to_string()
    } else {
        reason
    };
    Ok(InteractionResponse::ephemeral(format!(
        "✅ WFH request submitted for **{day}**.\nReason: {shown_reason}"
    )))
}

fn spawn_approver_notify(ctx: &Ctx<'_>, interaction: &Interaction, card: String) {
    let config = ctx.config.clone();
    let http = ctx.http.clone();
    let origin = interaction.channel_id.clone().unwrap_or_default();
    actix_web::rt::spawn(async move {
        let payload = json!({
            "content": card,
            "components": [approve_reject_row("wfh_approve", "wfh_reject", false)],
        });
        let result = if !config.approver_channel_id.is_empty() {
            rest::post_message(&http, &config.bot_token, &config.approver_channel_id, payload).await
        } else if !config.approver_user_id.is_empty() {
            match rest::open_dm(&http, &config.bot_token, &config.approver_user_id).await {
                Ok(dm) => rest::post_message(&http, &config.bot_token, &dm, payload).await,
                Err(e) => Err(e),
            }
        } else if !origin.is_empty() {
            rest::post_message(&http, &config.bot_token, &origin, payload).await
        } else {
            return;
        };
        if let Err(e) = result {
            warn!(error = format!("{e:#}"), "WFH approver notification failed");
        }
    });
}

pub async fn approve(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let content = interaction
        .message
        .as_ref()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    let Some(card) = parse_wfh_card(&content) else {
        return Ok(InteractionResponse::ephemeral("❌ Could not parse WFH request."));
    };

    let reviewer = interaction.invoker().name;
    let stamp = ist_timestamp();
    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        DECISIONS_RANGE,
        decision_row(&stamp, &card.name, &card.day, &card.reason, Decision::Approved, &reviewer, ""),
        ValueInput::Raw,
    )
    .await
    .context("recording WFH decision")?;

    spawn_status_update(ctx, interaction, card, Decision::Approved, reviewer.clone(), None);

    Ok(InteractionResponse::UpdateMessage {
        content: format!("{content}{}", status_line(Decision::Approved, &reviewer, &stamp)),
        components: vec![approve_reject_row("wfh_approve", "wfh_reject", true)],
    })
}

pub fn reject_prompt(interaction: &Interaction) -> Result<InteractionResponse> {
    let channel_id = interaction.channel_id.clone().unwrap_or_default();
    let message_id = interaction
        .message
        .as_ref()
        .map(|m| m.id.clone())
        .unwrap_or_default();
    Ok(InteractionResponse::Modal {
        custom_id: format!("wfh_reject_reason::{channel_id}::{message_id}"),
        title: "Reject WFH".into(),
        components: vec![text_input(
            "reject_reason",
            "Reason for rejection",
            true,
            true,
            Some(1000),
            Some("Enter the reason for rejection"),
        )],
    })
}

pub async fn reject_modal(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    channel_id: &str,
    message_id: &str,
) -> Result<InteractionResponse> {
    if channel_id.is_empty() || message_id.is_empty() {
        return Ok(InteractionResponse::ephemeral(
            "❌ Missing context to complete WFH rejection.",
        ));
    }
    let message = rest::fetch_message(ctx.http, &ctx.config.bot_token, channel_id, message_id)
        .await
        .context("loading original WFH message")?;
    let content = message["content"].as_str().unwrap_or_default().to_string();
    let Some(card) = parse_wfh_card(&content) else {
        return Ok(InteractionResponse::ephemeral("❌ Could not parse WFH request."));
    };

    let note = interaction.modal_value("reject_reason").unwrap_or_default();
    let reviewer = interaction.invoker().name;
    let stamp = ist_timestamp();
    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        DECISIONS_RANGE,
        decision_row(
            &stamp,
            &card.name,
            &card.day,
            &card.reason,
            Decision::Rejected,
            &reviewer,
            &note,
        ),
        ValueInput::Raw,
    )
    .await
    .context("recording WFH rejection")?;

    let mut new_content = format!("{content}{}", status_line(Decision::Rejected, &reviewer, &stamp));
    if !note.is_empty() {
        new_content.push_str(&format!("\n📝 **Rejection Note:** {note}"));
    }
    let edit = json!({
        "content": new_content,
        "components": [approve_reject_row("wfh_approve", "wfh_reject", true)],
    });
    if let Err(e) =
        rest::edit_message(ctx.http, &ctx.config.bot_token, channel_id, message_id, edit).await
    {
        warn!(error = format!("{e:#}"), "disabling WFH card failed");
    }

    let note_for_status = if note.is_empty() { None } else { Some(note) };
    spawn_status_update(ctx, interaction, card, Decision::Rejected, reviewer, note_for_status);

    Ok(InteractionResponse::ephemeral("✅ WFH rejection recorded."))
}

fn status_text(
    decision: Decision,
    name: &str,
    day: &str,
    reason: &str,
    reviewer: &str,
    stamp: &str,
) -> String {
    let icon = if decision.is_approved() { "🏠✅" } else { "🏠❌" };
    format!(
        "{icon} **WFH {decision}**\n\
         👤 **Employee:** {name}\n\
         📅 **Date:** {day}\n\
         💬 **Reason:** {reason}\n\
         🧑‍💼 **Reviewer:** {reviewer} — **{stamp} IST**"
    )
}

fn spawn_status_update(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    card: ParsedWfhCard,
    decision: Decision,
    reviewer: String,
    note: Option<String>,
) {
    let config = ctx.config.clone();
    let http = ctx.http.clone();
    let origin = interaction.channel_id.clone().unwrap_or_default();
    actix_web::rt::spawn(async move {
        let channel = [
            config.leave_status_channel_id.as_str(),
            config.approver_channel_id.as_str(),
            origin.as_str(),
        ]
        .into_iter()
        .find(|c| !c.is_empty())
        .map(str::to_string);
        let Some(channel) = channel else {
            return;
        };

        let mut reason = card.reason.clone();
        if let Some(note) = &note {
            reason = format!("{reason} | Rejection Note: {note}");
        }
        let content = status_text(decision, &card.name, &card.day, &reason, &reviewer, &ist_timestamp());
        if let Err(e) =
            rest::post_message(&http, &config.bot_token, &channel, json!({"content": content})).await
        {
            warn!(error = format!("{e:#}"), "WFH status post failed");
        }
    });
}
