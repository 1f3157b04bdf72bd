use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use crate::api::interactions::Ctx;
use crate::discord::interaction::Interaction;
use crate::discord::rest;
use crate::discord::response::{
    InteractionResponse, approve_reject_row, select_option, string_select, text_input,
};
use crate::google::sheets::{self, ValueInput};
use crate::model::attendance::names_in_range;
use crate::model::decision::{Decision, status_line};
use crate::model::leave::{LeaveRequest, approved_in_window, decision_row, format_leave_card,
    parse_leave_card};
use crate::utils::dates::{ist_timestamp, month_bounds_ist, now_ist, parse_ymd, today_ist};

const REQUESTS_RANGE: &str = "'Leave Requests'!A:F";
const DECISIONS_RANGE: &str = "'Leave Decisions'!A:H";
const ATTENDANCE_RANGE: &str = "Attendance!A:E";

/// Discord caps a string select at 25 options.
const PICKER_DAYS: i64 = 25;

fn date_options(start: NaiveDate, days: i64) -> Vec<Value> {
    (0..days.clamp(0, PICKER_DAYS))
        .map(|i| {
            let d = start + Duration::days(i);
            select_option(&format!("{d} ({})", d.format("%a")), &d.to_string())
        })
        .collect()
}

/// `/leaverequest` opens the From picker; the To picker and the
/// reason modal follow from component submissions.
pub fn leave_request_command() -> Result<InteractionResponse> {
    Ok(InteractionResponse::ephemeral_with_components(
        "📅 Pick the **start** date for your leave:",
        vec![string_select(
            "leave_from_select",
            "Select start date (From)",
            date_options(today_ist(), PICKER_DAYS),
        )],
    ))
}

pub fn from_selected(interaction: &Interaction) -> Result<InteractionResponse> {
    let Some(from) = interaction.select_value() else {
        return Ok(InteractionResponse::ephemeral("❌ No start date selected."));
    };
    let Some(from_date) = parse_ymd(from) else {
        return Ok(InteractionResponse::ephemeral("❌ No start date selected."));
    };
    Ok(InteractionResponse::UpdateMessage {
        content: format!("📅 From: **{from}**\nNow pick the **end** date:"),
        components: vec![string_select(
            &format!("leave_to_select::{from}"),
            "Select end date (To)",
            date_options(from_date, PICKER_DAYS),
        )],
    })
}

pub fn to_selected(interaction: &Interaction, from: &str) -> Result<InteractionResponse> {
    let Some(to) = interaction.select_value() else {
        return Ok(InteractionResponse::ephemeral("❌ No end date selected."));
    };
    Ok(InteractionResponse::Modal {
        custom_id: format!("leave_reason::{from}::{to}"),
        title: "Leave Details".into(),
        components: vec![text_input(
            "leave_reason_text",
            "Reason (optional)",
            true,
            false,
            Some(1000),
            None,
        )],
    })
}

/// Reason modal submission closes the picker flow: the request gets
/// its id, lands in the sheet, and the approver card goes out.
pub async fn reason_modal(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    from: &str,
    to: &str,
) -> Result<InteractionResponse> {
    let (Some(from), Some(to)) = (parse_ymd(from), parse_ymd(to)) else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Could not parse the selected dates.",
        ));
    };
    if to < from {
        return Ok(InteractionResponse::ephemeral(
            "❌ End date can't be before the start date.",
        ));
    }

    let invoker = interaction.invoker();
    let request = LeaveRequest {
        id: Uuid::new_v4().to_string(),
        user_id: invoker.id,
        user_name: invoker.name,
        from,
        to,
        reason: interaction.modal_value("leave_reason_text").unwrap_or_default(),
    };
    let days = request.days();

    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        REQUESTS_RANGE,
        request.to_row(),
        ValueInput::Raw,
    )
    .await
    .context("recording leave request")?;

    let card = format_leave_card(&request.user_name, from, to, days, &request.reason);
    let buttons = approve_reject_row(
        &format!("leave_approve::{}", request.id),
        &format!("leave_reject::{}", request.id),
        false,
    );
    spawn_approver_notify(ctx, interaction, card, buttons);

    Ok(InteractionResponse::ephemeral(format!(
        "✅ Leave requested for **{from} → {to}**."
    )))
}

/// Where the request card goes: the approver channel, else a DM to
/// the approver, else back to the invoking channel.
fn spawn_approver_notify(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    card: String,
    buttons: Value,
) {
    let config = ctx.config.clone();
    let http = ctx.http.clone();
    let origin = interaction.channel_id.clone().unwrap_or_default();
    actix_web::rt::spawn(async move {
        let payload = json!({"content": card, "components": [buttons]});
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
            warn!(error = format!("{e:#}"), "approver notification failed");
        }
    });
}

/// Resolved request fields, whichever of the sheet row or the card
/// text supplied them.
struct ResolvedRequest {
    user_id: String,
    name: String,
    from: NaiveDate,
    to: NaiveDate,
    reason: String,
    days: i64,
}

async fn resolve_request(
    ctx: &Ctx<'_>,
    request_id: Option<&str>,
    card_content: &str,
) -> Option<ResolvedRequest> {
    if let Some(id) = request_id {
        let rows = sheets::read_range(
            ctx.http,
            &ctx.config.service_account,
            &ctx.config.sheet_id,
            REQUESTS_RANGE,
        )
        .await
        .map_err(|e| warn!(error = format!("{e:#}"), "leave request lookup failed"))
        .ok()?;
        if let Some(req) = LeaveRequest::find(&rows, id) {
            return Some(ResolvedRequest {
                user_id: req.user_id.clone(),
                name: req.user_name.clone(),
                from: req.from,
                to: req.to,
                reason: req.reason.clone(),
                days: req.days(),
            });
        }
    }
    let parsed = parse_leave_card(card_content)?;
    let days = (parsed.to - parsed.from).num_days() + 1;
    Some(ResolvedRequest {
        user_id: String::new(),
        name: parsed.name,
        from: parsed.from,
        to: parsed.to,
        reason: parsed.reason,
        days,
    })
}

fn disabled_buttons(request_id: Option<&str>) -> Value {
    match request_id {
        Some(id) => approve_reject_row(
            &format!("leave_approve::{id}"),
            &format!("leave_reject::{id}"),
            true,
        ),
        None => approve_reject_row("leave_approve", "leave_reject", true),
    }
}

pub async fn approve(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    request_id: Option<&str>,
) -> Result<InteractionResponse> {
    let content = interaction
        .message
        .as_ref()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    let Some(request) = resolve_request(ctx, request_id, &content).await else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Could not parse the request details.",
        ));
    };

    let reviewer = interaction.invoker().name;
    let stamp = ist_timestamp();
    let row = decision_row(
        &stamp,
        &request.name,
        request.from,
        request.to,
        &request.reason,
        Decision::Approved,
        &reviewer,
        request.days,
    );
    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        DECISIONS_RANGE,
        row,
        ValueInput::UserEntered,
    )
    .await
    .context("recording leave decision")?;

    spawn_status_update(ctx, interaction, request, Decision::Approved, reviewer.clone(), None);

    Ok(InteractionResponse::UpdateMessage {
        content: format!("{content}{}", status_line(Decision::Approved, &reviewer, &stamp)),
        components: vec![disabled_buttons(request_id)],
    })
}

pub fn reject_prompt(
    interaction: &Interaction,
    request_id: Option<&str>,
) -> Result<InteractionResponse> {
    let channel_id = interaction.channel_id.clone().unwrap_or_default();
    let message_id = interaction
        .message
        .as_ref()
        .map(|m| m.id.clone())
        .unwrap_or_default();
    let custom_id = match request_id {
        Some(id) => format!("reject_reason::{channel_id}::{message_id}::{id}"),
        None => format!("reject_reason::{channel_id}::{message_id}"),
    };
    Ok(InteractionResponse::Modal {
        custom_id,
        title: "Reject Leave".into(),
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
    request_id: Option<&str>,
) -> Result<InteractionResponse> {
    if channel_id.is_empty() || message_id.is_empty() {
        return Ok(InteractionResponse::ephemeral(
            "❌ Missing context to complete rejection.",
        ));
    }
    let message = rest::fetch_message(ctx.http, &ctx.config.bot_token, channel_id, message_id)
        .await
        .context("loading original message")?;
    let content = message["content"].as_str().unwrap_or_default().to_string();

    let Some(request) = resolve_request(ctx, request_id, &content).await else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Could not parse the request details.",
        ));
    };

    let note = interaction.modal_value("reject_reason").unwrap_or_default();
    let reviewer = interaction.invoker().name;
    let stamp = ist_timestamp();
    let row = decision_row(
        &stamp,
        &request.name,
        request.from,
        request.to,
        &request.reason,
        Decision::Rejected,
        &reviewer,
        request.days,
    );
    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        DECISIONS_RANGE,
        row,
        ValueInput::UserEntered,
    )
    .await
    .context("recording leave decision")?;

    let mut new_content = format!("{content}{}", status_line(Decision::Rejected, &reviewer, &stamp));
    if !note.is_empty() {
        new_content.push_str(&format!("\n📝 **Rejection Note:** {note}"));
    }
    let edit = json!({
        "content": new_content,
        "components": [disabled_buttons(request_id)],
    });
    if let Err(e) =
        rest::edit_message(ctx.http, &ctx.config.bot_token, channel_id, message_id, edit).await
    {
        warn!(error = format!("{e:#}"), "disabling leave card failed");
    }

    let note_for_status = if note.is_empty() { None } else { Some(note) };
    spawn_status_update(ctx, interaction, request, Decision::Rejected, reviewer, note_for_status);

    Ok(InteractionResponse::ephemeral("✅ Rejection recorded."))
}

fn status_text(
    decision: Decision,
    name: &str,
    from: NaiveDate,
    to: NaiveDate,
    reason: &str,
    reviewer: &str,
    stamp: &str,
) -> String {
    format!(
        "{} **Leave {decision}**\n\
         👤 **Employee:** {name}\n\
         🗓️ **From:** {from}\n\
         🗓️ **To:** {to}\n\
         💬 **Reason:** {reason}\n\
         🧑‍💼 **Reviewer:** {reviewer} — **{stamp} IST**",
        decision.icon()
    )
}

/// Status broadcast plus a DM receipt to the requester when the sheet
/// row carried their user id.
fn spawn_status_update(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    request: ResolvedRequest,
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

        let mut reason = request.reason.clone();
        if let Some(note) = &note {
            reason = format!("{reason} | Rejection Note: {note}");
        }
        if let Some(channel) = channel {
            let content = status_text(
                decision,
                &request.name,
                request.from,
                request.to,
                &reason,
                &reviewer,
                &ist_timestamp(),
            );
            if let Err(e) =
                rest::post_message(&http, &config.bot_token, &channel, json!({"content": content}))
                    .await
            {
                warn!(error = format!("{e:#}"), "leave status post failed");
            }
        }

        if !request.user_id.is_empty() {
            let mut dm = format!(
                "{} Your leave request for **{} → {}** was **{decision}** by **{reviewer}**.",
                decision.icon(),
                request.from,
                request.to
            );
            if let Some(note) = &note {
                dm.push_str(&format!("\n📝 **Rejection Note:** {note}"));
            }
            if let Err(e) = rest::send_dm(&http, &config.bot_token, &request.user_id, &dm).await {
                warn!(error = format!("{e:#}"), "leave DM failed");
            }
        }
    });
}

/// `/leavecount` sums the Days column of approved decisions touching
/// the current IST month.
pub async fn leave_count_command(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
) -> Result<InteractionResponse> {
    let target = interaction
        .option_str("name")
        .unwrap_or_else(|| interaction.invoker().name);
    let rows = sheets::read_range(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        DECISIONS_RANGE,
    )
    .await
    .context("reading leave decisions")?;

    let (start, end) = month_bounds_ist();
    let (items, total) = approved_in_window(&rows, &target, start, end);
    let month_label = now_ist().format("%B %Y");

    if items.is_empty() {
        return Ok(InteractionResponse::ephemeral(format!(
            "📊 **Approved leaves in {month_label}** for **{target}**\n(No entries)\n**Total days:** 0"
        )));
    }

    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let plural = if item.days == 1 { "" } else { "s" };
            format!("{}. {} → {} — {} day{plural}", i + 1, item.from, item.to, item.days)
        })
        .collect();
    Ok(InteractionResponse::ephemeral(format!(
        "📊 **Approved leaves in {month_label}** for **{target}**\n{}\n\n**Total days:** {total}",
        lines.join("\n")
    )))
}

/// Autocomplete for `/leavecount name`: everyone seen in this month's
/// attendance, filtered by the typed prefix.
pub async fn name_choices(ctx: &Ctx<'_>, query: &str) -> Result<Vec<(String, String)>> {
    let rows = sheets::read_range(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        ATTENDANCE_RANGE,
    )
    .await
    .context("reading attendance sheet")?;
    let (start, end) = month_bounds_ist();
    let q = query.trim().to_lowercase();
    Ok(names_in_range(&rows, start, end)
        .into_iter()
        .filter(|name| q.is_empty() || name.to_lowercase().contains(&q))
        .map(|name| (name.clone(), name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_options_label_iso_and_weekday() {
        let opts = date_options(d(2025, 3, 1), 3);
        assert_eq!(opts.len(), 3);
        assert_eq!(opts[0]["label"], "2025-03-01 (Sat)");
        assert_eq!(opts[0]["value"], "2025-03-01");
        assert_eq!(opts[2]["value"], "2025-03-03");
    }

    #[test]
    fn date_options_clamp_to_select_limit() {
        assert_eq!(date_options(d(2025, 3, 1), 40).len(), 25);
        assert!(date_options(d(2025, 3, 1), -2).is_empty());
    }

    #[test]
    fn status_text_matches_broadcast_shape() {
        let text = status_text(
            Decision::Approved,
            "Priya",
            d(2025, 3, 3),
            d(2025, 3, 4),
            "family event",
            "Rahul",
            "2025-03-01 10:00:00",
        );
        assert!(text.starts_with("✅ **Leave Approved**"));
        assert!(text.contains("👤 **Employee:** Priya"));
        assert!(text.contains("🗓️ **From:** 2025-03-03"));
        assert!(text.contains("🧑‍💼 **Reviewer:** Rahul — **2025-03-01 10:00:00 IST**"));
    }

    #[test]
    fn disabled_buttons_keep_the_card_ids() {
        let with_id = disabled_buttons(Some("abc"));
        assert_eq!(with_id["components"][0]["custom_id"], "leave_approve::abc");
        assert_eq!(with_id["components"][0]["disabled"], true);

        let legacy = disabled_buttons(None);
        assert_eq!(legacy["components"][1]["custom_id"], "leave_reject");
    }
}
