use anyhow::{Context, Result};
use serde_json::json;
use tracing::warn;

use crate::api::interactions::Ctx;
use crate::config::Config;
use crate::discord::interaction::Interaction;
use crate::discord::rest;
use crate::discord::response::{InteractionResponse, text_input};
use crate::google::sheets::{self, ValueInput};
use crate::model::attendance::{AttendanceAction, attendance_row, day_status};
use crate::utils::dates::{attendance_stamp, today_ist};

const ATTENDANCE_RANGE: &str = "Attendance!A:E";

/// `/attendance` walks the day forward: no login yet records a login,
/// a login without logout asks for the daily progress note, and a
/// completed day is a no-op.
pub async fn attendance_command(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
) -> Result<InteractionResponse> {
    let invoker = interaction.invoker();
    let rows = sheets::read_range(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        ATTENDANCE_RANGE,
    )
    .await
    .context("reading attendance sheet")?;

    let status = day_status(&rows, &invoker.name, &invoker.id, today_ist());

    if !status.has_login {
        let stamp = attendance_stamp();
        let row = attendance_row(&stamp, &invoker.name, AttendanceAction::Login, &invoker.id, None);
        sheets::append_row(
            ctx.http,
            &ctx.config.service_account,
            &ctx.config.sheet_id,
            ATTENDANCE_RANGE,
            row,
            ValueInput::UserEntered,
        )
        .await
        .context("recording login")?;

        spawn_broadcast(
            ctx,
            interaction,
            AttendanceAction::Login,
            stamp.clone(),
            String::new(),
        );
        return Ok(InteractionResponse::ephemeral(format!(
            "🟢 ✅ Recorded **Login** for **{}** • 🕒 {stamp} IST",
            invoker.name
        )));
    }

    if !status.has_logout {
        return Ok(InteractionResponse::Modal {
            custom_id: format!("att_logout_progress::{}", invoker.id),
            title: "Daily progress (required for logout)".into(),
            components: vec![text_input(
                "progress_text",
                "What did you complete today?",
                true,
                true,
                Some(2000),
                Some("Tasks done, blockers, key updates…"),
            )],
        });
    }

    Ok(InteractionResponse::ephemeral(
        "ℹ️ You've already recorded **Login** and **Logout** for today.",
    ))
}

/// Logout modal submission. The modal id pins the user it was opened
/// for; the state is re-checked because the sheet may have moved since
/// the modal was shown.
pub async fn logout_modal(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    modal_user_id: &str,
) -> Result<InteractionResponse> {
    let invoker = interaction.invoker();
    if invoker.id != modal_user_id {
        return Ok(InteractionResponse::ephemeral("❌ This modal isn't for you."));
    }

    let progress = interaction.modal_value("progress_text").unwrap_or_default();

    let rows = sheets::read_range(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        ATTENDANCE_RANGE,
    )
    .await
    .context("reading attendance sheet")?;
    let status = day_status(&rows, &invoker.name, &invoker.id, today_ist());

    if !status.has_login {
        return Ok(InteractionResponse::ephemeral(
            "⚠️ No **Login** found for today. Please log in first.",
        ));
    }
    if status.has_logout {
        return Ok(InteractionResponse::ephemeral(
            "ℹ️ **Logout** already recorded for today.",
        ));
    }

    let stamp = attendance_stamp();
    let row = attendance_row(
        &stamp,
        &invoker.name,
        AttendanceAction::Logout,
        &invoker.id,
        Some(&progress),
    );
    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        ATTENDANCE_RANGE,
        row,
        ValueInput::UserEntered,
    )
    .await
    .context("recording logout")?;

    spawn_broadcast(ctx, interaction, AttendanceAction::Logout, stamp, progress);
    Ok(InteractionResponse::ephemeral(
        "🔴 ✅ **Logout** recorded with your daily progress. Have a good one!",
    ))
}

fn broadcast_text(
    config: &Config,
    name: &str,
    user_id: &str,
    action: AttendanceAction,
    stamp: &str,
    progress: &str,
) -> String {
    let user_ping = if user_id.is_empty() {
        name.to_string()
    } else {
        format!("<@{user_id}>")
    };
    let role_ping = if config.hr_role_id.is_empty() {
        "HR".to_string()
    } else {
        format!("<@&{}>", config.hr_role_id)
    };
    let mut text = format!(
        "{} **Attendance**\n👤 {user_ping} — **{name}**\n🕒 {stamp} IST\n📝 Action: **{action}**",
        action.icon()
    );
    if !progress.is_empty() {
        text.push_str(&format!("\n📈 **Daily Progress:** {progress}"));
    }
    text.push_str(&format!("\n{role_ping} please take note."));
    text
}

/// Channel broadcast plus a DM receipt, detached from the ack so the
/// three-second interaction deadline never waits on the gateway.
fn spawn_broadcast(
    ctx: &Ctx<'_>,
    interaction: &Interaction,
    action: AttendanceAction,
    stamp: String,
    progress: String,
) {
    let config = ctx.config.clone();
    let http = ctx.http.clone();
    let invoker = interaction.invoker();
    let origin = interaction.channel_id.clone().unwrap_or_default();

    actix_web::rt::spawn(async move {
        let channel = if config.attendance_channel_id.is_empty() {
            origin
        } else {
            config.attendance_channel_id.clone()
        };
        let content = broadcast_text(&config, &invoker.name, &invoker.id, action, &stamp, &progress);
        let roles: Vec<&str> = if config.hr_role_id.is_empty() {
            vec![]
        } else {
            vec![config.hr_role_id.as_str()]
        };
        let users: Vec<&str> = if invoker.id.is_empty() {
            vec![]
        } else {
            vec![invoker.id.as_str()]
        };
        let payload = json!({
            "content": content,
            "allowed_mentions": {"parse": [], "roles": roles, "users": users},
        });
        if let Err(e) = rest::post_message(&http, &config.bot_token, &channel, payload).await {
            warn!(error = format!("{e:#}"), "attendance broadcast failed");
        }

        if !invoker.id.is_empty() {
            let mut receipt = format!(
                "{} Attendance recorded for **{}**\n🕒 {stamp} IST\nAction: **{action}**",
                action.icon(),
                invoker.name
            );
            if !progress.is_empty() {
                receipt.push_str(&format!("\n📈 **Daily Progress:** {progress}"));
            }
            if let Err(e) = rest::send_dm(&http, &config.bot_token, &invoker.id, &receipt).await {
                warn!(error = format!("{e:#}"), "attendance DM failed");
            }
        }
    });
}
