use actix_web::web::{Bytes, Data};
use actix_web::{HttpRequest, HttpResponse, Responder};
use reqwest::Client;
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::{attendance, content, finance, leave, meet, wfh};
use crate::auth::signature;
use crate::config::Config;
use crate::discord::interaction::Interaction;
use crate::discord::response::InteractionResponse;
use crate::model::content::ReviewKind;
use crate::utils::markdown::truncate;

/// Shared per-request handles. Handlers borrow rather than clone;
/// spawned notifier tasks clone what they need out of it.
pub struct Ctx<'a> {
    pub config: &'a Config,
    pub http: &'a Client,
}

const ERROR_REPLY_MAX: usize = 1900;

/// Slash commands the service answers. Wire names are the lowercase
/// command names registered with Discord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Attendance,
    LeaveRequest,
    LeaveCount,
    Wfh,
    ContentRequest,
    AssetReview,
    RecordInvoice,
    ClearInvoice,
    ViewInvoice,
    ViewFinStatus,
    RecordTax,
    ScheduleMeet,
    AuditMeet,
}

impl Command {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "attendance" => Self::Attendance,
            "leaverequest" => Self::LeaveRequest,
            "leavecount" => Self::LeaveCount,
            "wfh" => Self::Wfh,
            "contentrequest" => Self::ContentRequest,
            "assetreview" => Self::AssetReview,
            "recordinvoice" => Self::RecordInvoice,
            "clearinvoice" => Self::ClearInvoice,
            "viewinvoice" => Self::ViewInvoice,
            "viewfinstatus" => Self::ViewFinStatus,
            "recordtax" => Self::RecordTax,
            "schedulemeet" => Self::ScheduleMeet,
            "auditmeet" => Self::AuditMeet,
            _ => return None,
        })
    }
}

/// Button and select-menu actions, decoded from the component custom
/// id. Ids are `::`-separated; the head names the action and the tail
/// carries its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    LeaveFromSelect,
    LeaveToSelect { from: String },
    LeaveApprove { request_id: Option<String> },
    LeaveReject { request_id: Option<String> },
    WfhApprove,
    WfhReject,
    ContentDecision { approve: bool },
    AssetDecision { approve: bool },
}

impl ComponentAction {
    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.split("::");
        let head = parts.next()?;
        Some(match head {
            "leave_from_select" => Self::LeaveFromSelect,
            "leave_to_select" => Self::LeaveToSelect {
                from: parts.next()?.to_string(),
            },
            // Older cards carry no request id; the handler falls back
            // to parsing the card text.
            "leave_approve" => Self::LeaveApprove {
                request_id: parts.next().map(str::to_string),
            },
            "leave_reject" => Self::LeaveReject {
                request_id: parts.next().map(str::to_string),
            },
            "wfh_approve" => Self::WfhApprove,
            "wfh_reject" => Self::WfhReject,
            "cr_approve" => Self::ContentDecision { approve: true },
            "cr_reject" => Self::ContentDecision { approve: false },
            "ar_approve" => Self::AssetDecision { approve: true },
            "ar_reject" => Self::AssetDecision { approve: false },
            _ => return None,
        })
    }
}

/// Modal submissions, decoded from the modal custom id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    AttendanceLogout {
        user_id: String,
    },
    LeaveReason {
        from: String,
        to: String,
    },
    LeaveRejectReason {
        channel_id: String,
        message_id: String,
        request_id: Option<String>,
    },
    Wfh,
    WfhRejectReason {
        channel_id: String,
        message_id: String,
    },
    ContentNote {
        approve: bool,
        channel_id: String,
        message_id: String,
    },
    AssetNote {
        approve: bool,
        channel_id: String,
        message_id: String,
    },
}

impl ModalKind {
    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.split("::");
        let head = parts.next()?;
        Some(match head {
            "att_logout_progress" => Self::AttendanceLogout {
                user_id: parts.next()?.to_string(),
            },
            "leave_reason" => Self::LeaveReason {
                from: parts.next()?.to_string(),
                to: parts.next()?.to_string(),
            },
            "reject_reason" => Self::LeaveRejectReason {
                channel_id: parts.next()?.to_string(),
                message_id: parts.next()?.to_string(),
                request_id: parts.next().map(str::to_string),
            },
            "wfh_modal" => Self::Wfh,
            "wfh_reject_reason" => Self::WfhRejectReason {
                channel_id: parts.next()?.to_string(),
                message_id: parts.next()?.to_string(),
            },
            "cr_approve_reason" | "cr_reject_reason" => Self::ContentNote {
                approve: head == "cr_approve_reason",
                channel_id: parts.next()?.to_string(),
                message_id: parts.next()?.to_string(),
            },
            "ar_approve_reason" | "ar_reject_reason" => Self::AssetNote {
                approve: head == "ar_approve_reason",
                channel_id: parts.next()?.to_string(),
                message_id: parts.next()?.to_string(),
            },
            _ => return None,
        })
    }
}

/// Rejects commands invoked outside their designated channel. Returns
/// the ephemeral denial to send, or None when the command may proceed.
pub fn check_channel(
    config: &Config,
    command_name: &str,
    channel_id: &str,
) -> Option<InteractionResponse> {
    let allowed = config.allowed_channels(command_name)?;
    if allowed.iter().any(|id| *id == channel_id) {
        return None;
    }
    let labels: Vec<String> = allowed
        .iter()
        .map(|id| config.channel_label(id))
        .collect();
    let places = if labels.is_empty() {
        "its designated channel".to_string()
    } else {
        labels.join(" or ")
    };
    Some(InteractionResponse::ephemeral(format!(
        "⛔ **/{command_name}** isn't allowed here. Use it in {places}."
    )))
}

pub async fn interactions(
    req: HttpRequest,
    body: Bytes,
    config: Data<Config>,
    http: Data<Client>,
) -> impl Responder {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let sig = header("X-Signature-Ed25519");
    let ts = header("X-Signature-Timestamp");

    if let Err(e) = signature::verify(&config.public_key, &sig, &ts, &body) {
        warn!(error = %e, "signature verification failed");
        return HttpResponse::Unauthorized().json(json!({"error": "invalid request signature"}));
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "unparseable interaction payload");
            return HttpResponse::BadRequest().json(json!({"error": "malformed interaction"}));
        }
    };

    let ctx = Ctx {
        config: config.get_ref(),
        http: http.get_ref(),
    };

    let response = match interaction.kind {
        1 => InteractionResponse::Pong,
        2 => dispatch_command(&ctx, &interaction).await,
        3 => dispatch_component(&ctx, &interaction).await,
        4 => dispatch_autocomplete(&ctx, &interaction).await,
        5 => dispatch_modal(&ctx, &interaction).await,
        other => {
            warn!(kind = other, "unsupported interaction type");
            InteractionResponse::ephemeral("Unsupported interaction type.")
        }
    };

    response.into_http()
}

fn error_reply(e: anyhow::Error) -> InteractionResponse {
    error!(error = format!("{e:#}"), "handler failed");
    InteractionResponse::ephemeral(truncate(&format!("❌ {e:#}"), ERROR_REPLY_MAX))
}

async fn dispatch_command(ctx: &Ctx<'_>, interaction: &Interaction) -> InteractionResponse {
    let name = interaction.command_name().to_string();
    let Some(command) = Command::parse(&name) else {
        warn!(command = %name, "unknown command");
        return InteractionResponse::ephemeral("Unknown command.");
    };
    let channel = interaction.channel_id.as_deref().unwrap_or("");
    if let Some(denied) = check_channel(ctx.config, &name, channel) {
        return denied;
    }
    info!(command = %name, user = %interaction.invoker().name, "command received");

    let result = match command {
        Command::Attendance => attendance::attendance_command(ctx, interaction).await,
        Command::LeaveRequest => leave::leave_request_command(),
        Command::LeaveCount => leave::leave_count_command(ctx, interaction).await,
        Command::Wfh => wfh::wfh_command(),
        Command::ContentRequest => {
            content::review_request_command(ctx, interaction, ReviewKind::Content).await
        }
        Command::AssetReview => {
            content::review_request_command(ctx, interaction, ReviewKind::Asset).await
        }
        Command::RecordInvoice => finance::record_invoice(ctx, interaction).await,
        Command::ClearInvoice => finance::clear_invoice(ctx, interaction).await,
        Command::ViewInvoice => finance::view_invoice(ctx, interaction).await,
        Command::ViewFinStatus => finance::view_fin_status(ctx).await,
        Command::RecordTax => finance::record_tax(ctx, interaction).await,
        Command::ScheduleMeet => meet::schedule_meet(ctx, interaction).await,
        Command::AuditMeet => meet::audit_meet(ctx, interaction).await,
    };
    result.unwrap_or_else(error_reply)
}

async fn dispatch_component(ctx: &Ctx<'_>, interaction: &Interaction) -> InteractionResponse {
    let custom_id = interaction.custom_id().to_string();
    let Some(action) = ComponentAction::parse(&custom_id) else {
        warn!(custom_id = %custom_id, "unknown component action");
        return InteractionResponse::ephemeral(format!(
            "Unsupported action for button id `{custom_id}`."
        ));
    };
    info!(custom_id = %custom_id, user = %interaction.invoker().name, "component received");

    let result = match action {
        ComponentAction::LeaveFromSelect => leave::from_selected(interaction),
        ComponentAction::LeaveToSelect { from } => leave::to_selected(interaction, &from),
        ComponentAction::LeaveApprove { request_id } => {
            leave::approve(ctx, interaction, request_id.as_deref()).await
        }
        ComponentAction::LeaveReject { request_id } => {
            leave::reject_prompt(interaction, request_id.as_deref())
        }
        ComponentAction::WfhApprove => wfh::approve(ctx, interaction).await,
        ComponentAction::WfhReject => wfh::reject_prompt(interaction),
        ComponentAction::ContentDecision { approve } => {
            content::decision_prompt(interaction, ReviewKind::Content, approve)
        }
        ComponentAction::AssetDecision { approve } => {
            content::decision_prompt(interaction, ReviewKind::Asset, approve)
        }
    };
    result.unwrap_or_else(error_reply)
}

async fn dispatch_autocomplete(ctx: &Ctx<'_>, interaction: &Interaction) -> InteractionResponse {
    let command = interaction.command_name().to_string();
    let focused = interaction.focused_option();

    let result = match (command.as_str(), focused) {
        ("leavecount", Some(("name", query))) => leave::name_choices(ctx, &query).await,
        ("clearinvoice" | "recordtax" | "viewinvoice", Some(("invoicenumber", query))) => {
            finance::invoice_choices(ctx, &query).await
        }
        _ => Ok(Vec::new()),
    };

    // Autocomplete failures degrade to an empty list; the user can
    // still type a value by hand.
    let choices = result.unwrap_or_else(|e| {
        warn!(command = %command, error = format!("{e:#}"), "autocomplete failed");
        Vec::new()
    });
    InteractionResponse::Autocomplete { choices }
}

async fn dispatch_modal(ctx: &Ctx<'_>, interaction: &Interaction) -> InteractionResponse {
    let custom_id = interaction.custom_id().to_string();
    let Some(kind) = ModalKind::parse(&custom_id) else {
        warn!(custom_id = %custom_id, "unknown modal");
        return InteractionResponse::ephemeral(format!("Unsupported modal id `{custom_id}`."));
    };
    info!(custom_id = %custom_id, user = %interaction.invoker().name, "modal submitted");

    let result = match kind {
        ModalKind::AttendanceLogout { user_id } => {
            attendance::logout_modal(ctx, interaction, &user_id).await
        }
        ModalKind::LeaveReason { from, to } => {
            leave::reason_modal(ctx, interaction, &from, &to).await
        }
        ModalKind::LeaveRejectReason {
            channel_id,
            message_id,
            request_id,
        } => {
            leave::reject_modal(ctx, interaction, &channel_id, &message_id, request_id.as_deref())
                .await
        }
        ModalKind::Wfh => wfh::request_modal(ctx, interaction).await,
        ModalKind::WfhRejectReason {
            channel_id,
            message_id,
        } => wfh::reject_modal(ctx, interaction, &channel_id, &message_id).await,
        ModalKind::ContentNote {
            approve,
            channel_id,
            message_id,
        } => {
            content::decision_modal(
                ctx,
                interaction,
                ReviewKind::Content,
                approve,
                &channel_id,
                &message_id,
            )
            .await
        }
        ModalKind::AssetNote {
            approve,
            channel_id,
            message_id,
        } => {
            content::decision_modal(
                ctx,
                interaction,
                ReviewKind::Asset,
                approve,
                &channel_id,
                &message_id,
            )
            .await
        }
    };
    result.unwrap_or_else(error_reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::auth::ServiceAccountKey;

    fn test_config() -> Config {
        Config {
            public_key: "pk".into(),
            bot_token: "bt".into(),
            sheet_id: "sheet".into(),
            service_account: ServiceAccountKey {
                client_email: "svc@example.com".into(),
                private_key: "pem".into(),
                token_uri: "https://oauth2.googleapis.com/token".into(),
            },
            admin_subject: String::new(),
            server_addr: "0.0.0.0:8080".into(),
            log_dir: "logs".into(),
            finance_channel_id: "100".into(),
            approver_channel_id: "200".into(),
            leave_status_channel_id: "300".into(),
            attendance_channel_id: "400".into(),
            content_requests_channel_id: "500".into(),
            assets_reviews_channel_id: "600".into(),
            leave_requests_channel_id: "700".into(),
            content_team_channel_id: "800".into(),
            approver_user_id: "900".into(),
            hr_role_id: String::new(),
        }
    }

    #[test]
    fn commands_parse_by_wire_name() {
        assert_eq!(Command::parse("attendance"), Some(Command::Attendance));
        assert_eq!(Command::parse("viewfinstatus"), Some(Command::ViewFinStatus));
        assert_eq!(Command::parse("auditmeet"), Some(Command::AuditMeet));
        assert_eq!(Command::parse("payroll"), None);
    }

    #[test]
    fn component_ids_decode_with_arguments() {
        assert_eq!(
            ComponentAction::parse("leave_to_select::2025-03-01"),
            Some(ComponentAction::LeaveToSelect {
                from: "2025-03-01".into()
            })
        );
        assert_eq!(
            ComponentAction::parse("leave_approve::abc-123"),
            Some(ComponentAction::LeaveApprove {
                request_id: Some("abc-123".into())
            })
        );
        assert_eq!(
            ComponentAction::parse("leave_approve"),
            Some(ComponentAction::LeaveApprove { request_id: None })
        );
        assert_eq!(
            ComponentAction::parse("cr_reject"),
            Some(ComponentAction::ContentDecision { approve: false })
        );
        assert_eq!(ComponentAction::parse("mystery_button"), None);
    }

    #[test]
    fn modal_ids_decode_with_arguments() {
        assert_eq!(
            ModalKind::parse("att_logout_progress::42"),
            Some(ModalKind::AttendanceLogout {
                user_id: "42".into()
            })
        );
        assert_eq!(
            ModalKind::parse("reject_reason::ch1::msg1::req1"),
            Some(ModalKind::LeaveRejectReason {
                channel_id: "ch1".into(),
                message_id: "msg1".into(),
                request_id: Some("req1".into()),
            })
        );
        assert_eq!(
            ModalKind::parse("reject_reason::ch1::msg1"),
            Some(ModalKind::LeaveRejectReason {
                channel_id: "ch1".into(),
                message_id: "msg1".into(),
                request_id: None,
            })
        );
        assert_eq!(
            ModalKind::parse("ar_approve_reason::ch::msg"),
            Some(ModalKind::AssetNote {
                approve: true,
                channel_id: "ch".into(),
                message_id: "msg".into(),
            })
        );
        assert_eq!(ModalKind::parse("nope"), None);
    }

    #[test]
    fn channel_guard_allows_and_denies() {
        let config = test_config();
        assert!(check_channel(&config, "attendance", "400").is_none());
        assert!(check_channel(&config, "schedulemeet", "anywhere").is_none());

        let denied = check_channel(&config, "attendance", "999").unwrap();
        match denied {
            InteractionResponse::ChannelMessage {
                content, ephemeral, ..
            } => {
                assert!(ephemeral);
                assert_eq!(
                    content,
                    "⛔ **/attendance** isn't allowed here. Use it in #attendance."
                );
            }
            other => panic!("expected ephemeral denial, got {other:?}"),
        }
    }

    #[test]
    fn guard_with_unset_channel_denies_everywhere() {
        let mut config = test_config();
        config.finance_channel_id.clear();
        let denied = check_channel(&config, "recordinvoice", "100").unwrap();
        match denied {
            InteractionResponse::ChannelMessage { content, .. } => {
                assert!(content.contains("its designated channel"));
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }
}
