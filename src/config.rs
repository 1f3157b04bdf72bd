use std::env;

use crate::google::auth::{ServiceAccountKey, load_service_account};

#[derive(Clone)]
pub struct Config {
    pub public_key: String,
    pub bot_token: String,
    pub sheet_id: String,
    pub service_account: ServiceAccountKey,
    pub admin_subject: String,
    pub server_addr: String,
    pub log_dir: String,

    // Channel routing
    pub finance_channel_id: String,
    pub approver_channel_id: String,
    pub leave_status_channel_id: String,
    pub attendance_channel_id: String,
    pub content_requests_channel_id: String,
    pub assets_reviews_channel_id: String,
    pub leave_requests_channel_id: String,
    pub content_team_channel_id: String,

    pub approver_user_id: String,
    pub hr_role_id: String,
}

fn optional(name: &str) -> String {
    env::var(name).unwrap_or_default().trim().to_string()
}

impl Config {
    pub fn from_env() -> Self {
        let service_account_raw =
            env::var("SERVICE_ACCOUNT_JSON").expect("SERVICE_ACCOUNT_JSON must be set");
        let service_account = load_service_account(&service_account_raw)
            .unwrap_or_else(|e| panic!("SERVICE_ACCOUNT_JSON is unusable: {e:#}"));

        Self {
            public_key: env::var("DISCORD_PUBLIC_KEY").expect("DISCORD_PUBLIC_KEY must be set"),
            bot_token: env::var("DISCORD_BOT_TOKEN").expect("DISCORD_BOT_TOKEN must be set"),
            sheet_id: env::var("SHEET_ID").expect("SHEET_ID must be set"),
            service_account,
            admin_subject: optional("ADMIN_SUBJECT"),
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            finance_channel_id: optional("FINANCE_CHANNEL_ID"),
            approver_channel_id: optional("APPROVER_CHANNEL_ID"),
            leave_status_channel_id: optional("LEAVE_STATUS_CHANNEL_ID"),
            attendance_channel_id: optional("ATTENDANCE_CHANNEL_ID"),
            content_requests_channel_id: optional("CONTENT_REQUESTS_CHANNEL_ID"),
            assets_reviews_channel_id: optional("ASSETS_REVIEWS_CHANNEL_ID"),
            leave_requests_channel_id: optional("LEAVE_REQUESTS_CHANNEL_ID"),
            content_team_channel_id: optional("CONTENT_TEAM_CHANNEL_ID"),

            approver_user_id: optional("APPROVER_USER_ID"),
            hr_role_id: optional("HR_ROLE_ID"),
        }
    }

    /// Channels a command may run in. None means unrestricted; an
    /// unset channel id drops out of the allow-list rather than
    /// matching the empty string.
    pub fn allowed_channels(&self, command: &str) -> Option<Vec<&str>> {
        let ids: &[&String] = match command {
            "leaverequest" | "leavecount" => &[&self.leave_requests_channel_id],
            "attendance" => &[&self.attendance_channel_id],
            "contentrequest" | "assetreview" => &[&self.content_team_channel_id],
            "recordinvoice" | "clearinvoice" | "viewinvoice" | "viewfinstatus" | "recordtax" => {
                &[&self.finance_channel_id]
            }
            _ => return None,
        };
        Some(ids.iter().filter(|id| !id.is_empty()).map(|id| id.as_str()).collect())
    }

    /// Human name for a routed channel, `<#id>` for anything else.
    pub fn channel_label(&self, channel_id: &str) -> String {
        let known = [
            (&self.leave_requests_channel_id, "#leave-requests"),
            (&self.attendance_channel_id, "#attendance"),
            (&self.content_requests_channel_id, "#content-requests"),
            (&self.assets_reviews_channel_id, "#assets-reviews"),
            (&self.content_team_channel_id, "#content-team"),
            (&self.finance_channel_id, "#finance"),
        ];
        for (id, label) in known {
            if !id.is_empty() && id == channel_id {
                return label.to_string();
            }
        }
        format!("<#{channel_id}>")
    }
}
