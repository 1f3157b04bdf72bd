use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Inbound interaction envelope. Only the fields the dispatcher and
/// handlers read are modelled; everything else stays in the raw JSON.
#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub components: Vec<ActionRow>,
    #[serde(default)]
    pub resolved: Option<Resolved>,
}

#[derive(Debug, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActionRow {
    #[serde(default)]
    pub components: Vec<SubmittedInput>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedInput {
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Resolved {
    #[serde(default)]
    pub attachments: HashMap<String, Attachment>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

/// Who triggered the interaction. Guild payloads nest the user under
/// `member`; DMs put it at the top level.
#[derive(Debug, Clone)]
pub struct Invoker {
    pub id: String,
    pub name: String,
}

impl Interaction {
    pub fn invoker(&self) -> Invoker {
        let user = self
            .member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref());
        match user {
            Some(u) => Invoker {
                id: u.id.clone(),
                name: u
                    .global_name
                    .clone()
                    .or_else(|| u.username.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
            },
            None => Invoker {
                id: String::new(),
                name: "Unknown".to_string(),
            },
        }
    }

    pub fn command_name(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .unwrap_or("")
    }

    pub fn custom_id(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| d.custom_id.as_deref())
            .unwrap_or("")
    }

    /// String form of a named option. Numeric option values are
    /// rendered without a trailing `.0` so invoice numbers entered as
    /// numbers match their sheet rows.
    pub fn option_str(&self, name: &str) -> Option<String> {
        let value = self
            .data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)?
            .value
            .as_ref()?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else {
                    n.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn option_f64(&self, name: &str) -> Option<f64> {
        let value = self
            .data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)?
            .value
            .as_ref()?;
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse().ok(),
            _ => None,
        }
    }

    /// The option Discord marked as focused during autocomplete, with
    /// its current partial value.
    pub fn focused_option(&self) -> Option<(&str, String)> {
        let opt = self.data.as_ref()?.options.iter().find(|o| o.focused)?;
        let partial = match opt.value.as_ref() {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Some((opt.name.as_str(), partial))
    }

    /// Text submitted in a modal input, searched across action rows.
    pub fn modal_value(&self, custom_id: &str) -> Option<String> {
        let data = self.data.as_ref()?;
        for row in &data.components {
            for input in &row.components {
                if input.custom_id.as_deref() == Some(custom_id) {
                    let v = input.value.as_deref().unwrap_or("").trim();
                    return if v.is_empty() {
                        None
                    } else {
                        Some(v.to_string())
                    };
                }
            }
        }
        None
    }

    /// First value of a select-menu component submission.
    pub fn select_value(&self) -> Option<&str> {
        self.data.as_ref()?.values.first().map(String::as_str)
    }

    /// Attachment resolved from an attachment-typed option.
    pub fn attachment(&self, option_name: &str) -> Option<&Attachment> {
        let data = self.data.as_ref()?;
        let id = data
            .options
            .iter()
            .find(|o| o.name == option_name)?
            .value
            .as_ref()?
            .as_str()?;
        data.resolved.as_ref()?.attachments.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> Interaction {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn invoker_prefers_member_user_and_global_name() {
        let i = parse(json!({
            "type": 2,
            "member": {"user": {"id": "42", "username": "asha_k", "global_name": "Asha"}},
            "user": {"id": "99", "username": "other"}
        }));
        let who = i.invoker();
        assert_eq!(who.id, "42");
        assert_eq!(who.name, "Asha");
    }

    #[test]
    fn invoker_falls_back_to_username_then_unknown() {
        let i = parse(json!({"type": 2, "user": {"id": "7", "username": "ravi"}}));
        assert_eq!(i.invoker().name, "ravi");

        let i = parse(json!({"type": 2}));
        assert_eq!(i.invoker().name, "Unknown");
        assert_eq!(i.invoker().id, "");
    }

    #[test]
    fn option_str_coerces_numbers_without_decimal_noise() {
        let i = parse(json!({
            "type": 2,
            "data": {"name": "recordinvoice", "options": [
                {"name": "invoicenumber", "value": 1042},
                {"name": "companyname", "value": "  Acme  "},
                {"name": "invoicevalue", "value": 12500.5}
            ]}
        }));
        assert_eq!(i.option_str("invoicenumber").as_deref(), Some("1042"));
        assert_eq!(i.option_str("companyname").as_deref(), Some("Acme"));
        assert_eq!(i.option_f64("invoicevalue"), Some(12500.5));
        assert_eq!(i.option_str("missing"), None);
    }

    #[test]
    fn focused_option_carries_partial_text() {
        let i = parse(json!({
            "type": 4,
            "data": {"name": "viewinvoice", "options": [
                {"name": "invoicenumber", "value": "10", "focused": true}
            ]}
        }));
        assert_eq!(i.focused_option(), Some(("invoicenumber", "10".to_string())));
    }

    #[test]
    fn modal_value_searches_rows_and_drops_blanks() {
        let i = parse(json!({
            "type": 5,
            "data": {"custom_id": "leave_reason::2025-03-01::2025-03-03", "components": [
                {"components": [{"custom_id": "leave_reason_text", "value": " family event "}]},
                {"components": [{"custom_id": "blank", "value": "   "}]}
            ]}
        }));
        assert_eq!(
            i.modal_value("leave_reason_text").as_deref(),
            Some("family event")
        );
        assert_eq!(i.modal_value("blank"), None);
        assert_eq!(i.modal_value("absent"), None);
    }

    #[test]
    fn attachment_resolves_through_option_id() {
        let i = parse(json!({
            "type": 2,
            "data": {
                "name": "contentrequest",
                "options": [{"name": "file", "value": "111"}],
                "resolved": {"attachments": {"111": {
                    "filename": "brief.pdf",
                    "url": "https://cdn.example/brief.pdf"
                }}}
            }
        }));
        let att = i.attachment("file").unwrap();
        assert_eq!(att.filename, "brief.pdf");
        assert_eq!(att.url, "https://cdn.example/brief.pdf");
    }

    #[test]
    fn select_value_reads_first_choice() {
        let i = parse(json!({
            "type": 3,
            "data": {"custom_id": "leave_from_select", "values": ["2025-03-01"]}
        }));
        assert_eq!(i.select_value(), Some("2025-03-01"));
    }
}
