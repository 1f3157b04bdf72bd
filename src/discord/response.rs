use actix_web::HttpResponse;
use serde_json::{Value, json};

use crate::utils::markdown::truncate;

const EPHEMERAL_FLAG: u64 = 1 << 6;
const MAX_CHOICES: usize = 25;
const MAX_CHOICE_LABEL: usize = 100;

/// Closed set of immediate interaction replies. Each variant renders
/// to exactly one wire shape, so handlers cannot emit a malformed
/// callback type.
#[derive(Debug)]
pub enum InteractionResponse {
    Pong,
    ChannelMessage {
        content: String,
        ephemeral: bool,
        components: Vec<Value>,
    },
    UpdateMessage {
        content: String,
        components: Vec<Value>,
    },
    Modal {
        custom_id: String,
        title: String,
        components: Vec<Value>,
    },
    Autocomplete {
        choices: Vec<(String, String)>,
    },
}

impl InteractionResponse {
    pub fn message(content: impl Into<String>) -> Self {
        Self::ChannelMessage {
            content: content.into(),
            ephemeral: false,
            components: Vec::new(),
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::ChannelMessage {
            content: content.into(),
            ephemeral: true,
            components: Vec::new(),
        }
    }

    pub fn ephemeral_with_components(content: impl Into<String>, components: Vec<Value>) -> Self {
        Self::ChannelMessage {
            content: content.into(),
            ephemeral: true,
            components,
        }
    }

    /// Wire JSON for this reply. Autocomplete output is clamped here
    /// to 25 choices of at most 100 chars each, the hard limits the
    /// gateway enforces.
    pub fn into_json(self) -> Value {
        match self {
            Self::Pong => json!({"type": 1}),
            Self::ChannelMessage {
                content,
                ephemeral,
                components,
            } => {
                let mut data = json!({"content": content});
                if ephemeral {
                    data["flags"] = json!(EPHEMERAL_FLAG);
                }
                if !components.is_empty() {
                    data["components"] = json!(components);
                }
                json!({"type": 4, "data": data})
            }
            Self::UpdateMessage {
                content,
                components,
            } => json!({"type": 7, "data": {"content": content, "components": components}}),
            Self::Modal {
                custom_id,
                title,
                components,
            } => json!({"type": 9, "data": {
                "custom_id": custom_id,
                "title": title,
                "components": components,
            }}),
            Self::Autocomplete { choices } => {
                let choices: Vec<Value> = choices
                    .into_iter()
                    .take(MAX_CHOICES)
                    .map(|(name, value)| {
                        json!({"name": truncate(&name, MAX_CHOICE_LABEL), "value": value})
                    })
                    .collect();
                json!({"type": 8, "data": {"choices": choices}})
            }
        }
    }

    pub fn into_http(self) -> HttpResponse {
        HttpResponse::Ok().json(self.into_json())
    }
}

pub fn action_row(components: Vec<Value>) -> Value {
    json!({"type": 1, "components": components})
}

pub fn button(custom_id: &str, label: &str, style: u8, disabled: bool) -> Value {
    json!({
        "type": 2,
        "custom_id": custom_id,
        "label": label,
        "style": style,
        "disabled": disabled,
    })
}

/// Success (green) and Danger (red) button pair used on review cards.
pub fn approve_reject_row(approve_id: &str, reject_id: &str, disabled: bool) -> Value {
    action_row(vec![
        button(approve_id, "Approve", 3, disabled),
        button(reject_id, "Reject", 4, disabled),
    ])
}

pub fn string_select(custom_id: &str, placeholder: &str, options: Vec<Value>) -> Value {
    action_row(vec![json!({
        "type": 3,
        "custom_id": custom_id,
        "placeholder": placeholder,
        "options": options,
    })])
}

pub fn select_option(label: &str, value: &str) -> Value {
    json!({"label": label, "value": value})
}

#[allow(clippy::too_many_arguments)]
pub fn text_input(
    custom_id: &str,
    label: &str,
    paragraph: bool,
    required: bool,
    max_length: Option<u32>,
    placeholder: Option<&str>,
) -> Value {
    let mut input = json!({
        "type": 4,
        "custom_id": custom_id,
        "label": label,
        "style": if paragraph { 2 } else { 1 },
        "required": required,
    });
    if let Some(max) = max_length {
        input["max_length"] = json!(max);
    }
    if let Some(text) = placeholder {
        input["placeholder"] = json!(text);
    }
    action_row(vec![input])
}
