use serde_json::{Value, json};

use crate::model::decision::Decision;
use crate::utils::markdown::{grab, strip_marker};

const WFH_MARKERS: [&str; 3] = [
    "**WFH Request from ",
    "WFH Request from ",
    "🏠 **WFH Request from ",
];

/// Request rows: [timestamp, name, date, reason].
pub fn request_row(stamp: &str, name: &str, day: &str, reason: &str) -> Vec<Value> {
    vec![json!(stamp), json!(name), json!(day), json!(reason)]
}

/// Decision rows: [ts, name, date, reason, decision, reviewer, note].
pub fn decision_row(
    stamp: &str,
    name: &str,
    day: &str,
    reason: &str,
    decision: Decision,
    reviewer: &str,
    note: &str,
) -> Vec<Value> {
    vec![
        json!(stamp),
        json!(name),
        json!(day),
        json!(reason),
        json!(decision.to_string()),
        json!(reviewer),
        json!(note),
    ]
}

pub fn format_wfh_card(name: &str, day: &str, reason: &str) -> String {
    let reason = if reason.is_empty() { "(not provided)" } else { reason };
    format!(
        "🏠 **WFH Request from {name}**\n\
         📅 **Date:** {day}\n\
         💬 **Reason:** {reason}\n\n\
         Please review and respond accordingly."
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWfhCard {
    pub name: String,
    pub day: String,
    pub reason: String,
}

/// WFH cards carry no request id, so decisions always recover the
/// fields from the posted card text.
pub fn parse_wfh_card(content: &str) -> Option<ParsedWfhCard> {
    let name = strip_marker(content, &WFH_MARKERS)?;
    let day = grab("**Date:**", content)?;
    let reason = grab("**Reason:**", content)
        .filter(|r| r != "(not provided)")
        .unwrap_or_default();
    Some(ParsedWfhCard { name, day, reason })
}
