use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::google::sheets::CellValue;
use crate::model::decision::Decision;
use crate::utils::dates::{overlap_days, parse_ymd};
use crate::utils::markdown::{grab, strip_marker};

/// First-line markers a leave card may carry. Older cards were posted
/// without the emoji prefix.
const LEAVE_MARKERS: [&str; 3] = [
    "**Leave Request from ",
    "Leave Request from ",
    "📩 **Leave Request from ",
];

/// Request rows: [request_id, user_id, user_name, from, to, reason].
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequest {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub reason: String,
}

impl LeaveRequest {
    /// Inclusive span; a single-day leave is 1.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn to_row(&self) -> Vec<Value> {
        vec![
            json!(self.id),
            json!(self.user_id),
            json!(self.user_name),
            json!(self.from.to_string()),
            json!(self.to.to_string()),
            json!(self.reason),
        ]
    }

    pub fn from_row(row: &[CellValue]) -> Option<Self> {
        let text = |i: usize| row.get(i).map(CellValue::as_text).unwrap_or_default();
        let from = parse_ymd(&text(3))?;
        let to = parse_ymd(&text(4))?;
        let id = text(0);
        if id.is_empty() {
            return None;
        }
        Some(Self {
            id,
            user_id: text(1),
            user_name: text(2),
            from,
            to,
            reason: text(5),
        })
    }

    pub fn find(rows: &[Vec<CellValue>], id: &str) -> Option<Self> {
        rows.iter()
            .filter_map(|r| Self::from_row(r))
            .find(|req| req.id == id)
    }
}

pub fn format_leave_card(name: &str, from: NaiveDate, to: NaiveDate, days: i64, reason: &str) -> String {
    let reason = if reason.is_empty() { "(not provided)" } else { reason };
    format!(
        "📩 **Leave Request from {name}**\n\
         🗓️ **From:** {from}\n\
         🗓️ **To:** {to}\n\
         🗓️ **Days:** {days}\n\
         💬 **Reason:** {reason}\n\n\
         Please review and respond accordingly."
    )
}

/// Fields recovered from a posted card when the request id lookup has
/// nothing (legacy cards, trimmed sheets).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLeaveCard {
    pub name: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub reason: String,
}

pub fn parse_leave_card(content: &str) -> Option<ParsedLeaveCard> {
    let name = strip_marker(content, &LEAVE_MARKERS)?;
    let from = parse_ymd(&grab("**From:**", content)?)?;
    let to = parse_ymd(&grab("**To:**", content)?)?;
    let reason = grab("**Reason:**", content)
        .filter(|r| r != "(not provided)")
        .unwrap_or_default();
    Some(ParsedLeaveCard {
        name,
        from,
        to,
        reason,
    })
}

/// Decision rows: [ts, name, from, to, reason, decision, reviewer, days].
#[allow(clippy::too_many_arguments)]
pub fn decision_row(
    stamp: &str,
    name: &str,
    from: NaiveDate,
    to: NaiveDate,
    reason: &str,
    decision: Decision,
    reviewer: &str,
    days: i64,
) -> Vec<Value> {
    vec![
        json!(stamp),
        json!(name),
        json!(from.to_string()),
        json!(to.to_string()),
        json!(reason),
        json!(decision.to_string()),
        json!(reviewer),
        json!(days),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedLeave {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: i64,
}

/// Approved decisions for `name` whose range touches the month
/// window. The recorded Days column is what counts toward the total;
/// the window only gates inclusion. Detects and skips a header row.
pub fn approved_in_window(
    rows: &[Vec<CellValue>],
    name: &str,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> (Vec<ApprovedLeave>, i64) {
    let start_idx = usize::from(looks_like_header(rows));
    let mut items = Vec::new();
    let mut total = 0i64;
    for row in rows.iter().skip(start_idx) {
        if row.len() < 8 {
            continue;
        }
        let row_name = row[1].as_text();
        let decision = row[5].as_text();
        if row_name.is_empty() || !decision.eq_ignore_ascii_case("Approved") {
            continue;
        }
        if !row_name.eq_ignore_ascii_case(name) {
            continue;
        }
        let (Some(mut from), Some(mut to)) = (parse_ymd(&row[2].as_text()), parse_ymd(&row[3].as_text()))
        else {
            continue;
        };
        if from > to {
            std::mem::swap(&mut from, &mut to);
        }
        if overlap_days(from, to, window_start, window_end) == 0 {
            continue;
        }
        let days = row[7].to_i64().unwrap_or(0).max(0);
        items.push(ApprovedLeave { from, to, days });
        total += days;
    }
    (items, total)
}

fn looks_like_header(rows: &[Vec<CellValue>]) -> bool {
    let Some(first) = rows.first() else {
        return false;
    };
    let lc = |i: usize| {
        first
            .get(i)
            .map(|c| c.as_text().to_lowercase())
            .unwrap_or_default()
    };
    lc(1).contains("name") || lc(5).contains("decision")
}
