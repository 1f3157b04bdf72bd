use serde_json::{Value, json};

use crate::model::decision::Decision;
use crate::utils::markdown::{grab, link_parts, strip_marker};

const CONTENT_MARKERS: [&str; 3] = [
    "**Content Request from ",
    "Content Request from ",
    "📝 **Content Request from ",
];

const ASSET_MARKERS: [&str; 3] = [
    "**Asset Review Request from ",
    "Asset Review Request from ",
    "🧪 **Asset Review Request from ",
];

/// What kind of review card a channel message is. The two flavors
/// share layout; only the marker and subject label differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKind {
    Content,
    Asset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCard {
    pub requester: String,
    pub subject: String,
    pub filename: String,
    pub file_url: String,
}

pub fn format_content_card(requester: &str, topic: &str, filename: &str, file_url: &str) -> String {
    format!(
        "📝 **Content Request from {requester}**\n\
         📌 **Topic:** {topic}\n\
         📎 **File:** [{filename}]({file_url})\n\n\
         Please review and respond."
    )
}

pub fn format_asset_card(requester: &str, asset_name: &str, filename: &str, file_url: &str) -> String {
    format!(
        "🧪 **Asset Review Request from {requester}**\n\
         🏷️ **Name:** {asset_name}\n\
         📎 **File:** [{filename}]({file_url})\n\n\
         Please review and respond."
    )
}

/// Recovers card fields from the posted message; decision rows are
/// card-parse-only because these custom ids carry channel/message
/// refs instead of a request id.
pub fn parse_review_card(kind: ReviewKind, content: &str) -> Option<ReviewCard> {
    let (markers, subject_label) = match kind {
        ReviewKind::Content => (&CONTENT_MARKERS, "**Topic:**"),
        ReviewKind::Asset => (&ASSET_MARKERS, "**Name:**"),
    };
    let requester = strip_marker(content, markers)?;
    let subject = grab(subject_label, content).unwrap_or_default();
    let (filename, file_url) = grab("**File:**", content)
        .and_then(|line| link_parts(&line))
        .unwrap_or_default();
    Some(ReviewCard {
        requester,
        subject,
        filename,
        file_url,
    })
}

/// Decision rows: [ts, decision, reviewer, requester, subject,
/// filename, file_url, comments]. Both decision sheets share this
/// layout.
pub fn decision_row(
    stamp: &str,
    decision: Decision,
    reviewer: &str,
    card: &ReviewCard,
    comments: &str,
) -> Vec<Value> {
    vec![
        json!(stamp),
        json!(decision.to_string()),
        json!(reviewer),
        json!(card.requester),
        json!(card.subject),
        json!(card.filename),
        json!(card.file_url),
        json!(comments),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_card_round_trips() {
        let card = format_content_card(
            "Zoya",
            "Q2 newsletter",
            "brief.pdf",
            "https://cdn.example/brief.pdf",
        );
        let parsed = parse_review_card(ReviewKind::Content, &card).unwrap();
        assert_eq!(
            parsed,
            ReviewCard {
                requester: "Zoya".into(),
                subject: "Q2 newsletter".into(),
                filename: "brief.pdf".into(),
                file_url: "https://cdn.example/brief.pdf".into(),
            }
        );
    }

    #[test]
    fn asset_card_round_trips() {
        let card = format_asset_card(
            "Arun",
            "hero-banner",
            "banner.png",
            "https://cdn.example/banner.png",
        );
        let parsed = parse_review_card(ReviewKind::Asset, &card).unwrap();
        assert_eq!(parsed.subject, "hero-banner");
        assert_eq!(parsed.filename, "banner.png");
    }

    #[test]
    fn kinds_do_not_cross_parse() {
        let card = format_content_card("Zoya", "t", "f.pdf", "https://x/f.pdf");
        assert_eq!(parse_review_card(ReviewKind::Asset, &card), None);
    }

    #[test]
    fn card_with_broken_link_still_yields_requester() {
        let card = "📝 **Content Request from Zoya**\n📌 **Topic:** t\n📎 **File:** (missing)\n";
        let parsed = parse_review_card(ReviewKind::Content, card).unwrap();
        assert_eq!(parsed.requester, "Zoya");
        assert_eq!(parsed.filename, "");
        assert_eq!(parsed.file_url, "");
    }

    #[test]
    fn decision_row_layout_is_fixed() {
        let card = ReviewCard {
            requester: "Zoya".into(),
            subject: "Q2 newsletter".into(),
            filename: "brief.pdf".into(),
            file_url: "https://cdn.example/brief.pdf".into(),
        };
        let row = decision_row(
            "2025-03-01 10:00:00",
            Decision::Approved,
            "Priya",
            &card,
            "tighten intro",
        );
        assert_eq!(
            row,
            vec![
                json!("2025-03-01 10:00:00"),
                json!("Approved"),
                json!("Priya"),
                json!("Zoya"),
                json!("Q2 newsletter"),
                json!("brief.pdf"),
                json!("https://cdn.example/brief.pdf"),
                json!("tighten intro"),
            ]
        );
    }
}
