use strum_macros::{Display, EnumString};

/// Outcome of a review action. The Display form is what lands in
/// sheet rows and card status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn from_approve(approve: bool) -> Self {
        if approve {
            Self::Approved
        } else {
            Self::Rejected
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Approved => "✅",
            Self::Rejected => "❌",
        }
    }

    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Trailing status block appended to a review card once decided.
pub fn status_line(decision: Decision, reviewer: &str, stamp: &str) -> String {
    format!("\n\n**Status:** {decision} by **{reviewer}** at **{stamp} IST**")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_matches_sheet_vocabulary() {
        assert_eq!(Decision::Approved.to_string(), "Approved");
        assert_eq!(Decision::Rejected.to_string(), "Rejected");
    }

    #[test]
    fn round_trips_through_strings() {
        assert_eq!(Decision::from_str("Approved").unwrap(), Decision::Approved);
        assert_eq!(Decision::from_str("Rejected").unwrap(), Decision::Rejected);
        assert!(Decision::from_str("Maybe").is_err());
    }

    #[test]
    fn status_line_is_stable_for_a_fixed_stamp() {
        assert_eq!(
            status_line(Decision::Approved, "Priya", "2025-03-01 10:00:00"),
            "\n\n**Status:** Approved by **Priya** at **2025-03-01 10:00:00 IST**"
        );
    }
}
