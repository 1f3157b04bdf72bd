use chrono::NaiveDate;
use serde_json::{Value, json};
use strum_macros::{Display, EnumString};

use crate::google::sheets::CellValue;
use crate::utils::dates::cell_to_date;

/// Attendance rows: [timestamp, name, action, user_id, progress].
const COL_TS: usize = 0;
const COL_NAME: usize = 1;
const COL_ACTION: usize = 2;
const COL_USER_ID: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AttendanceAction {
    Login,
    Logout,
}

impl AttendanceAction {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Login => "🟢",
            Self::Logout => "🔴",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DayStatus {
    pub has_login: bool,
    pub has_logout: bool,
}

/// Identity check: user id wins when both sides have one, otherwise
/// case-insensitive display name. Old rows predate the user_id column.
fn row_matches_user(row: &[CellValue], name: &str, user_id: &str) -> bool {
    if !user_id.is_empty() {
        let row_id = row.get(COL_USER_ID).map(CellValue::as_text).unwrap_or_default();
        if !row_id.is_empty() {
            return row_id == user_id;
        }
    }
    let row_name = row.get(COL_NAME).map(CellValue::as_text).unwrap_or_default();
    row_name.eq_ignore_ascii_case(name)
}

/// What the user has already recorded today. Drives the login/logout
/// state machine: no double login, no logout before login, one logout.
pub fn day_status(
    rows: &[Vec<CellValue>],
    name: &str,
    user_id: &str,
    today: NaiveDate,
) -> DayStatus {
    let mut status = DayStatus::default();
    for row in rows {
        if !row_matches_user(row, name, user_id) {
            continue;
        }
        let Some(date) = row.get(COL_TS).and_then(cell_to_date) else {
            continue;
        };
        if date != today {
            continue;
        }
        match row
            .get(COL_ACTION)
            .map(CellValue::as_text)
            .unwrap_or_default()
            .parse::<AttendanceAction>()
        {
            Ok(AttendanceAction::Login) => status.has_login = true,
            Ok(AttendanceAction::Logout) => status.has_logout = true,
            Err(_) => {}
        }
    }
    status
}

/// Distinct display names that logged attendance between `from` and
/// `to`, for name autocomplete. First-seen casing wins.
pub fn names_in_range(rows: &[Vec<CellValue>], from: NaiveDate, to: NaiveDate) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        let Some(date) = row.get(COL_TS).and_then(cell_to_date) else {
            continue;
        };
        if date < from || date > to {
            continue;
        }
        let name = row.get(COL_NAME).map(CellValue::as_text).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            names.push(name);
        }
    }
    names.sort_by_key(|n| n.to_lowercase());
    names
}

/// Sheet row for one attendance event. Progress text is only present
/// for logouts.
pub fn attendance_row(
    stamp: &str,
    name: &str,
    action: AttendanceAction,
    user_id: &str,
    progress: Option<&str>,
) -> Vec<Value> {
    json_row(&[
        stamp,
        name,
        &action.to_string(),
        user_id,
        progress.unwrap_or(""),
    ])
}

fn json_row(cells: &[&str]) -> Vec<Value> {
    cells.iter().map(|c| json!(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(ts: &str, name: &str, action: &str, user_id: &str) -> Vec<CellValue> {
        vec![
            CellValue(json!(ts)),
            CellValue(json!(name)),
            CellValue(json!(action)),
            CellValue(json!(user_id)),
        ]
    }

    #[test]
    fn day_status_reflects_todays_rows_only() {
        let rows = vec![
            row("2025 03 01-09:00:00", "Asha", "Login", "42"),
            row("2025 02 28-09:00:00", "Asha", "Logout", "42"),
        ];
        let status = day_status(&rows, "Asha", "42", d(2025, 3, 1));
        assert!(status.has_login);
        assert!(!status.has_logout);
    }

    #[test]
    fn repeated_calls_do_not_flip_status_back() {
        let rows = vec![
            row("2025 03 01-09:00:00", "Asha", "Login", "42"),
            row("2025 03 01-18:00:00", "Asha", "Logout", "42"),
            row("2025 03 01-19:00:00", "Asha", "Logout", "42"),
        ];
        let status = day_status(&rows, "Asha", "42", d(2025, 3, 1));
        assert_eq!(
            status,
            DayStatus {
                has_login: true,
                has_logout: true
            }
        );
    }

    #[test]
    fn user_id_beats_name_when_both_present() {
        let rows = vec![row("2025 03 01-09:00:00", "Asha", "Login", "42")];
        // Same id, different display name: still a match.
        assert!(day_status(&rows, "Renamed", "42", d(2025, 3, 1)).has_login);
        // Different id, same name: not a match.
        assert!(!day_status(&rows, "Asha", "99", d(2025, 3, 1)).has_login);
    }

    #[test]
    fn legacy_rows_without_id_fall_back_to_name() {
        let rows = vec![row("2025 03 01-09:00:00", "asha", "login", "")];
        assert!(day_status(&rows, "ASHA", "42", d(2025, 3, 1)).has_login);
    }

    #[test]
    fn serial_timestamps_are_understood() {
        // 45000 = 2023-03-15
        let rows = vec![vec![
            CellValue(json!(45000.4)),
            CellValue(json!("Asha")),
            CellValue(json!("Login")),
            CellValue(json!("42")),
        ]];
        assert!(day_status(&rows, "Asha", "42", d(2023, 3, 15)).has_login);
    }

    #[test]
    fn names_in_range_dedupes_case_insensitively() {
        let rows = vec![
            row("2025 03 01-09:00:00", "Asha", "Login", "1"),
            row("2025 03 02-09:00:00", "ASHA", "Login", "1"),
            row("2025 03 02-09:00:00", "Ravi", "Login", "2"),
            row("2025 02 01-09:00:00", "Zoya", "Login", "3"),
        ];
        assert_eq!(
            names_in_range(&rows, d(2025, 3, 1), d(2025, 3, 31)),
            vec!["Asha", "Ravi"]
        );
    }

    #[test]
    fn attendance_row_layout_is_fixed() {
        let row = attendance_row(
            "2025 03 01-18:00:00",
            "Asha",
            AttendanceAction::Logout,
            "42",
            Some("shipped the report"),
        );
        assert_eq!(
            row,
            vec![
                json!("2025 03 01-18:00:00"),
                json!("Asha"),
                json!("Logout"),
                json!("42"),
                json!("shipped the report"),
            ]
        );
    }
}
