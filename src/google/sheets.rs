use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::google::auth::{SCOPE_SHEETS, ServiceAccountKey, access_token};

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// How appended values are interpreted by the sheet. UserEntered lets
/// the sheet coerce dates and numbers; Raw stores strings verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput {
    UserEntered,
    Raw,
}

impl ValueInput {
    fn as_param(self) -> &'static str {
        match self {
            Self::UserEntered => "USER_ENTERED",
            Self::Raw => "RAW",
        }
    }
}

/// One cell as returned by values.get. Unformatted reads hand back
/// numbers for date cells and strings for text, so every consumer
/// goes through these coercers instead of matching on JSON directly.
#[derive(Debug, Clone, PartialEq)]
pub struct CellValue(pub Value);

impl CellValue {
    pub fn as_text(&self) -> String {
        match &self.0 {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else {
                    n.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Numeric view. Strings are accepted with currency symbols and
    /// thousands separators stripped, matching what USER_ENTERED rows
    /// look like when the sheet kept them as text.
    pub fn to_f64(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !matches!(c, ',' | '₹' | '$' | ' '))
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse().ok()
                }
            }
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_f64().map(|f| f.round() as i64)
    }

    /// Serial-number view of a date cell. Only numeric cells qualify;
    /// string timestamps go through the parse chain instead.
    pub fn as_serial(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(&self.0, Value::String(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRangeBody {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// A1 ranges carry quotes and spaces ('Leave Requests'!A:F) that must
/// survive the URL path.
fn encode_range(range: &str) -> String {
    let mut out = String::with_capacity(range.len());
    for byte in range.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'!' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// values.get with unformatted cells and serial-number dates, the two
/// render options the date handling in this crate assumes.
pub async fn read_range(
    http: &Client,
    key: &ServiceAccountKey,
    sheet_id: &str,
    range: &str,
) -> Result<Vec<Vec<CellValue>>> {
    let token = access_token(http, key, SCOPE_SHEETS, None).await?;
    let url = format!(
        "{SHEETS_BASE}/{sheet_id}/values/{}?valueRenderOption=UNFORMATTED_VALUE&dateTimeRenderOption=SERIAL_NUMBER",
        encode_range(range)
    );
    let resp = http
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .context("sheets read: request error")?;
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("sheets read {range} failed: {status} {body}");
    }
    let parsed: ValueRangeBody =
        serde_json::from_str(&body).context("sheets read: unexpected response shape")?;
    Ok(parsed
        .values
        .into_iter()
        .map(|row| row.into_iter().map(CellValue).collect())
        .collect())
}

/// values.append of a single row at the end of `range`.
pub async fn append_row(
    http: &Client,
    key: &ServiceAccountKey,
    sheet_id: &str,
    range: &str,
    row: Vec<Value>,
    input: ValueInput,
) -> Result<()> {
    let token = access_token(http, key, SCOPE_SHEETS, None).await?;
    let url = format!(
        "{SHEETS_BASE}/{sheet_id}/values/{}:append?valueInputOption={}&insertDataOption=INSERT_ROWS",
        encode_range(range),
        input.as_param()
    );
    let resp = http
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({"values": [row]}))
        .send()
        .await
        .context("sheets append: request error")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("sheets append {range} failed: {status} {body}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_view_normalizes_numbers_and_trims() {
        assert_eq!(CellValue(json!("  INV-7 ")).as_text(), "INV-7");
        assert_eq!(CellValue(json!(1042)).as_text(), "1042");
        assert_eq!(CellValue(json!(1042.0)).as_text(), "1042");
        assert_eq!(CellValue(json!(null)).as_text(), "");
    }

    #[test]
    fn numeric_view_strips_currency_noise() {
        assert_eq!(CellValue(json!("₹1,25,000")).to_f64(), Some(125000.0));
        assert_eq!(CellValue(json!("12,500.50")).to_f64(), Some(12500.5));
        assert_eq!(CellValue(json!(99)).to_f64(), Some(99.0));
        assert_eq!(CellValue(json!("n/a")).to_f64(), None);
        assert_eq!(CellValue(json!("")).to_f64(), None);
    }

    #[test]
    fn serial_view_rejects_strings() {
        assert_eq!(CellValue(json!(45000.5)).as_serial(), Some(45000.5));
        assert_eq!(CellValue(json!("45000")).as_serial(), None);
    }

    #[test]
    fn emptiness_covers_null_and_blank() {
        assert!(CellValue(json!(null)).is_empty());
        assert!(CellValue(json!("   ")).is_empty());
        assert!(!CellValue(json!(0)).is_empty());
        assert!(!CellValue(json!("x")).is_empty());
    }

    #[test]
    fn range_encoding_preserves_a1_and_escapes_quotes() {
        assert_eq!(encode_range("Attendance!A:E"), "Attendance!A:E");
        assert_eq!(
            encode_range("'Leave Requests'!A:F"),
            "%27Leave%20Requests%27!A:F"
        );
    }

}
