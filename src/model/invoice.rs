use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::google::sheets::CellValue;

/// Invoices rows:       [ts, company, invoice_no, value, comments].
/// Invoice Clears rows: [ts, invoice_no, value, comments].
/// Taxes rows:          [ts, invoice_no, tax_type, value, comments].
pub fn invoice_row(stamp: &str, company: &str, invoice_no: &str, value: f64, comments: &str) -> Vec<Value> {
    vec![
        json!(stamp),
        json!(company),
        json!(invoice_no),
        json!(value),
        json!(comments),
    ]
}

pub fn clear_row(stamp: &str, invoice_no: &str, value: f64, comments: &str) -> Vec<Value> {
    vec![json!(stamp), json!(invoice_no), json!(value), json!(comments)]
}

pub fn tax_row(stamp: &str, invoice_no: &str, tax_type: &str, value: f64, comments: &str) -> Vec<Value> {
    vec![
        json!(stamp),
        json!(invoice_no),
        json!(tax_type),
        json!(value),
        json!(comments),
    ]
}

/// A header row holds a label where data rows hold a number; checking
/// the value column tells them apart without a fixed header contract.
pub fn header_offset(rows: &[Vec<CellValue>], value_col: usize) -> usize {
    match rows.first() {
        Some(first) if first.len() > value_col && first[value_col].is_string() => 1,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceEntry {
    pub company: String,
    pub invoice_no: String,
    pub value: f64,
}

/// Aggregated view over the three finance sheets. Entries keep sheet
/// order for listing; the maps drive totals and per-invoice math.
#[derive(Debug, Default)]
pub struct FinanceSnapshot {
    pub entries: Vec<InvoiceEntry>,
    pub totals: BTreeMap<String, f64>,
    pub cleared: BTreeMap<String, f64>,
    pub companies: BTreeMap<String, String>,
    pub taxes_by_type: BTreeMap<String, f64>,
}

impl FinanceSnapshot {
    pub fn from_rows(
        invoices: &[Vec<CellValue>],
        clears: &[Vec<CellValue>],
        taxes: &[Vec<CellValue>],
    ) -> Self {
        let mut snap = Self::default();

        for row in invoices.iter().skip(header_offset(invoices, 3)) {
            if row.len() < 4 {
                continue;
            }
            let company = row[1].as_text();
            let invoice_no = row[2].as_text();
            let value = row[3].to_f64().unwrap_or(0.0);
            if invoice_no.is_empty() {
                continue;
            }
            *snap.totals.entry(invoice_no.clone()).or_insert(0.0) += value;
            snap.companies
                .entry(invoice_no.clone())
                .or_insert_with(|| company.clone());
            snap.entries.push(InvoiceEntry {
                company,
                invoice_no,
                value,
            });
        }

        for row in clears.iter().skip(header_offset(clears, 2)) {
            if row.len() < 3 {
                continue;
            }
            let invoice_no = row[1].as_text();
            if invoice_no.is_empty() {
                continue;
            }
            *snap.cleared.entry(invoice_no).or_insert(0.0) += row[2].to_f64().unwrap_or(0.0);
        }

        for row in taxes.iter().skip(header_offset(taxes, 3)) {
            if row.len() < 4 {
                continue;
            }
            let mut tax_type = row[2].as_text();
            if tax_type.is_empty() {
                tax_type = "Unspecified".to_string();
            }
            *snap.taxes_by_type.entry(tax_type).or_insert(0.0) += row[3].to_f64().unwrap_or(0.0);
        }

        snap
    }

    /// Never negative: over-clearing an invoice floors at zero.
    pub fn outstanding(&self, invoice_no: &str) -> f64 {
        let total = self.totals.get(invoice_no).copied().unwrap_or(0.0);
        let cleared = self.cleared.get(invoice_no).copied().unwrap_or(0.0);
        (total - cleared).max(0.0)
    }

    pub fn total_invoiced(&self) -> f64 {
        self.totals.values().sum()
    }

    pub fn total_cleared(&self) -> f64 {
        self.cleared.values().sum()
    }

    pub fn outstanding_total(&self) -> f64 {
        (self.total_invoiced() - self.total_cleared()).max(0.0)
    }

    /// (invoice_no, company, total, cleared, outstanding) filtered by
    /// a case-insensitive substring of invoice number or company, most
    /// outstanding first.
    pub fn autocomplete_rows(&self, query: &str) -> Vec<(String, String, f64, f64, f64)> {
        let q = query.trim().to_lowercase();
        let mut rows: Vec<(String, String, f64, f64, f64)> = self
            .totals
            .iter()
            .filter_map(|(invoice_no, &total)| {
                let company = self.companies.get(invoice_no).cloned().unwrap_or_default();
                if !q.is_empty()
                    && !invoice_no.to_lowercase().contains(&q)
                    && !company.to_lowercase().contains(&q)
                {
                    return None;
                }
                let cleared = self.cleared.get(invoice_no).copied().unwrap_or(0.0);
                let outstanding = self.outstanding(invoice_no);
                Some((invoice_no.clone(), company, total, cleared, outstanding))
            })
            .collect();
        rows.sort_by(|a, b| {
            b.4.partial_cmp(&a.4)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        rows
    }
}

/// ₹-style rendering with thousands separators, two decimals.
pub fn fmt_money(value: f64) -> String {
    group_digits(&format!("{value:.2}"))
}

/// Same grouping, no decimals. Autocomplete labels use this to stay
/// inside the 100-char limit.
pub fn fmt_money0(value: f64) -> String {
    group_digits(&format!("{value:.0}"))
}

fn group_digits(rendered: &str) -> String {
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cells(vals: Vec<Value>) -> Vec<CellValue> {
        vals.into_iter().map(CellValue).collect()
    }

    fn sample() -> FinanceSnapshot {
        let invoices = vec![
            cells(vec![
                json!("Timestamp"),
                json!("Company"),
                json!("Invoice #"),
                json!("Value"),
                json!("Comments"),
            ]),
            cells(vec![
                json!("2025-03-01 10:00:00"),
                json!("Acme"),
                json!("INV-1"),
                json!(100000.0),
                json!(""),
            ]),
            cells(vec![
                json!("2025-03-02 10:00:00"),
                json!("Globex"),
                json!("INV-2"),
                json!(50000.0),
                json!(""),
            ]),
            cells(vec![
                json!("2025-03-03 10:00:00"),
                json!("Acme"),
                json!("INV-1"),
                json!(25000.0),
                json!(""),
            ]),
        ];
        let clears = vec![
            cells(vec![
                json!("2025-03-05 10:00:00"),
                json!("INV-1"),
                json!(140000.0),
                json!(""),
            ]),
            cells(vec![
                json!("2025-03-06 10:00:00"),
                json!("INV-2"),
                json!(10000.0),
                json!(""),
            ]),
        ];
        let taxes = vec![
            cells(vec![
                json!("2025-03-07 10:00:00"),
                json!("INV-1"),
                json!("GST"),
                json!(18000.0),
                json!(""),
            ]),
            cells(vec![
                json!("2025-03-08 10:00:00"),
                json!("INV-2"),
                json!(""),
                json!(500.0),
                json!(""),
            ]),
        ];
        FinanceSnapshot::from_rows(&invoices, &clears, &taxes)
    }

    #[test]
    fn totals_accumulate_across_duplicate_invoice_rows() {
        let snap = sample();
        assert_eq!(snap.totals.get("INV-1"), Some(&125000.0));
        assert_eq!(snap.total_invoiced(), 175000.0);
        assert_eq!(snap.total_cleared(), 150000.0);
    }

    #[test]
    fn outstanding_floors_at_zero_per_invoice() {
        let snap = sample();
        // INV-1 over-cleared: 140k against 125k invoiced.
        assert_eq!(snap.outstanding("INV-1"), 0.0);
        assert_eq!(snap.outstanding("INV-2"), 40000.0);
        assert_eq!(snap.outstanding("INV-404"), 0.0);
    }

    #[test]
    fn blank_tax_type_buckets_as_unspecified() {
        let snap = sample();
        assert_eq!(snap.taxes_by_type.get("GST"), Some(&18000.0));
        assert_eq!(snap.taxes_by_type.get("Unspecified"), Some(&500.0));
    }

    #[test]
    fn header_offset_keys_off_value_column_type() {
        let with_header = vec![cells(vec![
            json!("Timestamp"),
            json!("Company"),
            json!("Invoice #"),
            json!("Value"),
        ])];
        assert_eq!(header_offset(&with_header, 3), 1);
        let no_header = vec![cells(vec![
            json!("2025-03-01"),
            json!("Acme"),
            json!("INV-1"),
            json!(100.0),
        ])];
        assert_eq!(header_offset(&no_header, 3), 0);
        assert_eq!(header_offset(&[], 3), 0);
    }

    #[test]
    fn autocomplete_sorts_by_outstanding_then_number() {
        let snap = sample();
        let rows = snap.autocomplete_rows("");
        assert_eq!(rows[0].0, "INV-2");
        assert_eq!(rows[1].0, "INV-1");

        let filtered = snap.autocomplete_rows("glo");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0, "INV-2");
    }

    #[test]
    fn money_formatting_groups_thousands() {
        assert_eq!(fmt_money(1234567.5), "1,234,567.50");
        assert_eq!(fmt_money(999.0), "999.00");
        assert_eq!(fmt_money0(125000.0), "125,000");
        assert_eq!(fmt_money0(0.0), "0");
    }

    #[test]
    fn row_builders_write_numeric_values() {
        let row = invoice_row("2025-03-01 10:00:00", "Acme", "INV-1", 125000.0, "Q1");
        assert_eq!(row[3], json!(125000.0));
        let row = tax_row("2025-03-01 10:00:00", "INV-1", "GST", 18000.0, "");
        assert_eq!(row[2], json!("GST"));
        assert_eq!(row[3], json!(18000.0));
        let row = clear_row("2025-03-01 10:00:00", "INV-1", 1000.0, "");
        assert_eq!(row.len(), 4);
    }
}
