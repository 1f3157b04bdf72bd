use anyhow::{Context, Result};
use serde_json::json;
use tracing::warn;

use crate::api::interactions::Ctx;
use crate::discord::interaction::Interaction;
use crate::discord::rest;
use crate::discord::response::InteractionResponse;
use crate::google::sheets::{self, CellValue, ValueInput};
use crate::model::invoice::{
    FinanceSnapshot, clear_row, fmt_money, fmt_money0, invoice_row, tax_row,
};
use crate::utils::dates::ist_timestamp;

const INVOICES_RANGE: &str = "'Invoices'!A:E";
const CLEARS_RANGE: &str = "'Invoice Clears'!A:D";
const TAXES_RANGE: &str = "'Taxes'!A:E";

const LIST_LIMIT: usize = 10;

async fn snapshot(ctx: &Ctx<'_>) -> Result<FinanceSnapshot> {
    let read = |range: &'static str| {
        sheets::read_range(ctx.http, &ctx.config.service_account, &ctx.config.sheet_id, range)
    };
    let invoices = read(INVOICES_RANGE).await.context("reading invoices")?;
    let clears = read(CLEARS_RANGE).await.context("reading invoice clears")?;
    let taxes = read(TAXES_RANGE).await.context("reading taxes")?;
    Ok(FinanceSnapshot::from_rows(&invoices, &clears, &taxes))
}

/// Public card mirrored into the finance channel so the ledger isn't
/// only visible to whoever ran the ephemeral command.
fn spawn_finance_card(ctx: &Ctx<'_>, card: String) {
    if ctx.config.finance_channel_id.is_empty() {
        return;
    }
    let config = ctx.config.clone();
    let http = ctx.http.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = rest::post_message(
            &http,
            &config.bot_token,
            &config.finance_channel_id,
            json!({"content": card}),
        )
        .await
        {
            warn!(error = format!("{e:#}"), "finance card post failed");
        }
    });
}

pub async fn record_invoice(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let company = interaction.option_str("companyname");
    let invoice_no = interaction.option_str("invoicenumber");
    let value = interaction.option_f64("invoicevalue");
    let comments = interaction.option_str("comments").unwrap_or_default();
    let (Some(company), Some(invoice_no), Some(value)) = (company, invoice_no, value) else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Missing fields. Required: CompanyName, InvoiceNumber, InvoiceValue.",
        ));
    };

    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        INVOICES_RANGE,
        invoice_row(&ist_timestamp(), &company, &invoice_no, value, &comments),
        ValueInput::UserEntered,
    )
    .await
    .context("recording invoice")?;

    let recorder = interaction.invoker().name;
    spawn_finance_card(
        ctx,
        format!(
            "🧾 **Invoice recorded**\n• **{invoice_no}** — {company}\n• Amount: ₹{}\n• By: {recorder}",
            fmt_money(value)
        ),
    );
    Ok(InteractionResponse::ephemeral(format!(
        "✅ Invoice **{invoice_no}** recorded for **{company}** (₹{}).",
        fmt_money(value)
    )))
}

pub async fn clear_invoice(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let invoice_no = interaction.option_str("invoicenumber");
    let value = interaction.option_f64("valuecleared");
    let comments = interaction.option_str("comments").unwrap_or_default();
    let (Some(invoice_no), Some(value)) = (invoice_no, value) else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Missing fields. Required: InvoiceNumber, ValueCleared.",
        ));
    };

    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        CLEARS_RANGE,
        clear_row(&ist_timestamp(), &invoice_no, value, &comments),
        ValueInput::UserEntered,
    )
    .await
    .context("recording clearance")?;

    let recorder = interaction.invoker().name;
    spawn_finance_card(
        ctx,
        format!(
            "💳 **Payment cleared**\n• **{invoice_no}**\n• Amount: ₹{}\n• By: {recorder}",
            fmt_money(value)
        ),
    );
    Ok(InteractionResponse::ephemeral(format!(
        "✅ Recorded ₹{} cleared for **{invoice_no}**.",
        fmt_money(value)
    )))
}

pub async fn record_tax(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let invoice_no = interaction.option_str("invoicenumber");
    let tax_type = interaction.option_str("taxtype");
    let value = interaction.option_f64("taxvalue");
    let comments = interaction.option_str("comments").unwrap_or_default();
    let (Some(invoice_no), Some(tax_type), Some(value)) = (invoice_no, tax_type, value) else {
        return Ok(InteractionResponse::ephemeral(
            "❌ Missing fields. Required: InvoiceNumber, TaxType, TaxValue.",
        ));
    };

    sheets::append_row(
        ctx.http,
        &ctx.config.service_account,
        &ctx.config.sheet_id,
        TAXES_RANGE,
        tax_row(&ist_timestamp(), &invoice_no, &tax_type, value, &comments),
        ValueInput::UserEntered,
    )
    .await
    .context("recording tax")?;

    let recorder = interaction.invoker().name;
    spawn_finance_card(
        ctx,
        format!(
            "🧾 **Tax recorded**\n• **{invoice_no}** — {tax_type}\n• Amount: ₹{}\n• By: {recorder}",
            fmt_money(value)
        ),
    );
    Ok(InteractionResponse::ephemeral(format!(
        "✅ Tax recorded for **{invoice_no}** — {tax_type} ₹{}.",
        fmt_money(value)
    )))
}

pub async fn view_invoice(ctx: &Ctx<'_>, interaction: &Interaction) -> Result<InteractionResponse> {
    let snap = snapshot(ctx).await?;

    if let Some(invoice_no) = interaction.option_str("invoicenumber") {
        let Some(&total) = snap.totals.get(&invoice_no) else {
            return Ok(InteractionResponse::ephemeral(format!(
                "❌ No invoice found for **{invoice_no}**."
            )));
        };
        let company = snap.companies.get(&invoice_no).cloned().unwrap_or_default();
        let cleared = snap.cleared.get(&invoice_no).copied().unwrap_or(0.0);
        return Ok(InteractionResponse::ephemeral(format!(
            "🧾 **Invoice {invoice_no}** — {company}\n\
             • Invoiced: **₹{}**\n\
             • Cleared: **₹{}**\n\
             • Outstanding: **₹{}**",
            fmt_money(total),
            fmt_money(cleared),
            fmt_money(snap.outstanding(&invoice_no))
        )));
    }

    let lines: Vec<String> = snap
        .entries
        .iter()
        .take(LIST_LIMIT)
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. **{}** — {} • ₹{} • Outst.: ₹{}",
                i + 1,
                entry.invoice_no,
                entry.company,
                fmt_money(entry.value),
                fmt_money(snap.outstanding(&entry.invoice_no))
            )
        })
        .collect();
    let extra = if snap.entries.len() > LIST_LIMIT {
        format!("\n…plus {} more.", snap.entries.len() - LIST_LIMIT)
    } else {
        String::new()
    };
    let body = if lines.is_empty() {
        "No invoices found.".to_string()
    } else {
        lines.join("\n")
    };
    Ok(InteractionResponse::ephemeral(format!("🧾 **Invoices**\n{body}{extra}")))
}

pub async fn view_fin_status(ctx: &Ctx<'_>) -> Result<InteractionResponse> {
    let snap = snapshot(ctx).await?;
    let tax_lines: Vec<String> = if snap.taxes_by_type.is_empty() {
        vec!["• (none)".to_string()]
    } else {
        snap.taxes_by_type
            .iter()
            .map(|(kind, value)| format!("• {kind}: ₹{}", fmt_money(*value)))
            .collect()
    };
    Ok(InteractionResponse::ephemeral(format!(
        "💼 **Finance Status**\n\
         • Total Invoiced: **₹{}**\n\
         • Total Cleared: **₹{}**\n\
         • Outstanding: **₹{}**\n\n\
         🧾 **Taxes recorded (by type)**\n{}",
        fmt_money(snap.total_invoiced()),
        fmt_money(snap.total_cleared()),
        fmt_money(snap.outstanding_total()),
        tax_lines.join("\n")
    )))
}

/// Autocomplete labels stay inside Discord's 100-char cap by using
/// the no-decimals rendering.
pub async fn invoice_choices(ctx: &Ctx<'_>, query: &str) -> Result<Vec<(String, String)>> {
    let snap = snapshot(ctx).await?;
    Ok(snap
        .autocomplete_rows(query)
        .into_iter()
        .map(|(invoice_no, company, _total, cleared, outstanding)| {
            let label = format!(
                "{invoice_no} — {company} (Out: ₹{}, Clr: ₹{})",
                fmt_money0(outstanding),
                fmt_money0(cleared)
            );
            (label, invoice_no)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn rows(data: Vec<Vec<Value>>) -> Vec<Vec<CellValue>> {
        data.into_iter()
            .map(|row| row.into_iter().map(CellValue).collect())
            .collect()
    }

    #[test]
    fn choice_labels_carry_outstanding_and_cleared() {
        let snap = FinanceSnapshot::from_rows(
            &rows(vec![vec![
                json!("ts"),
                json!("Acme"),
                json!("INV-1"),
                json!(150000.0),
                json!(""),
            ]]),
            &rows(vec![vec![json!("ts"), json!("INV-1"), json!(50000.0), json!("")]]),
            &rows(vec![]),
        );
        let (invoice_no, company, _total, cleared, outstanding) =
            snap.autocomplete_rows("").remove(0);
        let label = format!(
            "{invoice_no} — {company} (Out: ₹{}, Clr: ₹{})",
            fmt_money0(outstanding),
            fmt_money0(cleared)
        );
        assert_eq!(label, "INV-1 — Acme (Out: ₹100,000, Clr: ₹50,000)");
    }
}
