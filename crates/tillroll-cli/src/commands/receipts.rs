//! Receipt command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tillroll_core::{
    format, AppContext, Attachment, FilterCriteria, Receipt, ReceiptDraft, SearchQuery,
};

use super::{confirm, print_notices, truncate};
use crate::cli::{FilterArgs, ReceiptFields};

impl FilterArgs {
    pub fn to_criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .search(self.search.as_deref())
            .category(self.category)
            .payment_method(self.payment)
            .date_from(self.from.as_deref())
            .date_to(self.to.as_deref())
    }
}

fn print_receipt_row(receipt: &Receipt) {
    let clip = if receipt.has_attachment() { "📎" } else { "  " };
    println!(
        "   [{:>4}] {} │ {:>14} │ {:<14} │ {:<14} {} {}",
        receipt.id,
        receipt.purchase_date,
        format::currency(receipt.total_amount),
        receipt.category.as_str(),
        format::payment_method_label(receipt.payment_method),
        clip,
        truncate(&receipt.store_name, 30)
    );
}

pub async fn cmd_receipts_list(app: &mut AppContext, filter: &FilterArgs) -> Result<()> {
    app.load_receipts().await?;
    let total = app.store().all().len();
    let receipts = app.apply_filter(filter.to_criteria()).to_vec();
    let active = app.store().active_filter_count();

    if total == 0 {
        println!("No receipts yet. Add one with:");
        println!("  tillroll receipts add --store \"Store\" --amount 100");
        return Ok(());
    }

    println!();
    if active > 0 {
        println!(
            "🧾 Receipts ({} of {}, {} filter{} active)",
            receipts.len(),
            total,
            active,
            if active == 1 { "" } else { "s" }
        );
    } else {
        println!("🧾 Receipts ({})", total);
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if receipts.is_empty() {
        println!("   No receipts match the current filters.");
        return Ok(());
    }

    for receipt in &receipts {
        print_receipt_row(receipt);
    }

    let sum: f64 = receipts.iter().map(|r| r.total_amount).sum();
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total: {}", format::currency(sum));

    Ok(())
}

pub async fn cmd_receipts_show(app: &mut AppContext, id: i64) -> Result<()> {
    let receipt = app.fetch_receipt(id).await?;

    println!();
    println!("🧾 {} (#{})", receipt.store_name, receipt.id);
    println!("   ─────────────────────────────────────");
    println!("   Date:      {}", format::date(receipt.purchase_date));
    println!("   Amount:    {}", format::currency(receipt.total_amount));
    println!("   Category:  {}", receipt.category);
    println!(
        "   Payment:   {}",
        format::payment_method_label(receipt.payment_method)
    );
    if receipt.has_attachment() {
        if let Some(url) = &receipt.file_url {
            println!("   File:      {}", url);
        }
    }
    if let Some(created) = receipt.created_at {
        println!("   Added:     {}", format::date(created.date()));
    }
    if let Some(updated) = receipt.updated_at {
        println!("   Updated:   {}", format::date(updated.date()));
    }

    Ok(())
}

fn read_attachment(path: Option<&Path>) -> Result<Option<Attachment>> {
    path.map(|p| {
        Attachment::from_path(p).with_context(|| format!("Cannot attach {}", p.display()))
    })
    .transpose()
}

pub async fn cmd_receipts_add(
    app: &mut AppContext,
    fields: &ReceiptFields,
    today: NaiveDate,
) -> Result<()> {
    let draft = ReceiptDraft {
        store_name: fields.store.clone().unwrap_or_default(),
        purchase_date: fields.date.unwrap_or(today),
        total_amount: fields.amount.unwrap_or_default(),
        category: fields.category.unwrap_or_default(),
        payment_method: fields.payment.unwrap_or_default(),
    };
    let attachment = read_attachment(fields.file.as_deref())?;

    let saved = app
        .save_receipt(None, &draft, attachment.as_ref())
        .await?;

    println!("✅ Receipt added successfully (#{})", saved.id);
    print_receipt_row(&saved);
    print_notices(app);
    Ok(())
}

pub async fn cmd_receipts_edit(app: &mut AppContext, id: i64, fields: &ReceiptFields) -> Result<()> {
    // Pre-fill from the collection, falling back to a direct fetch
    app.load_receipts().await?;
    let mut draft = match app.edit_draft(id) {
        Ok(draft) => draft,
        Err(_) => ReceiptDraft::from_receipt(&app.fetch_receipt(id).await?),
    };

    if let Some(store) = &fields.store {
        draft.store_name = store.clone();
    }
    if let Some(amount) = fields.amount {
        draft.total_amount = amount;
    }
    if let Some(date) = fields.date {
        draft.purchase_date = date;
    }
    if let Some(category) = fields.category {
        draft.category = category;
    }
    if let Some(payment) = fields.payment {
        draft.payment_method = payment;
    }
    let attachment = read_attachment(fields.file.as_deref())?;

    let saved = app
        .save_receipt(Some(id), &draft, attachment.as_ref())
        .await?;

    println!("✅ Receipt updated successfully");
    print_receipt_row(&saved);
    print_notices(app);
    Ok(())
}

pub async fn cmd_receipts_delete(app: &mut AppContext, id: i64, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("⚠️  This will permanently delete receipt #{}.", id))? {
        println!("Cancelled.");
        return Ok(());
    }

    app.delete_receipt(id).await?;
    println!("🗑️  Receipt deleted successfully");
    if app.has_notices() {
        print_notices(app);
    } else {
        println!("   {} receipts remaining", app.store().all().len());
    }
    Ok(())
}

pub async fn cmd_receipts_search(app: &mut AppContext, query: &SearchQuery) -> Result<()> {
    let page = app.search_receipts(query).await?;

    println!();
    match (page.total_elements, page.total_pages) {
        (Some(total), Some(pages)) => println!(
            "🔍 Search results ({} total, page {} of {})",
            total,
            query.page + 1,
            pages.max(1)
        ),
        _ => println!("🔍 Search results ({})", page.content.len()),
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if page.content.is_empty() {
        println!("   Nothing found.");
        return Ok(());
    }

    for receipt in &page.content {
        print_receipt_row(receipt);
    }

    if !page.is_last(query.size.unwrap_or(u32::MAX)) {
        println!();
        println!("   More results: --page {}", query.page + 1);
    }

    Ok(())
}
