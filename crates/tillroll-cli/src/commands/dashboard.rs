//! Dashboard command

use anyhow::Result;
use chrono::NaiveDateTime;
use tillroll_core::stats::TrendDirection;
use tillroll_core::{format, AppContext, DashboardStats};

use super::truncate;

pub async fn cmd_dashboard(app: &mut AppContext, now: NaiveDateTime) -> Result<()> {
    app.load_receipts().await?;
    let stats = app.dashboard(now);
    print_dashboard(&stats);
    Ok(())
}

fn trend_arrow(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Up => "▲",
        TrendDirection::Down => "▼",
        TrendDirection::Flat => "■",
    }
}

pub fn print_dashboard(stats: &DashboardStats) {
    println!();
    println!("📊 Dashboard");
    println!("   ─────────────────────────────────────────────────────────────");

    if stats.is_empty() {
        println!("   No receipts yet. Add one with:");
        println!("     tillroll receipts add --store \"Store\" --amount 100");
        return;
    }

    println!(
        "   This month:      {:>14}  ({} receipts)",
        format::currency(stats.monthly_spent),
        stats.monthly_receipts
    );
    println!(
        "   vs last month:   {} {} spend, {} {:+} receipts",
        trend_arrow(stats.trend.spent_direction()),
        format::percent(stats.trend.spent_change_pct),
        trend_arrow(stats.trend.receipt_direction()),
        stats.trend.receipt_change
    );
    println!("   Last 7 days:     {:>14}", format::currency(stats.weekly_spent));
    println!(
        "   Budget left:     {:>14}",
        format::currency(stats.remaining_budget)
    );
    println!();
    println!(
        "   All time:        {:>14}  ({} receipts)",
        format::currency(stats.total_spent),
        stats.total_receipts
    );
    println!(
        "   Average:         {:>14}",
        format::currency(stats.average_receipt)
    );
    println!(
        "   Highest:         {:>14}",
        format::currency(stats.highest_receipt)
    );
    if let Some(top) = stats.top_category {
        println!("   Top category:    {}", top);
    }

    println!();
    println!("   By category");
    for entry in &stats.categories {
        let share = if stats.total_spent > 0.0 {
            entry.amount / stats.total_spent * 100.0
        } else {
            0.0
        };
        println!(
            "   {:<16} {:>14}  {:>5.1}%  ({})",
            entry.category.as_str(),
            format::currency(entry.amount),
            share,
            entry.count
        );
    }

    println!();
    println!("   Recent");
    for receipt in &stats.recent {
        println!(
            "   {} │ {:>14} │ {}",
            format::date(receipt.purchase_date),
            format::currency(receipt.total_amount),
            truncate(&receipt.store_name, 30)
        );
    }
}
