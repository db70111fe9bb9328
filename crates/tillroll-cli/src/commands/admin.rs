//! Admin commands: users and analytics

use anyhow::Result;
use tillroll_core::{format, month_label, AppContext};

use super::{confirm, print_notices, truncate};

pub async fn cmd_admin_users(app: &mut AppContext) -> Result<()> {
    let users = app.load_users().await?;

    println!();
    println!("👥 Users ({})", users.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for user in users {
        let joined = user
            .created_at
            .map(|ts| format::date(ts.date()))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "   [{:>4}] {:<24} │ {:<30} │ {:<5} │ {}",
            user.id,
            truncate(&user.name, 24),
            truncate(&user.email, 30),
            user.role,
            joined
        );
    }

    Ok(())
}

pub async fn cmd_admin_delete_user(app: &mut AppContext, id: i64, yes: bool) -> Result<()> {
    // Fail on the role gate before asking anything
    app.session().require_admin()?;

    if !yes
        && !confirm(&format!(
            "⚠️  This will delete user #{} and all of their receipts.",
            id
        ))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    app.delete_user(id).await?;
    println!("🗑️  User deleted successfully");
    if app.has_notices() {
        print_notices(app);
    } else {
        println!("   {} users remaining", app.users().len());
    }
    Ok(())
}

pub async fn cmd_admin_analytics(app: &mut AppContext) -> Result<()> {
    let analytics = app.load_analytics().await?;

    println!();
    println!("📈 Analytics");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Users:           {:>14}", analytics.total_users);
    println!("   Receipts:        {:>14}", analytics.total_receipts);
    println!(
        "   Total spending:  {:>14}",
        format::currency(analytics.total_spending)
    );
    println!(
        "   Avg per user:    {:>14}",
        format::currency(analytics.average_per_user())
    );

    let categories = analytics.categories_by_spending();
    if !categories.is_empty() {
        println!();
        println!("   Spending by category");
        for (category, amount) in categories {
            println!("   {:<16} {:>14}", category, format::currency(amount));
        }
    }

    let trend = analytics.monthly_trend();
    if !trend.is_empty() {
        println!();
        println!("   Monthly trend");
        for (month, amount) in trend {
            println!("   {:<16} {:>14}", month_label(month), format::currency(amount));
        }
    }

    println!();
    println!("   Top spenders");
    if analytics.top_spenders.is_empty() {
        println!("   No spending data yet.");
    }
    for (rank, spender) in analytics.top_spenders.iter().enumerate() {
        println!(
            "   {}. {:<20} {:<28} {:>14}  ({} receipts)",
            rank + 1,
            truncate(&spender.name, 20),
            truncate(&spender.email, 28),
            format::currency(spender.total_spent),
            spender.receipt_count
        );
    }

    Ok(())
}
