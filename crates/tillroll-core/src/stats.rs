//! Dashboard statistics
//!
//! Pure aggregation over the loaded receipt collection. The caller supplies
//! "now" so results are reproducible; nothing here reads the clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Category, Receipt};

/// Monthly budget used when none is configured
pub const DEFAULT_MONTHLY_BUDGET: f64 = 50_000.0;

/// Percent change reported when last month had no spending and this month does
pub const PERCENT_CHANGE_FROM_ZERO: f64 = 100.0;

/// Number of receipts in the "recent" list
pub const RECENT_LIMIT: usize = 5;

/// Trailing window for the weekly total
const WEEK_DAYS: i64 = 7;

/// Spending for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
    pub count: usize,
}

/// Current month compared with the previous calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOverMonth {
    pub previous_month_spent: f64,
    pub previous_month_receipts: usize,
    /// Percent change of monthly spending (see `percent_change`)
    pub spent_change_pct: f64,
    /// This month's receipt count minus last month's
    pub receipt_change: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl MonthOverMonth {
    pub fn spent_direction(&self) -> TrendDirection {
        direction(self.spent_change_pct)
    }

    pub fn receipt_direction(&self) -> TrendDirection {
        direction(self.receipt_change as f64)
    }
}

fn direction(delta: f64) -> TrendDirection {
    if delta > 0.0 {
        TrendDirection::Up
    } else if delta < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    }
}

/// Everything the dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_receipts: usize,
    pub total_spent: f64,
    pub average_receipt: f64,
    pub monthly_spent: f64,
    pub monthly_receipts: usize,
    pub weekly_spent: f64,
    pub highest_receipt: f64,
    /// Category with the largest total; ties go to the first category seen
    pub top_category: Option<Category>,
    pub remaining_budget: f64,
    /// Per-category totals in first-encountered order
    pub categories: Vec<CategoryTotal>,
    pub trend: MonthOverMonth,
    /// Most recently created receipts, newest first
    pub recent: Vec<Receipt>,
}

impl DashboardStats {
    pub fn is_empty(&self) -> bool {
        self.total_receipts == 0
    }
}

/// Compute dashboard statistics for `receipts` as of `now`
pub fn aggregate(receipts: &[Receipt], now: NaiveDateTime, monthly_budget: f64) -> DashboardStats {
    let today = now.date();
    let (prev_year, prev_month) = previous_month(today);
    let week_start = now - Duration::days(WEEK_DAYS);

    let mut total_spent = 0.0;
    let mut monthly_spent = 0.0;
    let mut monthly_receipts = 0usize;
    let mut previous_spent = 0.0;
    let mut previous_receipts = 0usize;
    let mut weekly_spent = 0.0;
    let mut highest_receipt = 0.0_f64;
    let mut categories: Vec<CategoryTotal> = Vec::new();

    for receipt in receipts {
        let amount = receipt.total_amount;
        let date = receipt.purchase_date;
        total_spent += amount;
        highest_receipt = highest_receipt.max(amount);

        if date.year() == today.year() && date.month() == today.month() {
            monthly_spent += amount;
            monthly_receipts += 1;
        }

        if date.year() == prev_year && date.month() == prev_month {
            previous_spent += amount;
            previous_receipts += 1;
        }

        if let Some(purchased_at) = date.and_hms_opt(0, 0, 0) {
            if purchased_at >= week_start && purchased_at <= now {
                weekly_spent += amount;
            }
        }

        match categories.iter_mut().find(|c| c.category == receipt.category) {
            Some(entry) => {
                entry.amount += amount;
                entry.count += 1;
            }
            None => categories.push(CategoryTotal {
                category: receipt.category,
                amount,
                count: 1,
            }),
        }
    }

    let total_receipts = receipts.len();
    let average_receipt = if total_receipts > 0 {
        total_spent / total_receipts as f64
    } else {
        0.0
    };

    DashboardStats {
        total_receipts,
        total_spent,
        average_receipt,
        monthly_spent,
        monthly_receipts,
        weekly_spent,
        highest_receipt,
        top_category: top_category(&categories),
        remaining_budget: (monthly_budget - monthly_spent).max(0.0),
        categories,
        trend: MonthOverMonth {
            previous_month_spent: previous_spent,
            previous_month_receipts: previous_receipts,
            spent_change_pct: percent_change(previous_spent, monthly_spent),
            receipt_change: monthly_receipts as i64 - previous_receipts as i64,
        },
        recent: recent_receipts(receipts, RECENT_LIMIT),
    }
}

/// Stable first-max: a later category must be strictly larger to win
pub fn top_category(categories: &[CategoryTotal]) -> Option<Category> {
    let mut best: Option<&CategoryTotal> = None;
    for entry in categories {
        match best {
            Some(current) if entry.amount <= current.amount => {}
            _ => best = Some(entry),
        }
    }
    best.map(|c| c.category)
}

/// Percent change from `previous` to `current`
///
/// Both zero gives 0. A zero baseline with non-zero current spending gives
/// `PERCENT_CHANGE_FROM_ZERO`.
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            PERCENT_CHANGE_FROM_ZERO
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

/// The `limit` most recently created receipts; receipts without a timestamp sort last
pub fn recent_receipts(receipts: &[Receipt], limit: usize) -> Vec<Receipt> {
    let mut sorted: Vec<&Receipt> = receipts.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(limit).cloned().collect()
}

/// (year, month) of the calendar month before `date`
fn previous_month(date: NaiveDate) -> (i32, u32) {
    if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    }
}
