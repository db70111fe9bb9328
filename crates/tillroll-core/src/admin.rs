//! Admin analytics
//!
//! The backend computes cross-user analytics; the client only decodes them
//! and offers display helpers. Field names vary between backend versions
//! (`totalSpending` vs `totalAmount`, `monthlySpending` vs `monthlyTrend`), so
//! both spellings are accepted and every field defaults when absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::null_as_default;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminAnalytics {
    #[serde(deserialize_with = "null_as_default")]
    pub total_users: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_receipts: u64,
    #[serde(alias = "totalAmount", deserialize_with = "null_as_default")]
    pub total_spending: f64,
    #[serde(alias = "categoryBreakdown", deserialize_with = "null_as_default")]
    pub spending_by_category: BTreeMap<String, f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub receipts_by_category: BTreeMap<String, u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub receipts_by_payment_method: BTreeMap<String, u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_receipt_count: BTreeMap<String, u64>,
    /// Spending per `YYYY-MM` month
    #[serde(alias = "monthlyTrend", deserialize_with = "null_as_default")]
    pub monthly_spending: BTreeMap<String, f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub top_spenders: Vec<TopSpender>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopSpender {
    #[serde(alias = "username")]
    pub name: String,
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total_spent: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub receipt_count: u64,
}

impl AdminAnalytics {
    pub fn average_per_user(&self) -> f64 {
        if self.total_users == 0 {
            0.0
        } else {
            self.total_spending / self.total_users as f64
        }
    }

    /// Monthly spending in ascending month order
    pub fn monthly_trend(&self) -> Vec<(&str, f64)> {
        // BTreeMap keys are already sorted, and `YYYY-MM` sorts chronologically
        self.monthly_spending
            .iter()
            .map(|(month, amount)| (month.as_str(), *amount))
            .collect()
    }

    /// Category spending, largest first
    pub fn categories_by_spending(&self) -> Vec<(&str, f64)> {
        let mut rows: Vec<(&str, f64)> = self
            .spending_by_category
            .iter()
            .map(|(category, amount)| (category.as_str(), *amount))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows
    }
}

/// "2024-03" → "Mar 2024"; anything unparseable is returned unchanged
pub fn month_label(month: &str) -> String {
    let parsed = month.split_once('-').and_then(|(year, m)| {
        let year: i32 = year.parse().ok()?;
        let m: usize = m.get(..2).unwrap_or(m).parse().ok()?;
        let name = MONTH_NAMES.get(m.checked_sub(1)?)?;
        Some(format!("{} {}", name, year))
    });
    parsed.unwrap_or_else(|| month.to_string())
}
