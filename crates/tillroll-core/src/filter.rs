//! Client-side receipt filtering
//!
//! `FilterCriteria` is the transient set of constraints taken from the filter
//! form. Every non-empty criterion must hold for a receipt to pass (AND).
//! Text fields are kept raw so that a malformed date narrows the result to
//! nothing instead of producing an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Category, PaymentMethod, Receipt};

/// Date format accepted for the date bounds
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub date_to: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set search text (matches store name or category)
    pub fn search(mut self, query: Option<&str>) -> Self {
        self.search = query.map(str::to_string);
        self
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn payment_method(mut self, method: Option<PaymentMethod>) -> Self {
        self.payment_method = method;
        self
    }

    pub fn date_from(mut self, date: Option<&str>) -> Self {
        self.date_from = date.map(str::to_string);
        self
    }

    pub fn date_to(mut self, date: Option<&str>) -> Self {
        self.date_to = date.map(str::to_string);
        self
    }

    /// Number of non-empty criteria (shown as the "N active" badge)
    pub fn active_count(&self) -> usize {
        [
            non_blank(&self.search).is_some(),
            self.category.is_some(),
            self.payment_method.is_some(),
            non_blank(&self.date_from).is_some(),
            non_blank(&self.date_to).is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Produce the ordered subsequence of `receipts` that satisfies every criterion
    pub fn apply(&self, receipts: &[Receipt]) -> Vec<Receipt> {
        let compiled = self.compile();
        receipts
            .iter()
            .filter(|r| compiled.matches(r))
            .cloned()
            .collect()
    }

    /// Test a single receipt
    pub fn matches(&self, receipt: &Receipt) -> bool {
        self.compile().matches(receipt)
    }

    fn compile(&self) -> CompiledFilter {
        CompiledFilter {
            search: non_blank(&self.search).map(str::to_lowercase),
            category: self.category,
            payment_method: self.payment_method,
            date_from: non_blank(&self.date_from).map(parse_bound),
            date_to: non_blank(&self.date_to).map(parse_bound),
        }
    }
}

/// Criteria with the text parsed once per `apply`
struct CompiledFilter {
    search: Option<String>,
    category: Option<Category>,
    payment_method: Option<PaymentMethod>,
    // Outer Option: bound present. Inner Option: bound parsed.
    date_from: Option<Option<NaiveDate>>,
    date_to: Option<Option<NaiveDate>>,
}

impl CompiledFilter {
    fn matches(&self, receipt: &Receipt) -> bool {
        if let Some(ref needle) = self.search {
            let in_store = receipt.store_name.to_lowercase().contains(needle.as_str());
            let in_category = receipt
                .category
                .as_str()
                .to_lowercase()
                .contains(needle.as_str());
            if !in_store && !in_category {
                return false;
            }
        }

        if let Some(category) = self.category {
            if receipt.category != category {
                return false;
            }
        }

        if let Some(method) = self.payment_method {
            if receipt.payment_method != method {
                return false;
            }
        }

        match self.date_from {
            Some(Some(from)) if receipt.purchase_date < from => return false,
            Some(None) => return false,
            _ => {}
        }

        match self.date_to {
            Some(Some(to)) if receipt.purchase_date > to => return false,
            Some(None) => return false,
            _ => {}
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}
