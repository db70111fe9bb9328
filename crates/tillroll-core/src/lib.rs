//! Tillroll Core Library
//!
//! Client-side core of the Tillroll receipt tracker:
//! - Receipt store with ticketed loads and a derived filtered view
//! - Filter engine (text, category, payment method, date range)
//! - Dashboard aggregation (totals, windows, month-over-month trend)
//! - REST client for the receipt backend
//! - Session storage and the admin role gate
//! - Layered configuration

pub mod admin;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod models;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;

/// Test utilities including the mock receipt backend
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use admin::{month_label, AdminAnalytics, TopSpender};
pub use api::ApiClient;
pub use app::AppContext;
pub use config::Config;
pub use error::{Error, Result};
pub use filter::FilterCriteria;
pub use models::{
    Attachment, Category, Page, PaymentMethod, Receipt, ReceiptDraft, Role, SearchQuery, Theme,
    User,
};
pub use session::Session;
pub use stats::{aggregate, CategoryTotal, DashboardStats, MonthOverMonth, TrendDirection};
pub use storage::LocalStorage;
pub use store::{LoadTicket, ReceiptStore};
