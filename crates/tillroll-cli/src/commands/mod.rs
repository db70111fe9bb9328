//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config resolution, context, prompts)
//! - `auth` - Login, registration, logout
//! - `profile` - Profile and theme preference
//! - `dashboard` - Monthly spending overview
//! - `receipts` - Receipt list/show/add/edit/delete/search
//! - `admin` - User management and analytics (admin role only)

pub mod admin;
pub mod auth;
pub mod core;
pub mod dashboard;
pub mod profile;
pub mod receipts;

// Re-export command functions for main.rs
pub use admin::*;
pub use auth::*;
pub use core::*;
pub use dashboard::*;
pub use profile::*;
pub use receipts::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
