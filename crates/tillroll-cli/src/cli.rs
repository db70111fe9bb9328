//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tillroll_core::{Category, PaymentMethod};

/// Tillroll - Keep track of every receipt
#[derive(Parser)]
#[command(name = "tillroll")]
#[command(about = "Receipt and expense tracker client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides config and TILLROLL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory for the local session file (overrides config and TILLROLL_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config override file (defaults to ~/.config/tillroll/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and save the session locally
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prompted without echo if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create a new account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Password (prompted without echo if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the logged-in user's profile
    Profile {
        /// Re-read the profile from the server
        #[arg(long)]
        refresh: bool,
    },

    /// Spending overview for the current month
    Dashboard,

    /// List and manage receipts
    Receipts {
        #[command(subcommand)]
        action: Option<ReceiptsAction>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Admin-only user management and analytics
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Show or change the theme preference
    Theme {
        /// New theme (shows the current one if omitted)
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
}

/// Client-side filter flags
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Text to find in the store name or category
    #[arg(short, long)]
    pub search: Option<String>,

    /// Category (e.g. FOOD, dining)
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Payment method (e.g. UPI, credit-card)
    #[arg(short, long)]
    pub payment: Option<PaymentMethod>,

    /// Earliest purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

/// Fields of a receipt form
#[derive(Args, Debug, Clone, Default)]
pub struct ReceiptFields {
    /// Store name
    #[arg(long)]
    pub store: Option<String>,

    /// Total amount
    #[arg(long)]
    pub amount: Option<f64>,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub category: Option<Category>,

    #[arg(long)]
    pub payment: Option<PaymentMethod>,

    /// Receipt image or PDF to attach (max 10 MB)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ReceiptsAction {
    /// List receipts, optionally filtered
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one receipt
    Show { id: i64 },

    /// Add a receipt (--store and --amount are required)
    Add {
        #[command(flatten)]
        fields: ReceiptFields,
    },

    /// Edit a receipt; only the given fields change
    Edit {
        id: i64,

        #[command(flatten)]
        fields: ReceiptFields,
    },

    /// Delete a receipt
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Search on the server
    Search {
        /// Store name contains
        #[arg(long)]
        store: Option<String>,

        #[arg(long)]
        category: Option<Category>,

        /// Earliest purchase date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest purchase date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Page number (0-based)
        #[arg(long, default_value = "0")]
        page: u32,

        /// Page size
        #[arg(long)]
        size: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// List all users
    Users,

    /// Delete a user and their receipts
    DeleteUser {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Cross-user spending analytics
    Analytics,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}
