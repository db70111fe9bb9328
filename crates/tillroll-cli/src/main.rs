//! Tillroll CLI - Receipt and expense tracker client
//!
//! Usage:
//!   tillroll login --email E          Log in (prompts for the password)
//!   tillroll dashboard                This month's spending overview
//!   tillroll receipts --category FOOD List receipts with filters
//!   tillroll receipts add --store S --amount A [--file F]
//!   tillroll admin analytics          Cross-user analytics (admin only)

mod cli;
mod commands;


use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tillroll_core::SearchQuery;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(
        cli.config.as_deref(),
        cli.api_url.as_deref(),
        cli.data_dir.clone(),
    )?;
    let mut app = commands::open_app(config)?;
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Login { email, password } => {
            let password = commands::read_password(password)?;
            commands::cmd_login(&mut app, &email, &password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = commands::read_password(password)?;
            commands::cmd_register(&mut app, &name, &email, &password).await
        }
        Commands::Logout => commands::cmd_logout(&mut app),
        Commands::Profile { refresh } => commands::cmd_profile(&mut app, refresh).await,
        Commands::Dashboard => commands::cmd_dashboard(&mut app, now).await,
        Commands::Receipts { action, filter } => match action {
            None => commands::cmd_receipts_list(&mut app, &filter).await,
            Some(ReceiptsAction::List { filter }) => {
                commands::cmd_receipts_list(&mut app, &filter).await
            }
            Some(ReceiptsAction::Show { id }) => commands::cmd_receipts_show(&mut app, id).await,
            Some(ReceiptsAction::Add { fields }) => {
                commands::cmd_receipts_add(&mut app, &fields, now.date()).await
            }
            Some(ReceiptsAction::Edit { id, fields }) => {
                commands::cmd_receipts_edit(&mut app, id, &fields).await
            }
            Some(ReceiptsAction::Delete { id, yes }) => {
                commands::cmd_receipts_delete(&mut app, id, yes).await
            }
            Some(ReceiptsAction::Search {
                store,
                category,
                from,
                to,
                page,
                size,
            }) => {
                let query = SearchQuery {
                    store_name: store,
                    category,
                    start_date: from,
                    end_date: to,
                    page,
                    size,
                };
                commands::cmd_receipts_search(&mut app, &query).await
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Users => commands::cmd_admin_users(&mut app).await,
            AdminAction::DeleteUser { id, yes } => {
                commands::cmd_admin_delete_user(&mut app, id, yes).await
            }
            AdminAction::Analytics => commands::cmd_admin_analytics(&mut app).await,
        },
        Commands::Theme { mode } => commands::cmd_theme(&mut app, mode),
    }
}
