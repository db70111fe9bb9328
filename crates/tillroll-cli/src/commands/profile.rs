//! Profile and theme commands

use anyhow::Result;
use tillroll_core::{format, AppContext, Error};

use crate::cli::ThemeArg;

pub async fn cmd_profile(app: &mut AppContext, refresh: bool) -> Result<()> {
    let user = if refresh {
        app.refresh_profile().await?
    } else {
        app.current_user().cloned().ok_or(Error::NotAuthenticated)?
    };

    let created = user
        .created_at
        .map(|ts| format::date(ts.date()))
        .unwrap_or_else(|| "N/A".to_string());

    println!();
    println!("👤 {}", user.name);
    println!("   ─────────────────────────────────────");
    println!("   Email:   {}", user.email);
    println!("   Role:    {}", user.role);
    println!("   Joined:  {}", created);
    println!("   Theme:   {}", app.theme());

    Ok(())
}

pub fn cmd_theme(app: &mut AppContext, mode: Option<ThemeArg>) -> Result<()> {
    let current = app.theme();
    let next = match mode {
        None => {
            println!("Theme: {}", current);
            return Ok(());
        }
        Some(ThemeArg::Light) => tillroll_core::Theme::Light,
        Some(ThemeArg::Dark) => tillroll_core::Theme::Dark,
        Some(ThemeArg::Toggle) => current.toggled(),
    };

    app.set_theme(next)?;
    println!("🎨 Theme set to {}", next);
    Ok(())
}
