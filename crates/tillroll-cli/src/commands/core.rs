//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve config from file, environment and flags
//! - `open_app` - Open the application context over the local session file
//! - `confirm` / `read_password` - Interactive prompts
//! - `print_notices` - Warnings queued by the context after a write

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tillroll_core::{AppContext, Config};

/// Resolve the effective config: defaults, override file, env, then flags
pub fn load_config(
    config_path: Option<&Path>,
    api_url: Option<&str>,
    data_dir: Option<PathBuf>,
) -> Result<Config> {
    let mut config = Config::load(config_path)
        .context("Failed to load configuration")?
        .apply_env();
    if let Some(url) = api_url {
        config = config.with_api_url(url);
    }
    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir);
    }
    Ok(config)
}

/// Open the application context, restoring any saved session
pub fn open_app(config: Config) -> Result<AppContext> {
    let storage_path = config.storage_path();
    AppContext::open(config).with_context(|| {
        format!(
            "Failed to open session storage at {}",
            storage_path.display()
        )
    })
}

/// Print (and drain) warnings the context queued during the last command
pub fn print_notices(app: &mut AppContext) {
    for notice in app.take_notices() {
        println!("⚠️  {}", notice);
    }
}

/// Ask a yes/no question; anything but "y" means no
pub fn confirm(question: &str) -> Result<bool> {
    print!("{}\n\nAre you sure? [y/N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Use the given password or prompt for one without echo
pub fn read_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}
