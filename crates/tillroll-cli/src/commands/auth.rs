//! Login, registration and logout

use anyhow::Result;
use tillroll_core::AppContext;
use tracing::warn;

pub async fn cmd_login(app: &mut AppContext, email: &str, password: &str) -> Result<()> {
    let user = app.login(email, password).await?;

    println!("✅ Login successful! Welcome back, {}.", user.name);
    if user.is_admin() {
        println!("   Role: ADMIN (admin commands available: tillroll admin --help)");
    }

    // Warm the collection so the first listing reflects the server. The
    // session is already saved, so a failure here does not undo the login.
    match app.load_receipts().await {
        Ok(count) => {
            println!("   {} receipt{} on file", count, if count == 1 { "" } else { "s" })
        }
        Err(e) => {
            warn!("Initial receipt load failed: {}", e);
            println!("⚠️  Could not load receipts: {}", e);
        }
    }

    Ok(())
}

pub async fn cmd_register(
    app: &mut AppContext,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let user = app.register(name, email, password).await?;

    println!("✅ Registration successful! Please login.");
    println!("   tillroll login --email {}", user.email);

    Ok(())
}

pub fn cmd_logout(app: &mut AppContext) -> Result<()> {
    if !app.session().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }

    app.logout()?;
    println!("👋 Logged out successfully");
    Ok(())
}
