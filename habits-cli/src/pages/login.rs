use anyhow::{Context, Result};

use crate::app::App;
use crate::ui::widgets::{prompt, prompt_password};

pub async fn run(app: &App, username: Option<String>) -> Result<()> {
    let username = match username.filter(|u| !u.trim().is_empty()) {
        Some(username) => username,
        None => prompt("Username", None)?,
    };
    let password = prompt_password("Password")?;

    let user = app
        .auth
        .login(username.trim(), &password)
        .await
        .context("Login failed")?;
    app.notifications.success(
        format!("Welcome back, {}!", user.display_name()),
        None,
    );
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    if !app.auth.is_authenticated() {
        app.notifications.info("Already signed out", None);
        return Ok(());
    }
    app.auth.logout_with_server().await;
    app.notifications.success("Signed out", None);
    Ok(())
}
