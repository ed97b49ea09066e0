use anyhow::{bail, Context, Result};
use habits_api::models::RegisterRequest;

use crate::app::App;
use crate::cli::RegisterArgs;
use crate::ui::widgets::{prompt, prompt_optional, prompt_password};

pub async fn run(app: &App, args: RegisterArgs) -> Result<()> {
    let username = match args.username {
        Some(username) => username,
        None => prompt("Username", None)?,
    };
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email", None)?,
    };
    let first_name = match args.first_name {
        Some(name) => Some(name),
        None => prompt_optional("First name (optional)")?,
    };
    let last_name = match args.last_name {
        Some(name) => Some(name),
        None => prompt_optional("Last name (optional)")?,
    };

    let password = prompt_password("Password")?;
    let confirmation = prompt_password("Confirm password")?;
    if password != confirmation {
        bail!("Passwords do not match");
    }

    let request = RegisterRequest {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        password,
        first_name: first_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        last_name: last_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    };

    let user = app
        .auth
        .register(&request)
        .await
        .context("Registration failed")?;
    app.notifications.success(
        format!("Welcome, {}!", user.display_name()),
        Some("Your account is ready".to_string()),
    );
    Ok(())
}
