mod app;
mod cli;
mod config;
mod pages;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use app::{is_session_error, App};
use clap::Parser;
use cli::{Cli, Commands, HabitCommand, ProgressCommand, SettingsCommand};
use config::HabitsConfig;
use habits_api::{ApiError, NewNotification, NotificationKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the command needs a (new) login.
const EXIT_LOGIN_REQUIRED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habits=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = HabitsConfig::load()?;

    // Local-only commands never touch the session.
    match &cli.command {
        Commands::Settings(SettingsCommand::SetApiUrl { url }) => {
            let config = pages::settings::set_api_url(url)?;
            println!("API URL set to {}", config.api_url);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Settings(SettingsCommand::ConfigPath) => {
            println!("{}", pages::settings::config_path()?);
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let mut app = App::connect(config)?;
    app.start().await;

    // A stale session found at startup doesn't matter when signing in.
    let signs_in = matches!(
        cli.command,
        Commands::Login { .. } | Commands::Register(_) | Commands::Logout
    );
    let stale = app.drain_auth_events();
    if stale && signs_in {
        app.notifications.remove_all();
    }

    let outcome = dispatch(&app, cli.command).await;
    let login_required = app.drain_auth_events() || (stale && !signs_in);

    let code = match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if login_required || is_session_error(&e) => {
            if !login_required {
                app.notifications.add(
                    NewNotification::new(NotificationKind::Error, "Not signed in")
                        .action("Sign in", "habits login")
                        .persistent(),
                );
            }
            tracing::debug!(error = %e, "command needs a login");
            ExitCode::from(EXIT_LOGIN_REQUIRED)
        }
        Err(e) => {
            report_failure(&app, &e);
            ExitCode::FAILURE
        }
    };

    app.flush_notifications();
    app.shutdown();
    Ok(code)
}

/// Outer context becomes the title, the underlying API error the message.
fn report_failure(app: &App, error: &anyhow::Error) {
    match error.chain().find_map(|cause| cause.downcast_ref::<ApiError>()) {
        Some(api_error) => app.report(&error.to_string(), api_error),
        None => {
            let root = error.root_cause().to_string();
            let title = error.to_string();
            let message = (root != title).then_some(root);
            app.notifications.error(title, message);
        }
    }
}

async fn dispatch(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username } => pages::login::run(app, username).await,
        Commands::Register(args) => pages::register::run(app, args).await,
        Commands::Logout => pages::login::logout(app).await,
        Commands::Dashboard => {
            let page = pages::dashboard::DashboardPage::load(app).await?;
            println!("{}", page.render());
            Ok(())
        }
        Commands::Habits(command) => habits(app, command).await,
        Commands::Progress(command) => progress(app, command).await,
        Commands::Achievements { recent, check } => {
            let page = pages::achievements::AchievementsPage::load(app, recent, check).await?;
            println!("{}", page.render());
            Ok(())
        }
        Commands::Profile { days } => {
            let page = pages::profile::ProfilePage::load(app, days).await?;
            println!("{}", page.render());
            Ok(())
        }
        Commands::Settings(_) => {
            let user = app.auth.user();
            let signed_in_as = user.as_ref().map(|u| u.username.as_str());
            println!("{}", pages::settings::show(&app.config, signed_in_as)?);
            Ok(())
        }
    }
}

async fn habits(app: &App, command: HabitCommand) -> Result<()> {
    use pages::habits::{HabitDetailPage, HabitListPage};

    match command {
        HabitCommand::List(args) => {
            let page = HabitListPage::load(app, &args).await?;
            println!("{}", page.render());
            Ok(())
        }
        HabitCommand::Show { id, days } => {
            let page = HabitDetailPage::load(app, id, days).await?;
            println!("{}", page.render());
            Ok(())
        }
        HabitCommand::Create(fields) => pages::habits::create(app, fields).await,
        HabitCommand::Update { id, fields, active } => {
            pages::habits::update(app, id, fields, active).await
        }
        HabitCommand::Toggle { id } => pages::habits::toggle(app, id).await,
        HabitCommand::Delete { id, yes } => pages::habits::delete(app, id, yes).await,
    }
}

async fn progress(app: &App, command: ProgressCommand) -> Result<()> {
    use pages::progress::{ProgressListPage, ProgressStatsPage};

    match command {
        ProgressCommand::List { habit_id, page } => {
            let page = ProgressListPage::load(app, habit_id, page).await?;
            println!("{}", page.render());
            Ok(())
        }
        ProgressCommand::Add {
            habit_id,
            value,
            date,
            note,
        } => pages::progress::add(app, habit_id, value, date, note).await,
        ProgressCommand::Edit {
            id,
            value,
            date,
            note,
        } => pages::progress::edit(app, id, value, date, note).await,
        ProgressCommand::Delete { id, yes } => pages::progress::delete(app, id, yes).await,
        ProgressCommand::Stats {
            habit_id,
            days,
            svg,
        } => {
            let page = ProgressStatsPage::load(app, habit_id, days).await?;
            println!("{}", page.render());
            if let Some(path) = svg {
                page.write_svg(&path)?;
                app.notifications
                    .info("Chart written", Some(path.display().to_string()));
            }
            Ok(())
        }
    }
}
