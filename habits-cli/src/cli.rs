use clap::{Args, Parser, Subcommand};
use habits_api::models::{Frequency, HabitCategory};
use time::Date;

#[derive(Debug, Parser)]
#[command(name = "habits")]
#[command(about = "Track habits and daily progress from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and store the session tokens
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Revoke the session and remove stored tokens
    Logout,
    /// Overview of today's progress and streaks
    Dashboard,
    /// Manage habits
    #[command(subcommand)]
    Habits(HabitCommand),
    /// Record and inspect progress entries
    #[command(subcommand)]
    Progress(ProgressCommand),
    /// Unlocked achievements
    Achievements {
        /// Only achievements unlocked in the last N days
        #[arg(long)]
        recent: Option<u32>,
        /// Ask the server to evaluate new achievements first
        #[arg(long)]
        check: bool,
    },
    /// Account details and statistics
    Profile {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Local configuration
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub username: Option<String>,
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum HabitCommand {
    /// List habits, optionally filtered
    List(ListArgs),
    /// Habit details with recent statistics
    Show {
        id: i64,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Create a habit (prompts for missing required fields)
    Create(HabitFields),
    /// Change fields of a habit
    Update {
        id: i64,
        #[command(flatten)]
        fields: HabitFields,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Flip a habit between active and inactive
    Toggle { id: i64 },
    /// Delete a habit and its progress
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Args, Default)]
pub struct ListArgs {
    /// Fuzzy match on title and description
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(short, long)]
    pub category: Option<HabitCategory>,
    /// Only active habits
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,
    /// Only inactive habits
    #[arg(long)]
    pub inactive: bool,
    /// Zero-based page number
    #[arg(short, long, default_value_t = 0)]
    pub page: u32,
}

impl ListArgs {
    pub fn active_filter(&self) -> Option<bool> {
        match (self.active, self.inactive) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct HabitFields {
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub category: Option<HabitCategory>,
    #[arg(short, long)]
    pub unit: Option<String>,
    #[arg(short, long)]
    pub frequency: Option<Frequency>,
    #[arg(long)]
    pub target: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum ProgressCommand {
    /// Entries of one habit, newest first
    List {
        habit_id: i64,
        #[arg(short, long, default_value_t = 0)]
        page: u32,
    },
    /// Log a value for a habit
    Add {
        habit_id: i64,
        value: f64,
        /// Defaults to today
        #[arg(short, long, value_parser = parse_date)]
        date: Option<Date>,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Change an entry
    Edit {
        id: i64,
        #[arg(short, long)]
        value: Option<f64>,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<Date>,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Remove an entry
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Statistics for a habit over the last N days
    Stats {
        habit_id: i64,
        #[arg(long, default_value_t = 30)]
        days: u32,
        /// Also write an SVG sparkline of the values to this file
        #[arg(long)]
        svg: Option<std::path::PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the effective configuration
    Show,
    /// Point the client at another API
    SetApiUrl { url: String },
    /// Print config path and create default file if missing
    ConfigPath,
}

pub fn parse_date(raw: &str) -> Result<Date, String> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), &format).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use time::macros::date;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn progress_add_parses_date_and_value() {
        let cli = Cli::try_parse_from([
            "habits", "progress", "add", "7", "2.5", "--date", "2024-03-10", "--note", "easy",
        ])
        .unwrap();
        match cli.command {
            Commands::Progress(ProgressCommand::Add {
                habit_id,
                value,
                date,
                note,
            }) => {
                assert_eq!(habit_id, 7);
                assert_eq!(value, 2.5);
                assert_eq!(date, Some(date!(2024 - 03 - 10)));
                assert_eq!(note.as_deref(), Some("easy"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn habit_list_filters() {
        let cli = Cli::try_parse_from([
            "habits", "habits", "list", "--category", "sport", "--inactive", "-s", "run",
        ])
        .unwrap();
        let Commands::Habits(HabitCommand::List(args)) = cli.command else {
            panic!("expected habits list");
        };
        assert_eq!(args.category, Some(HabitCategory::Sport));
        assert_eq!(args.active_filter(), Some(false));
        assert_eq!(args.search.as_deref(), Some("run"));
    }

    #[test]
    fn active_and_inactive_conflict() {
        assert!(Cli::try_parse_from(["habits", "habits", "list", "--active", "--inactive"]).is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(parse_date("10/03/2024").is_err());
    }
}
