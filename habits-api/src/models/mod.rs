mod achievement;
mod auth;
mod habit;
mod progress;
mod statistics;
mod user;

pub use achievement::*;
pub use auth::*;
pub use habit::*;
pub use progress::*;
pub use statistics::*;
pub use user::*;

// Calendar days travel as "YYYY-MM-DD".
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub(crate) fn format_date(date: time::Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}
