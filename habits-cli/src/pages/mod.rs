//! One module per screen of the app. Pages load what they need through the
//! services on [`App`](crate::app::App) and render plain text.

pub mod achievements;
pub mod dashboard;
pub mod habits;
pub mod login;
pub mod profile;
pub mod progress;
pub mod register;
pub mod settings;
