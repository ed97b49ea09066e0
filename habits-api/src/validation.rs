//! Advisory field checks run before create/update calls. The server stays
//! authoritative; these only save a round trip for obviously bad input.

use crate::error::{ApiError, Result};
use crate::models::{
    CreateHabitRequest, CreateProgressRequest, LoginRequest, RegisterRequest, UpdateHabitRequest,
    UpdateProgressRequest,
};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const UNIT_MAX: usize = 50;
pub const NOTE_MAX: usize = 500;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;
pub const NAME_MAX: usize = 50;

/// Collects every failed check so the caller sees them all at once.
#[derive(Debug, Default)]
struct Checks(Vec<String>);

impl Checks {
    fn fail(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    fn required(&mut self, value: &str, field: &str) {
        if value.trim().is_empty() {
            self.fail(format!("{field} is required"));
        }
    }

    fn max_len(&mut self, value: &str, max: usize, field: &str) {
        if value.chars().count() > max {
            self.fail(format!("{field} cannot exceed {max} characters"));
        }
    }

    fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

fn check_title(checks: &mut Checks, title: &str) {
    checks.required(title, "Title");
    checks.max_len(title, TITLE_MAX, "Title");
}

fn check_unit(checks: &mut Checks, unit: &str) {
    checks.required(unit, "Unit");
    checks.max_len(unit, UNIT_MAX, "Unit");
}

fn check_target(checks: &mut Checks, target: Option<f64>) {
    if let Some(target) = target {
        if target.is_nan() || target <= 0.0 {
            checks.fail("Target value must be positive");
        }
    }
}

pub fn validate_create_habit(req: &CreateHabitRequest) -> Result<()> {
    let mut checks = Checks::default();
    check_title(&mut checks, &req.title);
    if let Some(description) = &req.description {
        checks.max_len(description, DESCRIPTION_MAX, "Description");
    }
    check_unit(&mut checks, &req.unit);
    check_target(&mut checks, req.target_value);
    checks.finish()
}

/// Only the fields being changed are checked.
pub fn validate_update_habit(req: &UpdateHabitRequest) -> Result<()> {
    let mut checks = Checks::default();
    if let Some(title) = &req.title {
        check_title(&mut checks, title);
    }
    if let Some(description) = &req.description {
        checks.max_len(description, DESCRIPTION_MAX, "Description");
    }
    if let Some(unit) = &req.unit {
        check_unit(&mut checks, unit);
    }
    check_target(&mut checks, req.target_value);
    checks.finish()
}

fn check_value(checks: &mut Checks, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        checks.fail("Value must be a positive number");
    }
}

pub fn validate_create_progress(req: &CreateProgressRequest) -> Result<()> {
    let mut checks = Checks::default();
    check_value(&mut checks, req.value);
    if let Some(note) = &req.note {
        checks.max_len(note, NOTE_MAX, "Note");
    }
    checks.finish()
}

pub fn validate_update_progress(req: &UpdateProgressRequest) -> Result<()> {
    let mut checks = Checks::default();
    if let Some(value) = req.value {
        check_value(&mut checks, value);
    }
    if let Some(note) = &req.note {
        checks.max_len(note, NOTE_MAX, "Note");
    }
    checks.finish()
}

pub fn validate_login(req: &LoginRequest) -> Result<()> {
    let mut checks = Checks::default();
    checks.required(&req.username, "Username");
    checks.required(&req.password, "Password");
    checks.finish()
}

pub fn validate_register(req: &RegisterRequest) -> Result<()> {
    let mut checks = Checks::default();

    let username_len = req.username.trim().chars().count();
    if username_len == 0 {
        checks.fail("Username is required");
    } else if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
        checks.fail(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        ));
    }

    if req.email.trim().is_empty() {
        checks.fail("Email is required");
    } else if !looks_like_email(req.email.trim()) {
        checks.fail("Email is not valid");
    }

    if req.password.chars().count() < PASSWORD_MIN {
        checks.fail(format!("Password must be at least {PASSWORD_MIN} characters"));
    }

    if let Some(first_name) = &req.first_name {
        checks.max_len(first_name, NAME_MAX, "First name");
    }
    if let Some(last_name) = &req.last_name {
        checks.max_len(last_name, NAME_MAX, "Last name");
    }
    checks.finish()
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
