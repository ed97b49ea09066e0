use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use habits_api::{Notification, NotificationKind};

const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Boxed section with a title line.
pub fn card(title: &str, lines: &[String]) -> String {
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count() + 2))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("┌─ {} {}┐\n", title, "─".repeat(width - title.chars().count() - 1)));
    for line in lines {
        let pad = width - line.chars().count();
        out.push_str(&format!("│ {}{} │\n", line, " ".repeat(pad)));
    }
    out.push_str(&format!("└{}┘", "─".repeat(width + 2)));
    out
}

pub fn badge(text: &str) -> String {
    format!("[{}]", text)
}

/// `[██████░░░░] 60%`, clamped to 0..=100.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:.0}%",
        BAR_FILLED.to_string().repeat(filled),
        BAR_EMPTY.to_string().repeat(width - filled),
        percent
    )
}

/// One block character per value, scaled between the series min and max.
pub fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let top = SPARK_LEVELS.len() - 1;

    finite
        .iter()
        .map(|v| {
            if max > min {
                SPARK_LEVELS[(((v - min) / (max - min)) * top as f64).round() as usize]
            } else {
                SPARK_LEVELS[top / 2]
            }
        })
        .collect()
}

pub fn notification_line(notification: &Notification) -> String {
    let mut line = format!("{} {}", notification.kind.icon(), notification.title);
    if let Some(message) = &notification.message {
        line.push_str(": ");
        line.push_str(message);
    }
    if let Some(action) = &notification.action {
        line.push_str(&format!(" ({}: `{}`)", action.label, action.command));
    }
    line
}

/// Print a notification to the stream matching its severity.
pub fn print_notification(notification: &Notification) {
    let line = notification_line(notification);
    match notification.kind {
        NotificationKind::Error | NotificationKind::Warning => eprintln!("{}", line),
        NotificationKind::Success | NotificationKind::Info => println!("{}", line),
    }
}

/// Ask a line of input. An empty answer yields `default` when given.
pub fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    let stdin = io::stdin();
    prompt_from(&mut stdin.lock(), &mut io::stdout(), label, default)
}

pub fn prompt_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    label: &str,
    default: Option<&str>,
) -> Result<String> {
    match default {
        Some(d) => write!(output, "{} [{}]: ", label, d)?,
        None => write!(output, "{}: ", label)?,
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read input")?;
    let answer = line.trim();
    if answer.is_empty() {
        return Ok(default.unwrap_or_default().to_string());
    }
    Ok(answer.to_string())
}

/// Empty answers become `None`.
pub fn prompt_optional(label: &str) -> Result<Option<String>> {
    let answer = prompt(label, None)?;
    Ok(Some(answer).filter(|a| !a.is_empty()))
}

pub fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

/// Yes/no confirmation, defaulting to no.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_from(&mut stdin.lock(), &mut io::stdout(), question)
}

pub fn confirm_from(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<bool> {
    let answer = prompt_from(input, output, &format!("{} (y/N)", question), None)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
