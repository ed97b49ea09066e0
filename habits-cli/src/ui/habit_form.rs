use anyhow::Result;
use habits_api::models::{CreateHabitRequest, Frequency, Habit, HabitCategory, UpdateHabitRequest};

use super::widgets::{prompt, prompt_optional};
use crate::cli::HabitFields;

/// Field values gathered from flags and prompts before they become a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<HabitCategory>,
    pub unit: Option<String>,
    pub frequency: Option<Frequency>,
    pub target_value: Option<f64>,
}

impl From<HabitFields> for HabitForm {
    fn from(fields: HabitFields) -> Self {
        Self {
            title: fields.title.map(|t| t.trim().to_string()),
            description: fields.description.map(|d| d.trim().to_string()),
            category: fields.category,
            unit: fields.unit.map(|u| u.trim().to_string()),
            frequency: fields.frequency,
            target_value: fields.target,
        }
    }
}

impl HabitForm {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Prompt for whatever a new habit still needs.
    pub fn complete_interactively(&mut self) -> Result<()> {
        if self.title.as_deref().map_or(true, str::is_empty) {
            self.title = Some(prompt("Title", None)?);
        }
        if self.unit.as_deref().map_or(true, str::is_empty) {
            self.unit = Some(prompt("Unit (e.g. km, pages, glasses)", None)?);
        }
        if self.category.is_none() {
            let options: Vec<&str> = HabitCategory::ALL.iter().map(|c| c.as_str()).collect();
            let answer = prompt(&format!("Category ({})", options.join(", ")), Some("AUTRE"))?;
            self.category = Some(answer.parse().map_err(anyhow::Error::msg)?);
        }
        if self.frequency.is_none() {
            let answer = prompt("Frequency (DAILY, WEEKLY, MONTHLY)", Some("DAILY"))?;
            self.frequency = Some(answer.parse().map_err(anyhow::Error::msg)?);
        }
        if self.target_value.is_none() {
            if let Some(raw) = prompt_optional("Target value (optional)")? {
                self.target_value = Some(
                    raw.parse()
                        .map_err(|_| anyhow::anyhow!("Target value must be a number"))?,
                );
            }
        }
        Ok(())
    }

    /// Missing category and frequency take the server defaults.
    pub fn to_create_request(&self) -> CreateHabitRequest {
        CreateHabitRequest {
            title: self.title.clone().unwrap_or_default(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            category: self.category.unwrap_or(HabitCategory::Autre),
            unit: self.unit.clone().unwrap_or_default(),
            frequency: self.frequency.unwrap_or_default(),
            target_value: self.target_value,
        }
    }

    /// Only the fields that differ from `current` are sent.
    pub fn to_update_request(&self, current: &Habit, active: Option<bool>) -> UpdateHabitRequest {
        fn changed<T: PartialEq + Clone>(new: &Option<T>, old: &T) -> Option<T> {
            new.as_ref().filter(|v| *v != old).cloned()
        }

        UpdateHabitRequest {
            title: changed(&self.title, &current.title),
            description: self
                .description
                .clone()
                .filter(|d| current.description.as_deref() != Some(d.as_str())),
            category: changed(&self.category, &current.category),
            unit: changed(&self.unit, &current.unit),
            frequency: changed(&self.frequency, &current.frequency),
            target_value: self.target_value.filter(|t| current.target_value != Some(*t)),
            is_active: active.filter(|a| *a != current.is_active),
        }
    }
}
