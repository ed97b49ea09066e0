use habits_api::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Habits,
    Progress,
    Achievements,
    Profile,
    Settings,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Dashboard,
        Section::Habits,
        Section::Progress,
        Section::Achievements,
        Section::Profile,
        Section::Settings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Habits => "Habits",
            Section::Progress => "Progress",
            Section::Achievements => "Achievements",
            Section::Profile => "Profile",
            Section::Settings => "Settings",
        }
    }
}

/// Header line: sections with the current one highlighted, then the user.
pub fn header(current: Section, user: Option<&User>) -> String {
    let tabs: Vec<String> = Section::ALL
        .iter()
        .map(|s| {
            if *s == current {
                format!("[{}]", s.label())
            } else {
                s.label().to_string()
            }
        })
        .collect();

    let who = match user {
        Some(user) => format!("👤 {}", user.display_name()),
        None => "not signed in".to_string(),
    };
    format!("{}  ·  {}", tabs.join(" | "), who)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_current_section() {
        let line = header(Section::Habits, None);
        assert!(line.starts_with("Dashboard | [Habits] | Progress"));
        assert!(line.ends_with("not signed in"));
    }
}
