use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::{EventError, EventResult};

pub const DEFAULT_EVENT_NAME: &str = "AI Hackathon";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    Setup,
    Registration,
    #[serde(rename = "Team Formation")]
    TeamFormation,
    Building,
    Submission,
    Judging,
    Complete,
}

impl EventPhase {
    pub const ORDER: [EventPhase; 7] = [
        EventPhase::Setup,
        EventPhase::Registration,
        EventPhase::TeamFormation,
        EventPhase::Building,
        EventPhase::Submission,
        EventPhase::Judging,
        EventPhase::Complete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventPhase::Setup => "Setup",
            EventPhase::Registration => "Registration",
            EventPhase::TeamFormation => "Team Formation",
            EventPhase::Building => "Building",
            EventPhase::Submission => "Submission",
            EventPhase::Judging => "Judging",
            EventPhase::Complete => "Complete",
        }
    }

    /// The phase after this one. `Complete` is terminal.
    pub fn next(&self) -> EventPhase {
        let position = Self::ORDER.iter().position(|p| p == self).unwrap_or(0);
        Self::ORDER.get(position + 1).copied().unwrap_or(EventPhase::Complete)
    }

    pub fn progress_percent(&self) -> u8 {
        match self {
            EventPhase::Setup => 25,
            EventPhase::Registration => 50,
            EventPhase::Building => 75,
            _ => 100,
        }
    }
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ORDER.iter()
            .find(|p| p.label().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown event phase: {}", s.trim()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Archived,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Active => f.write_str("active"),
            EventStatus::Archived => f.write_str("archived"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventSettings {
    pub event_name: String,
    pub current_phase: EventPhase,
    pub event_status: EventStatus,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub next_phase_at: Option<DateTime<Utc>>,
    /// Overrides the configured registration limit when set.
    pub registration_limit: Option<u32>,
    pub auto_advance_phases: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            event_name: DEFAULT_EVENT_NAME.to_string(),
            current_phase: EventPhase::Setup,
            event_status: EventStatus::Active,
            event_start_date: None,
            event_end_date: None,
            registration_deadline: None,
            submission_deadline: None,
            next_phase_at: None,
            registration_limit: None,
            auto_advance_phases: false,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}

impl EventSettings {
    pub fn is_archived(&self) -> bool {
        self.event_status == EventStatus::Archived
    }

    pub fn apply(&mut self, update: SettingsUpdate) -> EventResult<()> {
        if let Some(name) = update.event_name {
            if name.trim().is_empty() {
                return Err(EventError::invalid("Event name cannot be empty"));
            }
            self.event_name = name.trim().to_string();
        }
        if let Some(limit) = update.registration_limit {
            if limit == 0 {
                return Err(EventError::invalid("Registration limit must be positive"));
            }
            self.registration_limit = Some(limit);
        }
        if let Some(phase) = update.current_phase {
            self.current_phase = phase;
        }
        if update.event_start_date.is_some() {
            self.event_start_date = update.event_start_date;
        }
        if update.event_end_date.is_some() {
            self.event_end_date = update.event_end_date;
        }
        if update.registration_deadline.is_some() {
            self.registration_deadline = update.registration_deadline;
        }
        if update.submission_deadline.is_some() {
            self.submission_deadline = update.submission_deadline;
        }
        if update.next_phase_at.is_some() {
            self.next_phase_at = update.next_phase_at;
        }
        if let Some(auto) = update.auto_advance_phases {
            self.auto_advance_phases = auto;
        }

        if let (Some(start), Some(end)) = (self.event_start_date, self.event_end_date) {
            if end < start {
                return Err(EventError::invalid("Event end date is before the start date"));
            }
        }

        self.updated_by = update.updated_by;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial settings change. Fields left `None` keep their current value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub event_name: Option<String>,
    pub current_phase: Option<EventPhase>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub next_phase_at: Option<DateTime<Utc>>,
    pub registration_limit: Option<u32>,
    pub auto_advance_phases: Option<bool>,
    pub updated_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_phase_order_and_terminal() {
        assert_eq!(EventPhase::Setup.next(), EventPhase::Registration);
        assert_eq!(EventPhase::Registration.next(), EventPhase::TeamFormation);
        assert_eq!(EventPhase::Judging.next(), EventPhase::Complete);
        assert_eq!(EventPhase::Complete.next(), EventPhase::Complete);
    }

    #[test]
    fn test_phase_wire_names() {
        assert_eq!(serde_json::to_string(&EventPhase::TeamFormation).unwrap(), "\"Team Formation\"");
        assert_eq!("team_formation".parse::<EventPhase>().unwrap(), EventPhase::TeamFormation);
        assert_eq!("judging".parse::<EventPhase>().unwrap(), EventPhase::Judging);
        assert!("lunch".parse::<EventPhase>().is_err());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(EventPhase::Setup.progress_percent(), 25);
        assert_eq!(EventPhase::Registration.progress_percent(), 50);
        assert_eq!(EventPhase::Building.progress_percent(), 75);
        assert_eq!(EventPhase::TeamFormation.progress_percent(), 100);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut settings = EventSettings::default();
        settings.apply(SettingsUpdate {
            registration_limit: Some(200),
            ..Default::default()
        }).unwrap();
        settings.apply(SettingsUpdate {
            event_name: Some("Spring Jam".to_string()),
            ..Default::default()
        }).unwrap();

        assert_eq!(settings.event_name, "Spring Jam");
        assert_eq!(settings.registration_limit, Some(200));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut settings = EventSettings::default();
        let now = Utc::now();
        let result = settings.apply(SettingsUpdate {
            event_start_date: Some(now),
            event_end_date: Some(now - Duration::days(1)),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
