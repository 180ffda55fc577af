// src/core/countdown.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::models::EventSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    RegistrationOpen,
    HackathonStarting,
    HackathonInProgress,
    Judging,
    Complete,
}

impl CountdownPhase {
    pub fn label(&self) -> &'static str {
        match self {
            CountdownPhase::RegistrationOpen => "Registration Open",
            CountdownPhase::HackathonStarting => "Hackathon Starts In",
            CountdownPhase::HackathonInProgress => "Hackathon In Progress",
            CountdownPhase::Judging => "Judging Phase",
            CountdownPhase::Complete => "Event Complete",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    pub fn between(now: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let total = (end - now).num_seconds().max(0);
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Countdown {
    pub phase: CountdownPhase,
    pub ends_at: Option<DateTime<Utc>>,
    pub time_left: TimeLeft,
}

fn schedule(settings: &EventSettings) -> [(CountdownPhase, Option<DateTime<Utc>>); 4] {
    [
        (CountdownPhase::RegistrationOpen, settings.registration_deadline),
        (CountdownPhase::HackathonStarting, settings.event_start_date),
        (CountdownPhase::HackathonInProgress, settings.submission_deadline.or(settings.event_end_date)),
        (CountdownPhase::Judging, settings.event_end_date),
    ]
}

/// The first phase whose end is still ahead. Phases without a date are skipped.
pub fn countdown(settings: &EventSettings, now: DateTime<Utc>) -> Countdown {
    schedule(settings)
        .into_iter()
        .filter_map(|(phase, end)| end.map(|end| (phase, end)))
        .find(|(_, end)| now < *end)
        .map(|(phase, end)| Countdown {
            phase,
            ends_at: Some(end),
            time_left: TimeLeft::between(now, end),
        })
        .unwrap_or(Countdown {
            phase: CountdownPhase::Complete,
            ends_at: None,
            time_left: TimeLeft::default(),
        })
}
