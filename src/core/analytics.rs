// src/core/analytics.rs

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::core::models::{ParticipantTeamStatus, Registration, Track};
use crate::core::state::EventState;

/// Challenge popularity shows this many entries.
pub const TOP_CHALLENGES: usize = 5;
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

impl NamedCount {
    fn new(name: impl Into<String>, value: usize) -> Self {
        Self { name: name.into(), value }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Activity {
    pub registration_id: Uuid,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DashboardStats {
    pub total_registrations: usize,
    pub total_teams: usize,
    pub total_submissions: usize,
    pub hours_until_next_phase: Option<i64>,
    pub recent_activity: Vec<Activity>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegistrationSeries {
    /// Running total at the end of each calendar day with registrations.
    pub cumulative_by_day: Vec<(NaiveDate, usize)>,
    pub by_track: Vec<NamedCount>,
    pub by_role: Vec<NamedCount>,
    pub by_team_status: Vec<NamedCount>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EngagementStats {
    pub top_challenges: Vec<NamedCount>,
    pub sources: Vec<NamedCount>,
    pub average_days_to_team: f64,
    pub teams_measured: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthWarning {
    pub severity: Severity,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct EventHealth {
    pub people_looking: usize,
    pub teams_without_submissions: usize,
    pub incomplete_judging: usize,
    pub judges_who_scored: usize,
    pub phase_progress: u8,
    pub warnings: Vec<HealthWarning>,
}

pub fn dashboard_stats(state: &EventState, now: DateTime<Utc>) -> DashboardStats {
    let hours_until_next_phase = state.settings().next_phase_at
        .map(|at| (at - now).num_hours().max(0));

    let recent_activity = state.registrations().values()
        .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|r| Activity {
            registration_id: r.id,
            content: format!("{} registered for {}", r.full_name, r.track),
            at: r.created_at,
        })
        .collect();

    DashboardStats {
        total_registrations: state.registrations().len(),
        total_teams: state.teams().len(),
        total_submissions: state.submissions().len(),
        hours_until_next_phase,
        recent_activity,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sorted_counts<I: IntoIterator<Item = String>>(items: I) -> Vec<NamedCount> {
    items.into_iter()
        .counts()
        .into_iter()
        .map(|(name, value)| NamedCount::new(name, value))
        .sorted_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)))
        .collect()
}

pub fn registration_series(state: &EventState) -> RegistrationSeries {
    let ordered: Vec<&Registration> = state.registrations().values()
        .sorted_by_key(|r| r.created_at)
        .collect();

    let mut cumulative_by_day: Vec<(NaiveDate, usize)> = Vec::new();
    for (index, reg) in ordered.iter().enumerate() {
        let day = reg.created_at.date_naive();
        if let Some((last_day, count)) = cumulative_by_day.last_mut() {
            if *last_day == day {
                *count = index + 1;
                continue;
            }
        }
        cumulative_by_day.push((day, index + 1));
    }

    let by_track = Track::ALL.iter()
        .map(|t| NamedCount::new(t.label(), ordered.iter().filter(|r| r.track == *t).count()))
        .filter(|c| c.value > 0)
        .collect();

    let by_team_status = [ParticipantTeamStatus::HasTeam, ParticipantTeamStatus::Looking, ParticipantTeamStatus::Solo]
        .iter()
        .map(|s| NamedCount::new(s.label(), ordered.iter().filter(|r| r.team_status == *s).count()))
        .filter(|c| c.value > 0)
        .collect();

    RegistrationSeries {
        cumulative_by_day,
        by_track,
        by_role: sorted_counts(ordered.iter().map(|r| capitalize(&r.role))),
        by_team_status,
    }
}

/// Registered, Formed Team, Submitted, Won Award.
pub fn funnel(state: &EventState) -> Vec<NamedCount> {
    let won: HashSet<Uuid> = state.awards().values().map(|a| a.submission_id).collect();
    vec![
        NamedCount::new("Registered", state.registrations().len()),
        NamedCount::new("Formed Team", state.team_members().len()),
        NamedCount::new("Submitted", state.submissions().len()),
        NamedCount::new("Won Award", state.submissions().keys().filter(|id| won.contains(id)).count()),
    ]
}

pub fn engagement(state: &EventState) -> EngagementStats {
    let top_challenges = sorted_counts(
        state.registrations().values().flat_map(|r| r.challenges.iter().cloned())
    )
    .into_iter()
    .take(TOP_CHALLENGES)
    .collect();

    let sources = sorted_counts(state.registrations().values().map(|r| r.how_heard.clone()));

    let days_to_team: Vec<i64> = state.teams().values()
        .filter_map(|team| {
            state.members_of(team.id)
                .first()
                .map(|earliest| (earliest.joined_at - team.created_at).num_days().abs())
        })
        .collect();

    let average_days_to_team = if days_to_team.is_empty() {
        0.0
    } else {
        days_to_team.iter().sum::<i64>() as f64 / days_to_team.len() as f64
    };

    EngagementStats {
        top_challenges,
        sources,
        average_days_to_team,
        teams_measured: days_to_team.len(),
    }
}

pub fn event_health(state: &EventState, judges_per_submission: u32) -> EventHealth {
    let people_looking = state.team_seekers().values().filter(|s| s.looking_for_team).count();
    let teams_without_submissions = state.teams().keys()
        .filter(|id| state.submission_for_team(**id).is_none())
        .count();
    let expected = state.submissions().len() * judges_per_submission as usize;
    let incomplete_judging = expected.saturating_sub(state.scores().len());
    let judges_who_scored = state.scores().values().map(|s| s.judge_id).unique().count();

    let mut warnings = Vec::new();
    if people_looking > 0 {
        warnings.push(HealthWarning {
            severity: Severity::Warning,
            message: format!("{} people still looking for teams", people_looking),
        });
    }
    if teams_without_submissions > 0 {
        warnings.push(HealthWarning {
            severity: Severity::Warning,
            message: format!("{} teams haven't submitted yet", teams_without_submissions),
        });
    }
    if incomplete_judging > 0 {
        warnings.push(HealthWarning {
            severity: Severity::Info,
            message: format!("{} scoring assignments incomplete", incomplete_judging),
        });
    }

    EventHealth {
        people_looking,
        teams_without_submissions,
        incomplete_judging,
        judges_who_scored,
        phase_progress: state.settings().current_phase.progress_percent(),
        warnings,
    }
}
