// src/core/reporting.rs

use crate::core::analytics::{DashboardStats, EngagementStats, EventHealth, NamedCount, Severity};
use crate::core::countdown::Countdown;
use crate::core::event_system::TeamDetails;
use crate::core::models::EventSettings;
use crate::core::participants::Capacity;
use crate::core::scoring::LeaderboardEntry;
use chrono::{DateTime, Utc};

/// Everything the event summary report needs, gathered up front.
pub struct EventReportData<'a> {
    pub settings: &'a EventSettings,
    pub capacity: Capacity,
    pub dashboard: DashboardStats,
    pub funnel: Vec<NamedCount>,
    pub engagement: EngagementStats,
    pub health: EventHealth,
    pub countdown: Countdown,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub teams: Vec<TeamDetails>,
    pub generated_at: DateTime<Utc>,
}

pub fn format_event_report(data: &EventReportData) -> String {
    let mut report = String::new();

    report.push_str(&format!("# {} - Event Summary\n\n", data.settings.event_name));
    report.push_str(&format!("**Generated:** {}\n\n", data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    report.push_str(&format!("**Phase:** {} ({})\n\n", data.settings.current_phase, data.settings.event_status));
    report.push_str("---\n\n");

    report.push_str(&format_overview(data));
    report.push_str(&format_funnel(&data.funnel));
    report.push_str(&format_engagement(&data.engagement));
    report.push_str(&format_health(&data.health));
    report.push_str(&format_leaderboard(&data.leaderboard));
    report.push_str(&format_teams(&data.teams));

    report
}

fn format_overview(data: &EventReportData) -> String {
    let mut section = String::from("## Overview\n\n");
    section.push_str(&format!(
        "*   **Registrations:** {} / {} ({:.0}%)\n",
        data.capacity.count, data.capacity.limit, data.capacity.percent
    ));
    section.push_str(&format!("*   **Teams:** {}\n", data.dashboard.total_teams));
    section.push_str(&format!("*   **Submissions:** {}\n", data.dashboard.total_submissions));
    if let Some(hours) = data.dashboard.hours_until_next_phase {
        section.push_str(&format!("*   **Hours Until Next Phase:** {}\n", hours));
    }
    let left = data.countdown.time_left;
    section.push_str(&format!(
        "*   **Countdown:** {} ({}d {}h {}m)\n",
        data.countdown.phase.label(), left.days, left.hours, left.minutes
    ));
    section.push_str("\n");
    section
}

fn format_funnel(funnel: &[NamedCount]) -> String {
    let mut section = String::from("## Participation Funnel\n\n");
    section.push_str("| Stage | Count |\n| :---- | :---- |\n");
    for stage in funnel {
        section.push_str(&format!("| {} | {} |\n", stage.name, stage.value));
    }
    section.push_str("\n");
    section
}

fn format_engagement(engagement: &EngagementStats) -> String {
    let mut section = String::from("## Engagement\n\n");

    section.push_str("**Top Challenges:**\n");
    if engagement.top_challenges.is_empty() {
        section.push_str("*   N/A\n");
    }
    for challenge in &engagement.top_challenges {
        section.push_str(&format!("*   {}: {}\n", challenge.name, challenge.value));
    }

    section.push_str("\n**How People Heard About Us:**\n");
    if engagement.sources.is_empty() {
        section.push_str("*   N/A\n");
    }
    for source in &engagement.sources {
        section.push_str(&format!("*   {}: {}\n", source.name, source.value));
    }

    if engagement.teams_measured > 0 {
        section.push_str(&format!(
            "\n**Average Days To Form Team:** {:.1} ({} teams)\n",
            engagement.average_days_to_team, engagement.teams_measured
        ));
    }
    section.push_str("\n");
    section
}

fn format_health(health: &EventHealth) -> String {
    let mut section = String::from("## Event Health\n\n");
    section.push_str(&format!("*   **People Looking For Teams:** {}\n", health.people_looking));
    section.push_str(&format!("*   **Teams Without Submissions:** {}\n", health.teams_without_submissions));
    section.push_str(&format!("*   **Scores Still Needed:** {}\n", health.incomplete_judging));
    section.push_str(&format!("*   **Judges Who Scored:** {}\n", health.judges_who_scored));
    section.push_str(&format!("*   **Phase Progress:** {}%\n", health.phase_progress));

    if !health.warnings.is_empty() {
        section.push_str("\n**Warnings:**\n");
        for warning in &health.warnings {
            let marker = match warning.severity {
                Severity::Warning => "⚠️",
                Severity::Info => "ℹ️",
            };
            section.push_str(&format!("*   {} {}\n", marker, warning.message));
        }
    }
    section.push_str("\n");
    section
}

pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut section = String::from("## Leaderboard\n\n");
    if entries.is_empty() {
        section.push_str("No scored submissions yet.\n\n");
        return section;
    }

    section.push_str("| Rank | Project | Team | Track | Avg Score | # Scores |\n");
    section.push_str("| :--- | :------ | :--- | :---- | :-------- | :------- |\n");
    for entry in entries {
        let rank = match entry.medal {
            Some(medal) => format!("{} {}", medal.emoji(), entry.rank),
            None => entry.rank.to_string(),
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} | {:.2} | {} |\n",
            rank,
            entry.project_name,
            entry.team_name,
            entry.track.map(|t| t.label()).unwrap_or("-"),
            entry.average_score,
            entry.score_count,
        ));
    }
    section.push_str("\n");
    section
}

pub fn format_teams(teams: &[TeamDetails]) -> String {
    let mut section = String::from("## Teams\n\n");
    if teams.is_empty() {
        section.push_str("No teams yet.\n\n");
        return section;
    }

    for details in teams {
        let team = &details.team;
        section.push_str(&format!("### {}\n\n", team.name));
        section.push_str(&format!(
            "*   **Track:** {}\n*   **Status:** {}\n*   **Members:** {}/{}\n",
            team.track, team.status, details.members.len(), team.max_members
        ));
        if let Some(challenge) = &team.challenge {
            section.push_str(&format!("*   **Challenge:** {}\n", challenge));
        }
        for member in &details.members {
            section.push_str(&format!("    *   {} ({})\n", member.name, member.role));
        }
        match &details.submission {
            Some(submission) => section.push_str(&format!(
                "*   **Submission:** {} ({})\n",
                submission.project_name, submission.status
            )),
            None => section.push_str("*   **Submission:** none\n"),
        }
        section.push_str("\n");
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analytics::HealthWarning;
    use crate::core::countdown::{CountdownPhase, TimeLeft};
    use crate::core::event_system::MemberView;
    use crate::core::models::{Team, Track};
    use crate::core::scoring::Medal;
    use uuid::Uuid;

    fn entry(rank: usize, project: &str, score: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            medal: Medal::for_rank(rank),
            submission_id: Uuid::new_v4(),
            project_name: project.to_string(),
            team_name: format!("{} team", project),
            track: Some(Track::Buildathon),
            average_score: score,
            score_count: 2,
        }
    }

    #[test]
    fn test_leaderboard_table() {
        let table = format_leaderboard(&[entry(1, "Atlas", 8.5), entry(4, "Beacon", 6.0)]);
        assert!(table.contains("| 🥇 1 | Atlas | Atlas team | Buildathon | 8.50 | 2 |"));
        assert!(table.contains("| 4 | Beacon |"));
        assert!(format_leaderboard(&[]).contains("No scored submissions yet."));
    }

    #[test]
    fn test_teams_section_lists_members() {
        let team = Team::new("Alpha".to_string(), Track::Vibeathon, Some("Internal Tools".to_string()), 4).unwrap();
        let details = TeamDetails {
            members: vec![MemberView {
                member_id: Uuid::new_v4(),
                registration_id: Uuid::new_v4(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: "Engineer".to_string(),
            }],
            notes: Vec::new(),
            submission: None,
            team,
        };
        let section = format_teams(&[details]);
        assert!(section.contains("### Alpha"));
        assert!(section.contains("*   **Members:** 1/4"));
        assert!(section.contains("    *   Ada (Engineer)"));
        assert!(section.contains("*   **Submission:** none"));
    }

    #[test]
    fn test_full_report_sections() {
        let settings = EventSettings::default();
        let data = EventReportData {
            settings: &settings,
            capacity: Capacity::new(30, 150),
            dashboard: DashboardStats {
                total_registrations: 30,
                total_teams: 5,
                total_submissions: 2,
                hours_until_next_phase: Some(12),
                recent_activity: Vec::new(),
            },
            funnel: vec![NamedCount { name: "Registered".to_string(), value: 30 }],
            engagement: EngagementStats {
                top_challenges: Vec::new(),
                sources: Vec::new(),
                average_days_to_team: 0.0,
                teams_measured: 0,
            },
            health: EventHealth {
                people_looking: 4,
                teams_without_submissions: 3,
                incomplete_judging: 0,
                judges_who_scored: 1,
                phase_progress: 25,
                warnings: vec![HealthWarning { severity: Severity::Warning, message: "4 people looking for teams".to_string() }],
            },
            countdown: Countdown { phase: CountdownPhase::Complete, ends_at: None, time_left: TimeLeft::default() },
            leaderboard: Vec::new(),
            teams: Vec::new(),
            generated_at: Utc::now(),
        };

        let report = format_event_report(&data);
        assert!(report.starts_with("# AI Hackathon - Event Summary"));
        assert!(report.contains("*   **Registrations:** 30 / 150 (20%)"));
        assert!(report.contains("*   **Hours Until Next Phase:** 12"));
        assert!(report.contains("| Registered | 30 |"));
        assert!(report.contains("⚠️ 4 people looking for teams"));
        assert!(report.contains("No teams yet."));
    }
}
