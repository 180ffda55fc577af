// src/commands/common.rs

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::core::error::EventError;
use crate::core::event_system::EventSystem;
use crate::core::export::ExportKind;
use crate::core::models::{
    names_equal, ChallengeInput, Criteria, IntegrationType, RegistrationInput, SeekerInput, SettingsUpdate,
    SubmissionInput, SubmissionStatus, TeamStatus, TemplateType, Track, UpdateRegistrationDetails,
};
use crate::core::participants::RegistrationFilter;
use crate::core::reporting;

/// Admin commands. Scripts are JSON arrays of these, e.g.
/// `{"type": "AddJudge", "params": {"name": "Judy"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Command {
    Register(RegistrationInput),
    UpdateRegistration {
        registration: String,
        updates: UpdateRegistrationDetails,
    },
    DeleteRegistration {
        registration: String,
    },
    ListRegistrations {
        #[serde(default)]
        filter: RegistrationFilter,
    },
    PrintRegistrationCount,
    PrintShareLinks {
        registration: String,
    },
    CreateTeam {
        name: String,
        track: Track,
        challenge: Option<String>,
        max_members: Option<u32>,
    },
    AddMember {
        team_name: String,
        registration: String,
        role: Option<String>,
    },
    RemoveMember {
        team_name: String,
        registration: String,
    },
    DeleteTeam {
        team_name: String,
    },
    UpdateTeamStatus {
        team_name: String,
        status: TeamStatus,
    },
    AddTeamNote {
        team_name: String,
        note: String,
        created_by: Option<String>,
    },
    PrintTeam {
        team_name: String,
    },
    PrintTeams {
        #[serde(default)]
        tracks: Vec<Track>,
    },
    PostSeeker(SeekerInput),
    RemoveSeeker {
        seeker: String,
    },
    PrintMatchingQueue {
        search: Option<String>,
        #[serde(default)]
        tracks: Vec<Track>,
    },
    SuggestMatches {
        seeker: String,
    },
    CreateTeamFromSeekers {
        seekers: Vec<String>,
    },
    CreateSubmission {
        team_name: String,
        submission: SubmissionInput,
    },
    UpdateSubmissionStatus {
        project_name: String,
        status: SubmissionStatus,
    },
    DeleteSubmission {
        project_name: String,
    },
    PrintSubmission {
        project_name: String,
    },
    AddJudge {
        name: String,
    },
    AssignJudge {
        judge: String,
        project_name: String,
    },
    ScoreSubmission {
        judge: String,
        project_name: String,
        innovation: u8,
        quality: u8,
        impact: u8,
        platform: u8,
        comments: Option<String>,
    },
    AddAward {
        project_name: String,
        award_type: String,
    },
    RemoveAward {
        project_name: String,
        award_type: String,
    },
    PrintLeaderboard {
        #[serde(default)]
        tracks: Vec<Track>,
    },
    PrintDashboard,
    PrintAnalytics,
    PrintEventHealth,
    PrintCountdown,
    GenerateEventReport,
    ExportRegistrations {
        #[serde(default)]
        filter: RegistrationFilter,
        #[serde(default)]
        analytics: bool,
    },
    ExportSelected {
        registrations: Vec<String>,
        #[serde(default)]
        analytics: bool,
    },
    UpdateSettings(SettingsUpdate),
    PrintSettings,
    AdvancePhase,
    ArchiveEvent,
    ResetEvent {
        confirm: bool,
    },
    AddChallenge(ChallengeInput),
    UpdateChallenge {
        challenge_name: String,
        updates: ChallengeInput,
    },
    DeleteChallenge {
        challenge_name: String,
    },
    PrintChallenges,
    AddPrize {
        prize_type: String,
        amount: u64,
        description: Option<String>,
    },
    UpdatePrize {
        prize_type: String,
        amount: u64,
    },
    DeletePrize {
        prize_type: String,
    },
    PrintPrizes,
    SetIntegration {
        integration_type: IntegrationType,
        webhook_url: Option<String>,
        enabled: bool,
    },
    PrintTemplates,
    UpdateTemplate {
        template_type: TemplateType,
        subject: Option<String>,
        body: Option<String>,
    },
    RenderTemplate {
        template_type: TemplateType,
        #[serde(default)]
        values: HashMap<String, String>,
    },
    PrintNotifications,
    MarkNotificationRead {
        id: Uuid,
    },
    MarkNotificationsRead,
    ClearNotifications,
    PrintAuditLog {
        limit: Option<usize>,
    },
    RunScript {
        script_file_path: Option<String>,
    },
}

pub trait CommandExecutor {
    fn execute_command(&mut self, command: Command) -> Result<String, Box<dyn Error>>;
}

const DEFAULT_AUDIT_LIMIT: usize = 20;

fn export_kind(analytics: bool) -> ExportKind {
    if analytics { ExportKind::Analytics } else { ExportKind::Registrations }
}

impl EventSystem {
    fn award_id(&self, submission_id: Uuid, award_type: &str) -> Result<Uuid, EventError> {
        self.state().awards_for(submission_id)
            .into_iter()
            .find(|a| names_equal(&a.award_type, award_type))
            .map(|a| a.id)
            .ok_or_else(|| EventError::not_found_by_name("Award", award_type))
    }

    fn format_team(&self, team_id: Uuid) -> Result<String, EventError> {
        let details = self.team_details(team_id)?;
        let mut out = reporting::format_teams(std::slice::from_ref(&details));
        if !details.notes.is_empty() {
            out.push_str("Notes:\n");
            for note in &details.notes {
                let author = note.created_by.as_deref().unwrap_or("admin");
                let _ = writeln!(out, "- [{}] {}: {}", note.created_at.format("%Y-%m-%d %H:%M"), author, note.note);
            }
        }
        Ok(out)
    }

    fn format_submission(&self, submission_id: Uuid) -> Result<String, EventError> {
        let details = self.submission_details(submission_id)?;
        let submission = &details.submission;
        let mut out = String::new();
        let _ = writeln!(out, "{} by {} ({})", submission.project_name, details.team_name, submission.status);
        if let Some(description) = &submission.description {
            let _ = writeln!(out, "{}", description);
        }
        for (label, link) in submission.links() {
            let _ = writeln!(out, "{}: {}", label, link);
        }
        let averages = details.criteria_averages;
        let _ = writeln!(
            out,
            "Average: {:.2} (innovation {:.1}, quality {:.1}, impact {:.1}, platform {:.1})",
            details.average_score, averages.innovation, averages.quality, averages.impact, averages.platform
        );
        let _ = writeln!(out, "Judges assigned: {}", if details.judges_assigned.is_empty() {
            "none".to_string()
        } else {
            details.judges_assigned.join(", ")
        });
        if !details.awards.is_empty() {
            let _ = writeln!(out, "Awards: {}", details.awards.iter().map(|a| a.award_type.as_str()).join(", "));
        }
        for score in &details.scores {
            let judge = self.state().get_judge(&score.judge_id).map(|j| j.name.as_str()).unwrap_or("unknown");
            let _ = writeln!(out, "- {}: {:.2} {}", judge, score.criteria.mean(), score.comments.as_deref().unwrap_or(""));
        }
        Ok(out)
    }

    fn format_analytics(&self) -> String {
        let series = self.registration_series();
        let mut out = String::from("Registrations per day:\n");
        for (day, total) in &series.cumulative_by_day {
            let _ = writeln!(out, "  {}: {}", day, total);
        }
        let sections = [
            ("By track", &series.by_track),
            ("By role", &series.by_role),
            ("By team status", &series.by_team_status),
        ];
        for (title, counts) in sections {
            let _ = writeln!(out, "{}:", title);
            for count in counts {
                let _ = writeln!(out, "  {}: {}", count.name, count.value);
            }
        }
        out.push_str("Funnel:\n");
        for stage in self.funnel() {
            let _ = writeln!(out, "  {}: {}", stage.name, stage.value);
        }
        let engagement = self.engagement();
        out.push_str("Top challenges:\n");
        for challenge in &engagement.top_challenges {
            let _ = writeln!(out, "  {}: {}", challenge.name, challenge.value);
        }
        out.push_str("Sources:\n");
        for source in &engagement.sources {
            let _ = writeln!(out, "  {}: {}", source.name, source.value);
        }
        let _ = writeln!(out, "Average days to form a team: {:.1}", engagement.average_days_to_team);
        out
    }
}

impl CommandExecutor for EventSystem {
    fn execute_command(&mut self, command: Command) -> Result<String, Box<dyn Error>> {
        let output = match command {
            Command::Register(input) => {
                let id = self.register(input)?;
                let registration = self.state().get_registration(&id)
                    .ok_or_else(|| EventError::not_found("Registration", id))?;
                format!("Registered {} as #{}", registration.full_name, registration.registration_number)
            }
            Command::UpdateRegistration { registration, updates } => {
                let id = self.get_registration_id(&registration)?;
                self.update_registration(id, updates)?;
                format!("Updated registration {}", registration)
            }
            Command::DeleteRegistration { registration } => {
                let id = self.get_registration_id(&registration)?;
                self.delete_registration(id)?;
                format!("Deleted registration {}", registration)
            }
            Command::ListRegistrations { filter } => {
                let registrations = self.filter_registrations(&filter);
                let mut out = format!("{} registrations\n", registrations.len());
                for r in registrations {
                    let _ = writeln!(out, "#{} {} <{}> {} {} {}", r.registration_number, r.full_name, r.email, r.role, r.track, r.team_status);
                }
                out
            }
            Command::PrintRegistrationCount => {
                let capacity = self.registration_capacity();
                format!("{} / {} registered ({} spots left)", capacity.count, capacity.limit, capacity.remaining)
            }
            Command::PrintShareLinks { registration } => {
                let links = self.share_links(self.get_registration_id(&registration)?)?;
                format!(
                    "Referral code: {}\nShare URL: {}\nTwitter: {}\nLinkedIn: {}\nFacebook: {}",
                    links.referral_code, links.share_url, links.twitter, links.linkedin, links.facebook
                )
            }
            Command::CreateTeam { name, track, challenge, max_members } => {
                let id = self.create_team(name.clone(), track, challenge, max_members)?;
                format!("Created team {} ({})", name, id)
            }
            Command::AddMember { team_name, registration, role } => {
                let team_id = self.get_team_id_by_name(&team_name)?;
                let registration_id = self.get_registration_id(&registration)?;
                self.add_member(team_id, registration_id, role)?;
                format!("Added {} to {}", registration, team_name)
            }
            Command::RemoveMember { team_name, registration } => {
                let team_id = self.get_team_id_by_name(&team_name)?;
                let registration_id = self.get_registration_id(&registration)?;
                self.remove_member_from_team(team_id, registration_id)?;
                format!("Removed {} from {}", registration, team_name)
            }
            Command::DeleteTeam { team_name } => {
                self.delete_team(self.get_team_id_by_name(&team_name)?)?;
                format!("Deleted team {}", team_name)
            }
            Command::UpdateTeamStatus { team_name, status } => {
                self.update_team_status(self.get_team_id_by_name(&team_name)?, status)?;
                format!("Team {} is now {}", team_name, status)
            }
            Command::AddTeamNote { team_name, note, created_by } => {
                self.add_team_note(self.get_team_id_by_name(&team_name)?, note, created_by)?;
                format!("Added note to {}", team_name)
            }
            Command::PrintTeam { team_name } => self.format_team(self.get_team_id_by_name(&team_name)?)?,
            Command::PrintTeams { tracks } => {
                let details: Vec<_> = self.teams(&tracks)
                    .into_iter()
                    .map(|t| self.team_details(t.id))
                    .collect::<Result<_, _>>()?;
                reporting::format_teams(&details)
            }
            Command::PostSeeker(input) => {
                let name = input.user_name.clone();
                self.post_seeker(input)?;
                format!("{} is now on the matching board", name)
            }
            Command::RemoveSeeker { seeker } => {
                self.remove_seeker(self.get_seeker_id(&seeker)?)?;
                format!("Removed {} from the matching board", seeker)
            }
            Command::PrintMatchingQueue { search, tracks } => {
                let queue = self.matching_queue(search.as_deref(), &tracks);
                let mut out = format!("{} people looking for a team\n", queue.len());
                for s in queue {
                    let _ = writeln!(
                        out,
                        "{} <{}> {} {} offers [{}] needs [{}]",
                        s.user_name, s.email, s.role, s.track, s.skills_offered.join(", "), s.skills_needed.join(", ")
                    );
                }
                out
            }
            Command::SuggestMatches { seeker } => {
                let matches = self.suggest_matches(self.get_seeker_id(&seeker)?)?;
                if matches.is_empty() {
                    format!("No matches for {} yet", seeker)
                } else {
                    let names = matches.iter().skip(1).map(|s| s.user_name.as_str()).join(", ");
                    format!("Suggested teammates for {}: {}", seeker, names)
                }
            }
            Command::CreateTeamFromSeekers { seekers } => {
                let ids = seekers.iter()
                    .map(|s| self.get_seeker_id(s))
                    .collect::<Result<Vec<_>, _>>()?;
                let team_id = self.create_team_from_seekers(&ids)?;
                let name = self.state().get_team(&team_id).map(|t| t.name.clone()).unwrap_or_default();
                format!("Formed {} from {} seekers", name, ids.len())
            }
            Command::CreateSubmission { team_name, submission } => {
                let project = submission.project_name.clone();
                self.create_submission(self.get_team_id_by_name(&team_name)?, submission)?;
                format!("Submission {} received from {}", project, team_name)
            }
            Command::UpdateSubmissionStatus { project_name, status } => {
                self.update_submission_status(self.get_submission_id_by_name(&project_name)?, status)?;
                format!("Submission {} is now {}", project_name, status)
            }
            Command::DeleteSubmission { project_name } => {
                self.delete_submission(self.get_submission_id_by_name(&project_name)?)?;
                format!("Deleted submission {}", project_name)
            }
            Command::PrintSubmission { project_name } => self.format_submission(self.get_submission_id_by_name(&project_name)?)?,
            Command::AddJudge { name } => {
                self.add_judge(&name)?;
                format!("Added judge {}", name)
            }
            Command::AssignJudge { judge, project_name } => {
                self.assign_judge(self.get_judge_id_by_name(&judge)?, self.get_submission_id_by_name(&project_name)?)?;
                format!("Assigned {} to {}", judge, project_name)
            }
            Command::ScoreSubmission { judge, project_name, innovation, quality, impact, platform, comments } => {
                let criteria = Criteria::new(innovation, quality, impact, platform)?;
                let submission_id = self.get_submission_id_by_name(&project_name)?;
                self.score_submission(self.get_judge_id_by_name(&judge)?, submission_id, criteria, comments)?;
                format!("{} scored {}: average now {:.2}", judge, project_name, self.average_score(submission_id))
            }
            Command::AddAward { project_name, award_type } => {
                self.add_award(self.get_submission_id_by_name(&project_name)?, &award_type)?;
                format!("{} won {}", project_name, award_type)
            }
            Command::RemoveAward { project_name, award_type } => {
                let submission_id = self.get_submission_id_by_name(&project_name)?;
                self.remove_award(self.award_id(submission_id, &award_type)?)?;
                format!("Removed {} from {}", award_type, project_name)
            }
            Command::PrintLeaderboard { tracks } => reporting::format_leaderboard(&self.leaderboard(&tracks)),
            Command::PrintDashboard => {
                let stats = self.dashboard_stats();
                let mut out = format!(
                    "Registrations: {}\nTeams: {}\nSubmissions: {}\n",
                    stats.total_registrations, stats.total_teams, stats.total_submissions
                );
                if let Some(hours) = stats.hours_until_next_phase {
                    let _ = writeln!(out, "Hours until next phase: {}", hours);
                }
                out.push_str("Recent activity:\n");
                for activity in &stats.recent_activity {
                    let _ = writeln!(out, "  {} ({})", activity.content, activity.at.format("%Y-%m-%d %H:%M"));
                }
                out
            }
            Command::PrintAnalytics => self.format_analytics(),
            Command::PrintEventHealth => {
                let health = self.event_health();
                let mut out = format!(
                    "Looking for teams: {}\nTeams without submissions: {}\nScores still needed: {}\nJudges who scored: {}\nPhase progress: {}%\n",
                    health.people_looking, health.teams_without_submissions, health.incomplete_judging,
                    health.judges_who_scored, health.phase_progress
                );
                for warning in &health.warnings {
                    let _ = writeln!(out, "! {}", warning.message);
                }
                out
            }
            Command::PrintCountdown => {
                let countdown = self.countdown();
                let left = countdown.time_left;
                format!(
                    "{}: {}d {}h {}m {}s",
                    countdown.phase.label(), left.days, left.hours, left.minutes, left.seconds
                )
            }
            Command::GenerateEventReport => {
                let path = self.save_event_report()?;
                format!("Report saved to {}", path.display())
            }
            Command::ExportRegistrations { filter, analytics } => {
                let path = self.export_registrations(&filter, export_kind(analytics))?;
                format!("Exported to {}", path.display())
            }
            Command::ExportSelected { registrations, analytics } => {
                let ids = registrations.iter()
                    .map(|r| self.get_registration_id(r))
                    .collect::<Result<Vec<_>, _>>()?;
                let path = self.export_selected(&ids, export_kind(analytics))?;
                format!("Exported {} registrations to {}", ids.len(), path.display())
            }
            Command::UpdateSettings(update) => {
                self.update_settings(update)?;
                "Event settings updated".to_string()
            }
            Command::PrintSettings => serde_json::to_string_pretty(self.state().settings())?,
            Command::AdvancePhase => format!("Event phase is now {}", self.advance_phase()?),
            Command::ArchiveEvent => {
                self.archive_event()?;
                "Event archived".to_string()
            }
            Command::ResetEvent { confirm } => {
                if !confirm {
                    return Err("Reset deletes all registrations, teams, and submissions. Pass confirm: true to proceed.".into());
                }
                let summary = self.reset_event()?;
                format!(
                    "Deleted {} registrations, {} teams, {} submissions, {} seekers",
                    summary.registrations, summary.teams, summary.submissions, summary.seekers
                )
            }
            Command::AddChallenge(input) => {
                let name = input.name.clone();
                self.add_challenge(input)?;
                format!("Added challenge {}", name)
            }
            Command::UpdateChallenge { challenge_name, updates } => {
                let id = self.get_challenge_id_by_name(&challenge_name)?;
                self.update_challenge(id, updates)?;
                format!("Updated challenge {}", challenge_name)
            }
            Command::DeleteChallenge { challenge_name } => {
                let id = self.get_challenge_id_by_name(&challenge_name)?;
                self.delete_challenge(id)?;
                format!("Deleted challenge {}", challenge_name)
            }
            Command::PrintChallenges => self.challenges()
                .iter()
                .map(|c| match &c.sponsor {
                    Some(sponsor) => format!("{}. {} (sponsored by {})", c.display_order + 1, c.name, sponsor),
                    None => format!("{}. {}", c.display_order + 1, c.name),
                })
                .join("\n"),
            Command::AddPrize { prize_type, amount, description } => {
                self.add_prize(&prize_type, amount, description)?;
                format!("Added prize {} (${})", prize_type, amount)
            }
            Command::UpdatePrize { prize_type, amount } => {
                let id = self.get_prize_id_by_type(&prize_type)?;
                self.update_prize_amount(id, amount)?;
                format!("Prize {} is now ${}", prize_type, amount)
            }
            Command::DeletePrize { prize_type } => {
                let id = self.get_prize_id_by_type(&prize_type)?;
                self.delete_prize(id)?;
                format!("Deleted prize {}", prize_type)
            }
            Command::PrintPrizes => self.prizes()
                .iter()
                .map(|p| format!("{}: ${}", p.prize_type, p.amount))
                .join("\n"),
            Command::SetIntegration { integration_type, webhook_url, enabled } => {
                self.upsert_integration(integration_type, webhook_url, enabled)?;
                format!("{} integration {}", integration_type, if enabled { "enabled" } else { "disabled" })
            }
            Command::PrintTemplates => self.templates()
                .iter()
                .map(|t| format!("[{}] {}\n{}", t.template_type.title(), t.subject, t.body))
                .join("\n\n"),
            Command::UpdateTemplate { template_type, subject, body } => {
                self.update_template(template_type, subject, body)?;
                format!("Updated {} template", template_type.title())
            }
            Command::RenderTemplate { template_type, values } => {
                let (subject, body) = self.render_template(template_type, &values)?;
                format!("{}\n\n{}", subject, body)
            }
            Command::PrintNotifications => {
                let center = self.notifications();
                let mut out = format!("{} unread\n", center.unread_count());
                for n in center.list() {
                    let marker = if n.read { " " } else { "*" };
                    let _ = writeln!(out, "{} {} ({}) [{}]", marker, n.message, n.created_at.format("%Y-%m-%d %H:%M"), n.id);
                }
                out
            }
            Command::MarkNotificationRead { id } => {
                self.mark_notification_read(id)?;
                format!("Notification {} marked read", id)
            }
            Command::MarkNotificationsRead => {
                self.mark_all_notifications_read()?;
                "All notifications marked read".to_string()
            }
            Command::ClearNotifications => {
                self.clear_notifications()?;
                "Notifications cleared".to_string()
            }
            Command::PrintAuditLog { limit } => self.recent_audit(limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
                .iter()
                .map(|entry| format!(
                    "{} {} {}{}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.action,
                    entry.entity_type,
                    entry.entity_id.map(|id| format!(" {}", id)).unwrap_or_default()
                ))
                .join("\n"),
            Command::RunScript { .. } => {
                return Err("Scripts cannot be nested; run them from the command line".into());
            }
        };
        Ok(output)
    }
}
