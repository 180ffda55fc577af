// src/core/event_system.rs

use crate::app_config::AppConfig;
use crate::core::analytics::{self, DashboardStats, EngagementStats, EventHealth, NamedCount, RegistrationSeries};
use crate::core::changes::{ChangeEvent, ChangeFeed, ChangeTable, Notification, NotificationCenter};
use crate::core::countdown::{self, Countdown};
use crate::core::error::{EventError, EventResult};
use crate::core::export::{self, ExportKind};
use crate::core::file_system::FileSystem;
use crate::core::matching;
use crate::core::models::{
    get_id_by_name, names_equal, AuditEntry, Award, Challenge, ChallengeInput, ChangeKind, Criteria, EventPhase,
    EventStatus, Integration, IntegrationType, Judge, JudgeAssignment, NameMatches, NotificationTemplate,
    ParticipantTeamStatus, Prize, Registration, RegistrationInput, Score, SeekerInput, SettingsUpdate,
    Submission, SubmissionInput, SubmissionStatus, Team, TeamMember, TeamNote, TeamSeeker, TeamStatus,
    TemplateType, Track, UpdateRegistrationDetails,
};
use crate::core::participants::{self, Capacity, RegistrationFilter, ShareLinks};
use crate::core::reporting::{self, EventReportData};
use crate::core::scoring::{self, CriteriaAverages, LeaderboardEntry};
use crate::core::state::EventState;

use chrono::Utc;
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct MemberView {
    pub member_id: Uuid,
    pub registration_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TeamDetails {
    pub team: Team,
    pub members: Vec<MemberView>,
    pub notes: Vec<TeamNote>,
    pub submission: Option<Submission>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmissionDetails {
    pub submission: Submission,
    pub team_name: String,
    pub average_score: f64,
    pub criteria_averages: CriteriaAverages,
    pub scores: Vec<Score>,
    pub awards: Vec<Award>,
    pub judges_assigned: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub registrations: usize,
    pub teams: usize,
    pub submissions: usize,
    pub seekers: usize,
}

pub struct EventSystem {
    state: EventState,
    config: AppConfig,
    feed: ChangeFeed,
}

impl EventSystem {
    pub fn new(config: AppConfig, state: Option<EventState>) -> Self {
        let state = state.unwrap_or_else(EventState::new);
        let feed = ChangeFeed::new(config.feed_capacity);
        Self { state, config, feed }
    }

    pub fn state(&self) -> &EventState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AppConfig) {
        self.config = config;
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    pub fn save_state(&self) -> EventResult<()> {
        FileSystem::save_state(&self.state, &self.config.state_file)
    }

    /// Persists, records the audit entry, and then publishes the changes.
    fn commit(&mut self, audit: AuditEntry, changes: Vec<ChangeEvent>) -> EventResult<()> {
        self.state.record_audit(audit);
        for change in &changes {
            if let Some(notification) = Notification::from_change(change) {
                self.state.notifications_mut().push(notification);
            }
        }
        self.state.update_timestamp();
        self.save_state()?;
        for change in changes {
            self.feed.publish(change);
        }
        Ok(())
    }

    fn ensure_active(&self) -> EventResult<()> {
        if self.state.settings().is_archived() {
            return Err(EventError::EventArchived);
        }
        Ok(())
    }

    // Lookups

    /// Full names can repeat; an ambiguous name is rejected and the email
    /// has to be used instead.
    pub fn get_registration_id(&self, name_or_email: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.registrations(), "Registration", name_or_email)
    }

    pub fn get_team_id_by_name(&self, name: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.teams(), "Team", name)
    }

    pub fn get_seeker_id(&self, name_or_email: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.team_seekers(), "Seeker", name_or_email)
    }

    pub fn get_submission_id_by_name(&self, project_name: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.submissions(), "Submission", project_name)
    }

    pub fn get_judge_id_by_name(&self, name: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.judges(), "Judge", name)
    }

    pub fn get_challenge_id_by_name(&self, name: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.challenges(), "Challenge", name)
    }

    pub fn get_prize_id_by_type(&self, prize_type: &str) -> EventResult<Uuid> {
        get_id_by_name(self.state.prizes(), "Prize", prize_type)
    }

    fn team(&self, id: Uuid) -> EventResult<&Team> {
        self.state.get_team(&id).ok_or_else(|| EventError::not_found("Team", id))
    }

    fn submission(&self, id: Uuid) -> EventResult<&Submission> {
        self.state.get_submission(&id).ok_or_else(|| EventError::not_found("Submission", id))
    }

    // Registration

    pub fn registration_limit(&self) -> u32 {
        self.state.settings().registration_limit.unwrap_or(self.config.registration_limit)
    }

    pub fn registration_count(&self) -> usize {
        self.state.registrations().len()
    }

    pub fn registration_capacity(&self) -> Capacity {
        Capacity::new(self.registration_count(), self.registration_limit())
    }

    pub fn register(&mut self, input: RegistrationInput) -> EventResult<Uuid> {
        self.ensure_active()?;
        if let Some(deadline) = self.state.settings().registration_deadline {
            if Utc::now() > deadline {
                return Err(EventError::RegistrationClosed);
            }
        }
        input.validate()?;
        if self.state.find_registration_by_email(&input.email).is_some() {
            return Err(EventError::AlreadyRegistered);
        }
        let capacity = self.registration_capacity();
        if capacity.is_full() {
            return Err(EventError::RegistrationFull { limit: capacity.limit });
        }

        let number = self.state.take_registration_number();
        let registration = Registration::new(input, number)?;
        let summary = registration.display_name();
        let track = registration.track;
        let id = self.state.add_registration(registration);
        info!("Registration #{} created for {}", number, summary);

        self.commit(
            AuditEntry::new("register", "registration", Some(id), Some(json!({ "number": number, "track": track }))),
            vec![ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Insert, Some(id), summary)],
        )?;
        Ok(id)
    }

    pub fn filter_registrations(&self, filter: &RegistrationFilter) -> Vec<&Registration> {
        participants::filter_registrations(&self.state, filter)
    }

    pub fn update_registration(&mut self, id: Uuid, updates: UpdateRegistrationDetails) -> EventResult<()> {
        let registration = self.state.get_registration_mut(&id)
            .ok_or_else(|| EventError::not_found("Registration", id))?;

        if let Some(name) = updates.full_name {
            if name.trim().is_empty() {
                return Err(EventError::invalid("Full name is required"));
            }
            registration.full_name = name.trim().to_string();
        }
        if let Some(company) = updates.company {
            registration.company = Some(company.trim().to_string()).filter(|c| !c.is_empty());
        }
        if let Some(role) = updates.role {
            registration.role = role.trim().to_string();
        }
        if let Some(track) = updates.track {
            registration.track = track;
        }
        if let Some(challenges) = updates.challenges {
            registration.challenges = challenges;
        }
        if let Some(status) = updates.team_status {
            registration.team_status = status;
        }
        if let Some(level) = updates.experience_level {
            registration.experience_level = level;
        }
        let summary = registration.display_name();

        self.commit(
            AuditEntry::new("update", "registration", Some(id), None),
            vec![ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Update, Some(id), summary)],
        )
    }

    pub fn delete_registration(&mut self, id: Uuid) -> EventResult<()> {
        let (registration, memberships) = self.state.remove_registration(id)
            .ok_or_else(|| EventError::not_found("Registration", id))?;

        let mut changes = vec![ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Delete, Some(id), registration.display_name())];
        for member in &memberships {
            changes.push(ChangeEvent::new(ChangeTable::TeamMembers, ChangeKind::Delete, Some(member.id), registration.full_name.clone()));
            changes.extend(self.reopen_team(member.team_id));
        }

        self.commit(
            AuditEntry::new("delete", "registration", Some(id), Some(json!({ "email": registration.email }))),
            changes,
        )
    }

    pub fn share_links(&self, registration_id: Uuid) -> EventResult<ShareLinks> {
        let registration = self.state.get_registration(&registration_id)
            .ok_or_else(|| EventError::not_found("Registration", registration_id))?;
        participants::share_links(&self.config.public_url, &self.state.settings().event_name, registration)
    }

    // Teams

    pub fn create_team(&mut self, name: String, track: Track, challenge: Option<String>, max_members: Option<u32>) -> EventResult<Uuid> {
        if self.state.team_name_taken(&name) {
            return Err(EventError::DuplicateTeamName(name.trim().to_string()));
        }
        let team = Team::new(name, track, challenge, max_members.unwrap_or(self.config.default_max_members))?;
        let summary = team.name.clone();
        let id = self.state.add_team(team);
        info!("Team {} created", summary);

        self.commit(
            AuditEntry::new("create", "team", Some(id), Some(json!({ "name": summary, "track": track }))),
            vec![ChangeEvent::new(ChangeTable::Teams, ChangeKind::Insert, Some(id), summary)],
        )?;
        Ok(id)
    }

    /// A complete team with a free seat goes back to forming.
    fn reopen_team(&mut self, team_id: Uuid) -> Option<ChangeEvent> {
        let count = self.state.member_count(team_id);
        let team = self.state.get_team_mut(&team_id)?;
        if team.status == TeamStatus::Complete && (count as u32) < team.max_members {
            team.set_status(TeamStatus::Forming);
            return Some(ChangeEvent::new(ChangeTable::Teams, ChangeKind::Update, Some(team_id), team.name.clone()));
        }
        None
    }

    pub fn add_member(&mut self, team_id: Uuid, registration_id: Uuid, role: Option<String>) -> EventResult<Uuid> {
        let team = self.team(team_id)?;
        let registration = self.state.get_registration(&registration_id)
            .ok_or_else(|| EventError::not_found("Registration", registration_id))?;
        if self.state.membership_of(registration_id).is_some() {
            return Err(EventError::AlreadyOnTeam);
        }
        let count = self.state.member_count(team_id) as u32;
        if count >= team.max_members {
            return Err(EventError::TeamFull { team: team.name.clone(), max_members: team.max_members });
        }
        let member_name = registration.full_name.clone();
        let role = role.or_else(|| Some(registration.role.clone()));

        let member_id = self.state.add_member(TeamMember::new(team_id, registration_id, role));
        if let Some(registration) = self.state.get_registration_mut(&registration_id) {
            registration.team_status = ParticipantTeamStatus::HasTeam;
        }

        let mut changes = vec![
            ChangeEvent::new(ChangeTable::TeamMembers, ChangeKind::Insert, Some(member_id), member_name.clone()),
            ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Update, Some(registration_id), member_name),
        ];
        if let Some(team) = self.state.get_team_mut(&team_id) {
            if count + 1 >= team.max_members && team.status == TeamStatus::Forming {
                team.set_status(TeamStatus::Complete);
            } else {
                team.touch();
            }
            changes.push(ChangeEvent::new(ChangeTable::Teams, ChangeKind::Update, Some(team_id), team.name.clone()));
        }

        self.commit(
            AuditEntry::new("add_member", "team", Some(team_id), Some(json!({ "registration_id": registration_id }))),
            changes,
        )?;
        Ok(member_id)
    }

    pub fn remove_member(&mut self, member_id: Uuid) -> EventResult<()> {
        let member = self.state.remove_member(member_id)
            .ok_or_else(|| EventError::not_found("Team member", member_id))?;

        let mut changes = vec![ChangeEvent::new(ChangeTable::TeamMembers, ChangeKind::Delete, Some(member_id), String::new())];
        if let Some(registration) = self.state.get_registration_mut(&member.registration_id) {
            registration.team_status = ParticipantTeamStatus::Looking;
            changes.push(ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Update, Some(registration.id), registration.full_name.clone()));
        }
        changes.extend(self.reopen_team(member.team_id));

        self.commit(
            AuditEntry::new("remove_member", "team", Some(member.team_id), Some(json!({ "registration_id": member.registration_id }))),
            changes,
        )
    }

    pub fn remove_member_from_team(&mut self, team_id: Uuid, registration_id: Uuid) -> EventResult<()> {
        let member_id = self.state.membership_of(registration_id)
            .filter(|m| m.team_id == team_id)
            .map(|m| m.id)
            .ok_or_else(|| EventError::invalid("That participant is not on this team"))?;
        self.remove_member(member_id)
    }

    pub fn delete_team(&mut self, team_id: Uuid) -> EventResult<()> {
        let member_registrations: Vec<Uuid> = self.state.members_of(team_id)
            .iter()
            .map(|m| m.registration_id)
            .collect();
        let team = self.state.remove_team_cascade(team_id)
            .ok_or_else(|| EventError::not_found("Team", team_id))?;

        let mut changes = vec![ChangeEvent::new(ChangeTable::Teams, ChangeKind::Delete, Some(team_id), team.name.clone())];
        for registration_id in member_registrations {
            if let Some(registration) = self.state.get_registration_mut(&registration_id) {
                registration.team_status = ParticipantTeamStatus::Looking;
                changes.push(ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Update, Some(registration_id), registration.full_name.clone()));
            }
        }
        info!("Team {} deleted", team.name);

        self.commit(
            AuditEntry::new("delete", "team", Some(team_id), Some(json!({ "name": team.name }))),
            changes,
        )
    }

    pub fn update_team_status(&mut self, team_id: Uuid, status: TeamStatus) -> EventResult<()> {
        let team = self.state.get_team_mut(&team_id)
            .ok_or_else(|| EventError::not_found("Team", team_id))?;
        let previous = team.status;
        team.set_status(status);
        let name = team.name.clone();

        self.commit(
            AuditEntry::new("update_status", "team", Some(team_id), Some(json!({ "from": previous, "to": status }))),
            vec![ChangeEvent::new(ChangeTable::Teams, ChangeKind::Update, Some(team_id), name)],
        )
    }

    pub fn add_team_note(&mut self, team_id: Uuid, note: String, created_by: Option<String>) -> EventResult<Uuid> {
        self.team(team_id)?;
        let note = TeamNote::new(team_id, note, created_by)?;
        let id = self.state.add_note(note);

        self.commit(
            AuditEntry::new("add_note", "team", Some(team_id), None),
            vec![ChangeEvent::new(ChangeTable::TeamNotes, ChangeKind::Insert, Some(id), String::new())],
        )?;
        Ok(id)
    }

    pub fn team_details(&self, team_id: Uuid) -> EventResult<TeamDetails> {
        let team = self.team(team_id)?.clone();
        let members = self.state.members_of(team_id)
            .into_iter()
            .map(|m| {
                let registration = self.state.get_registration(&m.registration_id);
                MemberView {
                    member_id: m.id,
                    registration_id: m.registration_id,
                    name: registration.map(|r| r.full_name.clone()).unwrap_or_default(),
                    email: registration.map(|r| r.email.clone()).unwrap_or_default(),
                    role: m.role.clone()
                        .or_else(|| registration.map(|r| r.role.clone()))
                        .unwrap_or_default(),
                }
            })
            .collect();

        Ok(TeamDetails {
            team,
            members,
            notes: self.state.notes_of(team_id).into_iter().cloned().collect(),
            submission: self.state.submission_for_team(team_id).cloned(),
        })
    }

    /// Teams ordered by creation, optionally limited to some tracks.
    pub fn teams(&self, tracks: &[Track]) -> Vec<&Team> {
        self.state.teams().values()
            .filter(|t| tracks.is_empty() || tracks.contains(&t.track))
            .sorted_by_key(|t| t.created_at)
            .collect()
    }

    // Matching board

    pub fn post_seeker(&mut self, input: SeekerInput) -> EventResult<Uuid> {
        self.ensure_active()?;
        let seeker = TeamSeeker::new(input)?;
        let summary = seeker.user_name.clone();
        let id = self.state.add_seeker(seeker);

        self.commit(
            AuditEntry::new("post", "team_seeker", Some(id), None),
            vec![ChangeEvent::new(ChangeTable::TeamSeekers, ChangeKind::Insert, Some(id), summary)],
        )?;
        Ok(id)
    }

    pub fn remove_seeker(&mut self, seeker_id: Uuid) -> EventResult<()> {
        let seeker = self.state.remove_seeker(seeker_id)
            .ok_or_else(|| EventError::not_found("Seeker", seeker_id))?;

        self.commit(
            AuditEntry::new("delete", "team_seeker", Some(seeker_id), None),
            vec![ChangeEvent::new(ChangeTable::TeamSeekers, ChangeKind::Delete, Some(seeker_id), seeker.user_name)],
        )
    }

    pub fn seekers(&self, tracks: &[Track]) -> Vec<&TeamSeeker> {
        matching::seekers(&self.state, tracks)
    }

    pub fn matching_queue(&self, search: Option<&str>, tracks: &[Track]) -> Vec<&TeamSeeker> {
        matching::matching_queue(&self.state, search, tracks)
    }

    pub fn suggest_matches(&self, seeker_id: Uuid) -> EventResult<Vec<&TeamSeeker>> {
        matching::suggest_matches(&self.state, seeker_id)
    }

    pub fn create_team_from_seekers(&mut self, seeker_ids: &[Uuid]) -> EventResult<Uuid> {
        let plan = matching::plan_team_from_seekers(&self.state, seeker_ids)?;
        let team = Team::new(plan.name.clone(), plan.track, None, self.config.default_max_members)?;
        let team_id = self.state.add_team(team);

        let mut changes = vec![ChangeEvent::new(ChangeTable::Teams, ChangeKind::Insert, Some(team_id), plan.name.clone())];
        for registration_id in plan.registration_ids.iter().take(self.config.default_max_members as usize) {
            let member_id = self.state.add_member(TeamMember::new(team_id, *registration_id, None));
            if let Some(registration) = self.state.get_registration_mut(registration_id) {
                registration.team_status = ParticipantTeamStatus::HasTeam;
                changes.push(ChangeEvent::new(ChangeTable::TeamMembers, ChangeKind::Insert, Some(member_id), registration.full_name.clone()));
            }
        }
        // Only seekers whose registration landed on this team leave the board.
        let placed: Vec<Uuid> = plan.seeker_ids.iter()
            .copied()
            .filter(|seeker_id| {
                self.state.get_seeker(seeker_id)
                    .and_then(|s| self.state.find_registration_by_email(&s.email))
                    .and_then(|r| self.state.membership_of(r.id))
                    .is_some_and(|m| m.team_id == team_id)
            })
            .collect();
        for seeker_id in &placed {
            if let Some(seeker) = self.state.get_seeker_mut(seeker_id) {
                seeker.looking_for_team = false;
                changes.push(ChangeEvent::new(ChangeTable::TeamSeekers, ChangeKind::Update, Some(*seeker_id), seeker.user_name.clone()));
            }
        }
        info!("Formed {} from {} seekers, {} placed", plan.name, plan.seeker_ids.len(), placed.len());

        self.commit(
            AuditEntry::new("create_from_seekers", "team", Some(team_id), Some(json!({ "seekers": plan.seeker_ids }))),
            changes,
        )?;
        Ok(team_id)
    }

    // Submissions and judging

    pub fn create_submission(&mut self, team_id: Uuid, input: SubmissionInput) -> EventResult<Uuid> {
        self.ensure_active()?;
        self.team(team_id)?;
        if self.state.submission_for_team(team_id).is_some() {
            return Err(EventError::DuplicateSubmission);
        }
        if self.state.project_name_taken(&input.project_name) {
            return Err(EventError::DuplicateProjectName(input.project_name.trim().to_string()));
        }
        let submission = Submission::new(team_id, input)?;
        let summary = submission.project_name.clone();
        let id = self.state.add_submission(submission);

        let mut changes = vec![ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Insert, Some(id), summary.clone())];
        if let Some(team) = self.state.get_team_mut(&team_id) {
            team.set_status(TeamStatus::Submitted);
            changes.push(ChangeEvent::new(ChangeTable::Teams, ChangeKind::Update, Some(team_id), team.name.clone()));
        }
        info!("Submission {} received", summary);

        self.commit(
            AuditEntry::new("submit", "submission", Some(id), Some(json!({ "team_id": team_id, "project": summary }))),
            changes,
        )?;
        Ok(id)
    }

    pub fn update_submission_status(&mut self, submission_id: Uuid, status: SubmissionStatus) -> EventResult<()> {
        let submission = self.state.get_submission_mut(&submission_id)
            .ok_or_else(|| EventError::not_found("Submission", submission_id))?;
        let previous = submission.status;
        submission.set_status(status);
        let name = submission.project_name.clone();

        self.commit(
            AuditEntry::new("update_status", "submission", Some(submission_id), Some(json!({ "from": previous, "to": status }))),
            vec![ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Update, Some(submission_id), name)],
        )
    }

    pub fn delete_submission(&mut self, submission_id: Uuid) -> EventResult<()> {
        let submission = self.state.remove_submission_cascade(submission_id)
            .ok_or_else(|| EventError::not_found("Submission", submission_id))?;

        let mut changes = vec![ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Delete, Some(submission_id), submission.project_name.clone())];
        if let Some(team) = self.state.get_team_mut(&submission.team_id) {
            if team.status == TeamStatus::Submitted {
                team.set_status(TeamStatus::Building);
                changes.push(ChangeEvent::new(ChangeTable::Teams, ChangeKind::Update, Some(team.id), team.name.clone()));
            }
        }

        self.commit(
            AuditEntry::new("delete", "submission", Some(submission_id), Some(json!({ "project": submission.project_name }))),
            changes,
        )
    }

    pub fn add_judge(&mut self, name: &str) -> EventResult<Uuid> {
        if self.state.judges().values().any(|j| j.name_matches(name)) {
            return Err(EventError::invalid(format!("Judge {} already exists", name.trim())));
        }
        let judge = Judge::new(name)?;
        let summary = judge.name.clone();
        let id = self.state.add_judge(judge);

        self.commit(
            AuditEntry::new("create", "judge", Some(id), None),
            vec![ChangeEvent::new(ChangeTable::Judges, ChangeKind::Insert, Some(id), summary)],
        )?;
        Ok(id)
    }

    /// Assigning twice returns the existing assignment.
    pub fn assign_judge(&mut self, judge_id: Uuid, submission_id: Uuid) -> EventResult<Uuid> {
        self.state.get_judge(&judge_id).ok_or_else(|| EventError::not_found("Judge", judge_id))?;
        self.submission(submission_id)?;
        if let Some(existing) = self.state.find_assignment(judge_id, submission_id) {
            debug!("Judge {} already assigned to {}", judge_id, submission_id);
            return Ok(existing.id);
        }

        let id = self.state.add_assignment(JudgeAssignment::new(judge_id, submission_id));
        let mut changes = vec![ChangeEvent::new(ChangeTable::JudgeAssignments, ChangeKind::Insert, Some(id), String::new())];
        if let Some(submission) = self.state.get_submission_mut(&submission_id) {
            if submission.status == SubmissionStatus::PendingReview {
                submission.set_status(SubmissionStatus::InJudging);
                changes.push(ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Update, Some(submission_id), submission.project_name.clone()));
            }
        }

        self.commit(
            AuditEntry::new("assign", "judge", Some(judge_id), Some(json!({ "submission_id": submission_id }))),
            changes,
        )?;
        Ok(id)
    }

    pub fn score_submission(&mut self, judge_id: Uuid, submission_id: Uuid, criteria: Criteria, comments: Option<String>) -> EventResult<Uuid> {
        self.state.get_judge(&judge_id).ok_or_else(|| EventError::not_found("Judge", judge_id))?;
        self.submission(submission_id)?;
        let score = Score::new(submission_id, judge_id, criteria, comments)?;
        let score_id = score.id;
        let replaced = self.state.upsert_score(score);

        let kind = if replaced.is_some() { ChangeKind::Update } else { ChangeKind::Insert };
        let mut changes = vec![ChangeEvent::new(ChangeTable::Scores, kind, Some(score_id), String::new())];
        if let Some(submission) = self.state.get_submission_mut(&submission_id) {
            if submission.status != SubmissionStatus::Winner {
                submission.set_status(SubmissionStatus::Scored);
                changes.push(ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Update, Some(submission_id), submission.project_name.clone()));
            }
        }

        self.commit(
            AuditEntry::new("score", "submission", Some(submission_id), Some(json!({
                "judge_id": judge_id,
                "criteria": criteria,
                "replaced": replaced.is_some(),
            }))),
            changes,
        )?;
        Ok(score_id)
    }

    pub fn average_score(&self, submission_id: Uuid) -> f64 {
        scoring::average_score(&self.state, submission_id)
    }

    pub fn leaderboard(&self, tracks: &[Track]) -> Vec<LeaderboardEntry> {
        scoring::leaderboard(&self.state, tracks)
    }

    pub fn submissions(&self, status: Option<SubmissionStatus>) -> Vec<&Submission> {
        self.state.submissions().values()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .sorted_by(|a, b| b.submitted_at.cmp(&a.submitted_at))
            .collect()
    }

    pub fn submission_details(&self, submission_id: Uuid) -> EventResult<SubmissionDetails> {
        let submission = self.submission(submission_id)?.clone();
        let team_name = self.state.get_team(&submission.team_id)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        let judges_assigned = self.state.judge_assignments().values()
            .filter(|a| a.submission_id == submission_id)
            .filter_map(|a| self.state.get_judge(&a.judge_id))
            .map(|j| j.name.clone())
            .sorted()
            .collect();

        Ok(SubmissionDetails {
            team_name,
            average_score: scoring::average_score(&self.state, submission_id),
            criteria_averages: scoring::criteria_averages(&self.state, submission_id),
            scores: self.state.scores_for(submission_id).into_iter().cloned().sorted_by_key(|s| s.scored_at).collect(),
            awards: self.state.awards_for(submission_id).into_iter().cloned().collect(),
            judges_assigned,
            submission,
        })
    }

    pub fn add_award(&mut self, submission_id: Uuid, award_type: &str) -> EventResult<Uuid> {
        self.submission(submission_id)?;
        let award = Award::new(submission_id, award_type)?;
        if self.state.awards_for(submission_id).iter().any(|a| names_equal(&a.award_type, &award.award_type)) {
            return Err(EventError::DuplicateAward(award.award_type));
        }
        let label = award.award_type.clone();
        let id = self.state.add_award(award);

        let mut changes = vec![ChangeEvent::new(ChangeTable::Awards, ChangeKind::Insert, Some(id), label.clone())];
        if let Some(submission) = self.state.get_submission_mut(&submission_id) {
            submission.set_status(SubmissionStatus::Winner);
            changes.push(ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Update, Some(submission_id), submission.project_name.clone()));
        }
        info!("Award {} given to submission {}", label, submission_id);

        self.commit(
            AuditEntry::new("award", "submission", Some(submission_id), Some(json!({ "award": label }))),
            changes,
        )?;
        Ok(id)
    }

    pub fn remove_award(&mut self, award_id: Uuid) -> EventResult<()> {
        let award = self.state.remove_award(award_id)
            .ok_or_else(|| EventError::not_found("Award", award_id))?;
        let submission_id = award.submission_id;

        let mut changes = vec![ChangeEvent::new(ChangeTable::Awards, ChangeKind::Delete, Some(award_id), award.award_type.clone())];
        if self.state.awards_for(submission_id).is_empty() {
            let fallback = if self.state.scores_for(submission_id).is_empty() {
                SubmissionStatus::PendingReview
            } else {
                SubmissionStatus::Scored
            };
            if let Some(submission) = self.state.get_submission_mut(&submission_id) {
                submission.set_status(fallback);
                changes.push(ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Update, Some(submission_id), submission.project_name.clone()));
            }
        }

        self.commit(
            AuditEntry::new("remove_award", "submission", Some(submission_id), Some(json!({ "award": award.award_type }))),
            changes,
        )
    }

    // Analytics

    pub fn dashboard_stats(&self) -> DashboardStats {
        analytics::dashboard_stats(&self.state, Utc::now())
    }

    pub fn registration_series(&self) -> RegistrationSeries {
        analytics::registration_series(&self.state)
    }

    pub fn funnel(&self) -> Vec<NamedCount> {
        analytics::funnel(&self.state)
    }

    pub fn engagement(&self) -> EngagementStats {
        analytics::engagement(&self.state)
    }

    pub fn event_health(&self) -> EventHealth {
        analytics::event_health(&self.state, self.config.judges_per_submission)
    }

    pub fn countdown(&self) -> Countdown {
        countdown::countdown(self.state.settings(), Utc::now())
    }

    // Reports

    pub fn event_report(&self) -> String {
        let teams = self.teams(&[])
            .into_iter()
            .filter_map(|t| self.team_details(t.id).ok())
            .collect();
        let data = EventReportData {
            settings: self.state.settings(),
            capacity: self.registration_capacity(),
            dashboard: self.dashboard_stats(),
            funnel: self.funnel(),
            engagement: self.engagement(),
            health: self.event_health(),
            countdown: self.countdown(),
            leaderboard: self.leaderboard(&[]),
            teams,
            generated_at: Utc::now(),
        };
        reporting::format_event_report(&data)
    }

    pub fn save_event_report(&self) -> EventResult<PathBuf> {
        let report = self.event_report();
        let path = FileSystem::report_file_path(
            Path::new(&self.config.state_file),
            &self.state.settings().event_name,
            "Event summary",
            Utc::now().date_naive(),
        );
        FileSystem::write_file(&path, report.as_bytes())?;
        info!("Event report saved to {}", path.display());
        Ok(path)
    }

    // Export

    fn write_export(&self, registrations: &[&Registration], kind: ExportKind) -> EventResult<PathBuf> {
        let path = FileSystem::export_file_path(Path::new(&self.config.state_file), kind, Utc::now().date_naive());
        let csv = export::registrations_csv(registrations, kind)?;
        FileSystem::write_file(&path, csv.as_bytes())?;
        info!("Exported {} registrations to {}", registrations.len(), path.display());
        Ok(path)
    }

    pub fn export_registrations(&self, filter: &RegistrationFilter, kind: ExportKind) -> EventResult<PathBuf> {
        let registrations = self.filter_registrations(filter);
        self.write_export(&registrations, kind)
    }

    pub fn export_selected(&self, ids: &[Uuid], kind: ExportKind) -> EventResult<PathBuf> {
        let registrations = ids.iter()
            .map(|id| self.state.get_registration(id).ok_or_else(|| EventError::not_found("Registration", *id)))
            .collect::<EventResult<Vec<_>>>()?;
        self.write_export(&registrations, kind)
    }

    // Settings

    pub fn update_settings(&mut self, update: SettingsUpdate) -> EventResult<()> {
        let mut settings = self.state.settings().clone();
        let details = serde_json::to_value(&update)?;
        settings.apply(update)?;
        self.state.set_settings(settings);

        self.commit(
            AuditEntry::new("update", "event_settings", None, Some(details)),
            vec![ChangeEvent::new(ChangeTable::EventSettings, ChangeKind::Update, None, self.state.settings().event_name.clone())],
        )
    }

    pub fn advance_phase(&mut self) -> EventResult<EventPhase> {
        let settings = self.state.settings_mut();
        let previous = settings.current_phase;
        settings.current_phase = previous.next();
        settings.updated_at = Utc::now();
        let next = settings.current_phase;
        info!("Event phase {} -> {}", previous, next);

        self.commit(
            AuditEntry::new("advance_phase", "event_settings", None, Some(json!({ "from": previous, "to": next }))),
            vec![ChangeEvent::new(ChangeTable::EventSettings, ChangeKind::Update, None, next.label())],
        )?;
        Ok(next)
    }

    pub fn archive_event(&mut self) -> EventResult<()> {
        let settings = self.state.settings_mut();
        settings.event_status = EventStatus::Archived;
        settings.updated_at = Utc::now();

        self.commit(
            AuditEntry::new("archive", "event_settings", None, None),
            vec![ChangeEvent::new(ChangeTable::EventSettings, ChangeKind::Update, None, "archived")],
        )
    }

    /// Deletes every participant record. Settings, catalog, judges, and the
    /// registration counter survive.
    pub fn reset_event(&mut self) -> EventResult<ResetSummary> {
        let summary = ResetSummary {
            registrations: self.state.registrations().len(),
            teams: self.state.teams().len(),
            submissions: self.state.submissions().len(),
            seekers: self.state.team_seekers().len(),
        };
        self.state.clear_participant_data();
        info!("Event data reset: {:?}", summary);

        let changes = [
            ChangeTable::Scores,
            ChangeTable::Awards,
            ChangeTable::JudgeAssignments,
            ChangeTable::Submissions,
            ChangeTable::TeamMembers,
            ChangeTable::TeamNotes,
            ChangeTable::Teams,
            ChangeTable::TeamSeekers,
            ChangeTable::Registrations,
        ]
        .into_iter()
        .map(|table| ChangeEvent::new(table, ChangeKind::Delete, None, "reset"))
        .collect();

        self.commit(
            AuditEntry::new("reset", "event", None, Some(serde_json::to_value(&summary)?)),
            changes,
        )?;
        Ok(summary)
    }

    pub fn challenges(&self) -> Vec<&Challenge> {
        self.state.challenges().values()
            .sorted_by_key(|c| (c.display_order, c.created_at))
            .collect()
    }

    pub fn add_challenge(&mut self, input: ChallengeInput) -> EventResult<Uuid> {
        let challenge = Challenge::new(input, self.state.challenges().len() as u32)?;
        let name = challenge.name.clone();
        let id = self.state.add_challenge(challenge);

        self.commit(
            AuditEntry::new("create", "challenge", Some(id), Some(json!({ "name": name }))),
            vec![ChangeEvent::new(ChangeTable::Challenges, ChangeKind::Insert, Some(id), name)],
        )?;
        Ok(id)
    }

    pub fn update_challenge(&mut self, id: Uuid, input: ChallengeInput) -> EventResult<()> {
        let challenge = self.state.get_challenge_mut(&id)
            .ok_or_else(|| EventError::not_found("Challenge", id))?;
        challenge.update(input)?;
        let name = challenge.name.clone();

        self.commit(
            AuditEntry::new("update", "challenge", Some(id), None),
            vec![ChangeEvent::new(ChangeTable::Challenges, ChangeKind::Update, Some(id), name)],
        )
    }

    pub fn delete_challenge(&mut self, id: Uuid) -> EventResult<()> {
        let challenge = self.state.remove_challenge(id)
            .ok_or_else(|| EventError::not_found("Challenge", id))?;

        self.commit(
            AuditEntry::new("delete", "challenge", Some(id), Some(json!({ "name": challenge.name }))),
            vec![ChangeEvent::new(ChangeTable::Challenges, ChangeKind::Delete, Some(id), challenge.name)],
        )
    }

    /// Largest prize first.
    pub fn prizes(&self) -> Vec<&Prize> {
        self.state.prizes().values()
            .sorted_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.prize_type.cmp(&b.prize_type)))
            .collect()
    }

    pub fn add_prize(&mut self, prize_type: &str, amount: u64, description: Option<String>) -> EventResult<Uuid> {
        let prize = Prize::new(prize_type, amount, description)?;
        let label = prize.prize_type.clone();
        let id = self.state.add_prize(prize);

        self.commit(
            AuditEntry::new("create", "prize", Some(id), Some(json!({ "prize_type": label, "amount": amount }))),
            vec![ChangeEvent::new(ChangeTable::Prizes, ChangeKind::Insert, Some(id), label)],
        )?;
        Ok(id)
    }

    pub fn update_prize_amount(&mut self, id: Uuid, amount: u64) -> EventResult<()> {
        let prize = self.state.get_prize_mut(&id)
            .ok_or_else(|| EventError::not_found("Prize", id))?;
        prize.amount = amount;
        prize.updated_at = Utc::now();
        let label = prize.prize_type.clone();

        self.commit(
            AuditEntry::new("update", "prize", Some(id), Some(json!({ "amount": amount }))),
            vec![ChangeEvent::new(ChangeTable::Prizes, ChangeKind::Update, Some(id), label)],
        )
    }

    pub fn delete_prize(&mut self, id: Uuid) -> EventResult<()> {
        let prize = self.state.remove_prize(id)
            .ok_or_else(|| EventError::not_found("Prize", id))?;

        self.commit(
            AuditEntry::new("delete", "prize", Some(id), Some(json!({ "prize_type": prize.prize_type }))),
            vec![ChangeEvent::new(ChangeTable::Prizes, ChangeKind::Delete, Some(id), prize.prize_type)],
        )
    }

    /// One integration per type; a second call updates the first.
    pub fn upsert_integration(&mut self, integration_type: IntegrationType, webhook_url: Option<String>, enabled: bool) -> EventResult<Uuid> {
        let (id, kind) = match self.state.integration_by_type_mut(integration_type) {
            Some(existing) => {
                existing.update(webhook_url, enabled)?;
                (existing.id, ChangeKind::Update)
            }
            None => {
                let integration = Integration::new(integration_type, webhook_url, enabled)?;
                (self.state.add_integration(integration), ChangeKind::Insert)
            }
        };

        self.commit(
            AuditEntry::new("upsert", "integration", Some(id), Some(json!({ "type": integration_type, "enabled": enabled }))),
            vec![ChangeEvent::new(ChangeTable::Integrations, kind, Some(id), integration_type.to_string())],
        )?;
        Ok(id)
    }

    pub fn active_webhooks(&self) -> Vec<(IntegrationType, String)> {
        self.state.integrations().values()
            .filter_map(|i| i.active_webhook().map(|url| (i.integration_type, url.to_string())))
            .sorted_by_key(|(t, _)| t.to_string())
            .collect()
    }

    pub fn templates(&self) -> Vec<&NotificationTemplate> {
        TemplateType::ALL.iter()
            .filter_map(|t| self.state.template_by_type(*t))
            .collect()
    }

    pub fn update_template(&mut self, template_type: TemplateType, subject: Option<String>, body: Option<String>) -> EventResult<()> {
        let template = self.state.template_by_type_mut(template_type)
            .ok_or_else(|| EventError::not_found_by_name("Template", template_type.title()))?;
        if let Some(subject) = subject {
            template.subject = subject;
        }
        if let Some(body) = body {
            template.body = body;
        }
        template.updated_at = Utc::now();
        let id = template.id;

        self.commit(
            AuditEntry::new("update", "notification_template", Some(id), Some(json!({ "type": template_type }))),
            vec![ChangeEvent::new(ChangeTable::NotificationTemplates, ChangeKind::Update, Some(id), template_type.title())],
        )
    }

    pub fn render_template(&self, template_type: TemplateType, values: &HashMap<String, String>) -> EventResult<(String, String)> {
        let template = self.state.template_by_type(template_type)
            .ok_or_else(|| EventError::not_found_by_name("Template", template_type.title()))?;
        let mut values = values.clone();
        values.entry("event_name".to_string())
            .or_insert_with(|| self.state.settings().event_name.clone());
        Ok(template.render(&values))
    }

    // Notification center

    pub fn notifications(&self) -> &NotificationCenter {
        self.state.notifications()
    }

    pub fn mark_notification_read(&mut self, id: Uuid) -> EventResult<()> {
        if !self.state.notifications_mut().mark_read(id) {
            return Err(EventError::not_found("Notification", id));
        }
        self.save_state()
    }

    pub fn mark_all_notifications_read(&mut self) -> EventResult<()> {
        self.state.notifications_mut().mark_all_read();
        self.save_state()
    }

    pub fn clear_notifications(&mut self) -> EventResult<()> {
        self.state.notifications_mut().clear();
        self.save_state()
    }

    // Audit

    /// Newest first.
    pub fn recent_audit(&self, limit: usize) -> Vec<&AuditEntry> {
        self.state.audit_log().iter().rev().take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::registration::sample_input;
    use chrono::Duration;
    use tempfile::TempDir;

    // Helpers

    fn create_test_event_system(temp_dir: &TempDir) -> EventSystem {
        let state_file = temp_dir.path().join("test_state.json").to_str().unwrap().to_string();
        let config = AppConfig {
            state_file,
            registration_limit: 5,
            ..AppConfig::default()
        };
        EventSystem::new(config, None)
    }

    fn register(system: &mut EventSystem, name: &str) -> Uuid {
        let email = format!("{}@example.com", name.to_lowercase());
        system.register(sample_input(name, &email, Track::Buildathon)).unwrap()
    }

    fn seeker_input(name: &str, track: Track, offers: &str, needs: &str) -> SeekerInput {
        SeekerInput {
            user_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Engineer".to_string(),
            track,
            skills_offered: offers.to_string(),
            skills_needed: needs.to_string(),
        }
    }

    fn submit(system: &mut EventSystem, team: &str) -> Uuid {
        let team_id = system.create_team(team.to_string(), Track::Buildathon, None, None).unwrap();
        system.create_submission(team_id, SubmissionInput {
            project_name: format!("{} project", team),
            repo_link: Some("https://github.com/example/project".to_string()),
            ..Default::default()
        }).unwrap()
    }

    // Tests

    #[tokio::test]
    async fn test_state_management() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let reg_id = register(&mut system, "Ada");
        let team_id = system.create_team("Alpha".to_string(), Track::Buildathon, None, None).unwrap();

        let loaded_state = FileSystem::try_load_state(&system.config().state_file).unwrap().unwrap();
        let loaded = EventSystem::new(system.config().clone(), Some(loaded_state));
        assert!(loaded.state().registrations().contains_key(&reg_id));
        assert!(loaded.state().teams().contains_key(&team_id));
        assert_eq!(loaded.state().next_registration_number(), 2);
        assert_eq!(loaded.recent_audit(10).len(), 2);
    }

    #[tokio::test]
    async fn test_registration_rules() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);

        let first = register(&mut system, "Ada");
        let duplicate = system.register(sample_input("Ada L", "  ADA@example.com ", Track::Vibeathon));
        assert!(matches!(duplicate, Err(EventError::AlreadyRegistered)));

        let second = register(&mut system, "Grace");
        assert_eq!(system.state().get_registration(&first).unwrap().registration_number, 1);
        assert_eq!(system.state().get_registration(&second).unwrap().registration_number, 2);

        system.delete_registration(second).unwrap();
        let third = register(&mut system, "Linus");
        assert_eq!(system.state().get_registration(&third).unwrap().registration_number, 3);

        for name in ["B", "C", "D"] {
            register(&mut system, name);
        }
        let full = system.register(sample_input("E", "e@example.com", Track::Buildathon));
        assert!(matches!(full, Err(EventError::RegistrationFull { limit: 5 })));
        assert_eq!(system.registration_capacity().remaining, 0);
    }

    #[tokio::test]
    async fn test_registration_closed_and_archived() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);

        system.update_settings(SettingsUpdate {
            registration_deadline: Some(Utc::now() - Duration::hours(1)),
            ..Default::default()
        }).unwrap();
        let closed = system.register(sample_input("Ada", "ada@example.com", Track::Buildathon));
        assert!(matches!(closed, Err(EventError::RegistrationClosed)));

        system.update_settings(SettingsUpdate {
            registration_deadline: Some(Utc::now() + Duration::days(1)),
            ..Default::default()
        }).unwrap();
        register(&mut system, "Ada");

        system.archive_event().unwrap();
        let archived = system.register(sample_input("Grace", "grace@example.com", Track::Buildathon));
        assert!(matches!(archived, Err(EventError::EventArchived)));
    }

    #[tokio::test]
    async fn test_team_membership_rules() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let team_id = system.create_team("Alpha".to_string(), Track::Buildathon, None, Some(2)).unwrap();
        let other_team = system.create_team("Beta".to_string(), Track::Buildathon, None, None).unwrap();
        assert!(matches!(
            system.create_team("alpha".to_string(), Track::Vibeathon, None, None),
            Err(EventError::DuplicateTeamName(_))
        ));
        system.create_team("Équipe Ñandú".to_string(), Track::Buildathon, None, None).unwrap();
        assert!(matches!(
            system.create_team("ÉQUIPE ÑANDÚ".to_string(), Track::Buildathon, None, None),
            Err(EventError::DuplicateTeamName(_))
        ));

        let ada = register(&mut system, "Ada");
        let grace = register(&mut system, "Grace");
        let linus = register(&mut system, "Linus");

        let ada_member = system.add_member(team_id, ada, None).unwrap();
        assert_eq!(system.state().get_registration(&ada).unwrap().team_status, ParticipantTeamStatus::HasTeam);
        assert!(matches!(system.add_member(other_team, ada, None), Err(EventError::AlreadyOnTeam)));

        system.add_member(team_id, grace, Some("Designer".to_string())).unwrap();
        assert_eq!(system.state().get_team(&team_id).unwrap().status, TeamStatus::Complete);
        assert!(matches!(system.add_member(team_id, linus, None), Err(EventError::TeamFull { .. })));

        system.remove_member(ada_member).unwrap();
        assert_eq!(system.state().get_registration(&ada).unwrap().team_status, ParticipantTeamStatus::Looking);
        assert_eq!(system.state().get_team(&team_id).unwrap().status, TeamStatus::Forming);

        system.add_team_note(team_id, "Needs a backend dev".to_string(), Some("admin".to_string())).unwrap();
        let details = system.team_details(team_id).unwrap();
        assert_eq!(details.members.len(), 1);
        assert_eq!(details.members[0].name, "Grace");
        assert_eq!(details.members[0].role, "Designer");
        assert_eq!(details.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_team_cascades_and_frees_members() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let ada = register(&mut system, "Ada");
        let submission_id = submit(&mut system, "Alpha");
        let team_id = system.state().get_submission(&submission_id).unwrap().team_id;
        system.add_member(team_id, ada, None).unwrap();
        let judge = system.add_judge("Judy").unwrap();
        system.score_submission(judge, submission_id, Criteria::new(7, 7, 7, 7).unwrap(), None).unwrap();

        system.delete_team(team_id).unwrap();
        assert!(system.state().submissions().is_empty());
        assert!(system.state().scores().is_empty());
        assert!(system.state().team_members().is_empty());
        assert_eq!(system.state().get_registration(&ada).unwrap().team_status, ParticipantTeamStatus::Looking);
    }

    #[tokio::test]
    async fn test_judging_flow() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let submission_id = submit(&mut system, "Alpha");
        let team_id = system.state().get_submission(&submission_id).unwrap().team_id;
        assert_eq!(system.state().get_team(&team_id).unwrap().status, TeamStatus::Submitted);
        assert!(matches!(
            system.create_submission(team_id, SubmissionInput { project_name: "Again".to_string(), ..Default::default() }),
            Err(EventError::DuplicateSubmission)
        ));

        let judy = system.add_judge("Judy").unwrap();
        let first = system.assign_judge(judy, submission_id).unwrap();
        assert_eq!(system.assign_judge(judy, submission_id).unwrap(), first);
        assert_eq!(system.state().get_submission(&submission_id).unwrap().status, SubmissionStatus::InJudging);

        system.score_submission(judy, submission_id, Criteria::new(4, 4, 4, 4).unwrap(), None).unwrap();
        system.score_submission(judy, submission_id, Criteria::new(8, 6, 8, 6).unwrap(), Some("Great demo".to_string())).unwrap();
        assert_eq!(system.state().scores().len(), 1);
        assert!((system.average_score(submission_id) - 7.0).abs() < 1e-9);
        assert_eq!(system.state().get_submission(&submission_id).unwrap().status, SubmissionStatus::Scored);

        let award = system.add_award(submission_id, "Best UX").unwrap();
        assert!(matches!(system.add_award(submission_id, "best ux"), Err(EventError::DuplicateAward(_))));
        assert_eq!(system.state().get_submission(&submission_id).unwrap().status, SubmissionStatus::Winner);

        // Scoring a winner keeps it a winner.
        let max = system.add_judge("Max").unwrap();
        system.score_submission(max, submission_id, Criteria::new(9, 9, 9, 9).unwrap(), None).unwrap();
        assert_eq!(system.state().get_submission(&submission_id).unwrap().status, SubmissionStatus::Winner);

        system.remove_award(award).unwrap();
        assert_eq!(system.state().get_submission(&submission_id).unwrap().status, SubmissionStatus::Scored);

        let details = system.submission_details(submission_id).unwrap();
        assert_eq!(details.scores.len(), 2);
        assert_eq!(details.judges_assigned, vec!["Judy".to_string()]);

        let board = system.leaderboard(&[]);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].team_name, "Alpha");
    }

    #[tokio::test]
    async fn test_remove_award_from_unscored_submission() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let submission_id = submit(&mut system, "Alpha");
        let award = system.add_award(submission_id, "People's Choice").unwrap();
        system.remove_award(award).unwrap();
        assert_eq!(system.state().get_submission(&submission_id).unwrap().status, SubmissionStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_team_from_seekers() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let ada_reg = register(&mut system, "Ada");
        let ada = system.post_seeker(seeker_input("Ada", Track::Vibeathon, "rust", "design")).unwrap();
        let grace = system.post_seeker(seeker_input("Grace", Track::Vibeathon, "design", "rust")).unwrap();
        assert_eq!(system.suggest_matches(ada).unwrap().len(), 2);

        assert!(system.create_team_from_seekers(&[]).is_err());
        let team_id = system.create_team_from_seekers(&[ada, grace]).unwrap();

        let team = system.state().get_team(&team_id).unwrap();
        assert_eq!(team.name, "Team Vibeathon");
        assert_eq!(team.status, TeamStatus::Forming);
        assert_eq!(system.state().member_count(team_id), 1);
        assert_eq!(system.state().get_registration(&ada_reg).unwrap().team_status, ParticipantTeamStatus::HasTeam);
        assert!(!system.state().get_seeker(&ada).unwrap().looking_for_team);
        // Grace never registered, so she was not added and keeps looking.
        assert!(system.state().get_seeker(&grace).unwrap().looking_for_team);
        assert_eq!(system.seekers(&[]).len(), 1);

        let linus = system.post_seeker(seeker_input("Linus", Track::Vibeathon, "", "")).unwrap();
        let second = system.create_team_from_seekers(&[linus]).unwrap();
        assert_eq!(system.state().get_team(&second).unwrap().name, "Team Vibeathon 2");
        assert!(system.state().get_seeker(&linus).unwrap().looking_for_team);
    }

    #[tokio::test]
    async fn test_team_from_seekers_keeps_overflow_on_board() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let names = ["Ada", "Grace", "Linus", "Barbara", "Edsger"];
        let seekers: Vec<Uuid> = names.iter()
            .map(|name| {
                register(&mut system, name);
                system.post_seeker(seeker_input(name, Track::Buildathon, "", "")).unwrap()
            })
            .collect();

        let team_id = system.create_team_from_seekers(&seekers).unwrap();
        assert_eq!(system.state().member_count(team_id), 4);

        let still_looking: Vec<Uuid> = seekers.iter()
            .copied()
            .filter(|id| system.state().get_seeker(id).unwrap().looking_for_team)
            .collect();
        assert_eq!(still_looking, vec![seekers[4]]);
    }

    #[tokio::test]
    async fn test_change_feed_and_notifications() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let mut receiver = system.subscribe();

        let mut input = sample_input("Ada", "ada@example.com", Track::Buildathon);
        input.company = Some("Analytical".to_string());
        let id = system.register(input).unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.table, ChangeTable::Registrations);
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.record_id, Some(id));

        let center = system.notifications();
        assert_eq!(center.unread_count(), 1);
        assert_eq!(center.list()[0].message, "New registration: Ada from Analytical");

        system.mark_all_notifications_read().unwrap();
        assert_eq!(system.notifications().unread_count(), 0);
        system.clear_notifications().unwrap();
        assert!(system.notifications().list().is_empty());
    }

    #[tokio::test]
    async fn test_reset_keeps_settings_catalog_and_counter() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        system.update_settings(SettingsUpdate { event_name: Some("Spring Jam".to_string()), ..Default::default() }).unwrap();
        system.add_challenge(ChallengeInput { name: "Internal Tools".to_string(), ..Default::default() }).unwrap();
        system.add_judge("Judy").unwrap();
        register(&mut system, "Ada");
        submit(&mut system, "Alpha");

        let summary = system.reset_event().unwrap();
        assert_eq!(summary.registrations, 1);
        assert_eq!(summary.teams, 1);
        assert!(system.state().registrations().is_empty());
        assert!(system.state().teams().is_empty());
        assert_eq!(system.state().settings().event_name, "Spring Jam");
        assert_eq!(system.challenges().len(), 1);
        assert_eq!(system.state().judges().len(), 1);

        let next = register(&mut system, "Grace");
        assert_eq!(system.state().get_registration(&next).unwrap().registration_number, 2);
    }

    #[tokio::test]
    async fn test_settings_and_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);

        assert_eq!(system.advance_phase().unwrap(), EventPhase::Registration);
        for _ in 0..10 {
            system.advance_phase().unwrap();
        }
        assert_eq!(system.state().settings().current_phase, EventPhase::Complete);

        let bad = system.update_settings(SettingsUpdate { registration_limit: Some(0), ..Default::default() });
        assert!(bad.is_err());
        system.update_settings(SettingsUpdate { registration_limit: Some(40), ..Default::default() }).unwrap();
        assert_eq!(system.registration_limit(), 40);

        let a = system.add_challenge(ChallengeInput { name: "A".to_string(), ..Default::default() }).unwrap();
        let b = system.add_challenge(ChallengeInput { name: "B".to_string(), ..Default::default() }).unwrap();
        let order: Vec<Uuid> = system.challenges().iter().map(|c| c.id).collect();
        assert_eq!(order, vec![a, b]);
        system.delete_challenge(a).unwrap();
        assert_eq!(system.challenges().len(), 1);

        system.add_prize("Second", 500, None).unwrap();
        let grand = system.add_prize("Grand", 1000, None).unwrap();
        assert_eq!(system.prizes()[0].id, grand);
        system.update_prize_amount(grand, 100).unwrap();
        assert_eq!(system.prizes()[0].prize_type, "Second");

        let slack = system.upsert_integration(IntegrationType::Slack, Some("https://hooks.slack.com/x".to_string()), true).unwrap();
        let again = system.upsert_integration(IntegrationType::Slack, Some("https://hooks.slack.com/y".to_string()), true).unwrap();
        assert_eq!(slack, again);
        assert_eq!(system.state().integrations().len(), 1);
        assert_eq!(system.active_webhooks(), vec![(IntegrationType::Slack, "https://hooks.slack.com/y".to_string())]);

        system.update_template(TemplateType::SubmissionReminder, Some("Hurry, {{team_name}}".to_string()), None).unwrap();
        let values: HashMap<String, String> = [("team_name".to_string(), "Alpha".to_string())].into_iter().collect();
        let (subject, _) = system.render_template(TemplateType::SubmissionReminder, &values).unwrap();
        assert_eq!(subject, "Hurry, Alpha");
        assert_eq!(system.templates().len(), 4);
    }

    #[tokio::test]
    async fn test_exports_are_written_next_to_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let ada = register(&mut system, "Ada");
        register(&mut system, "Grace");

        let path = system.export_registrations(&RegistrationFilter::default(), ExportKind::Registrations).unwrap();
        assert!(path.starts_with(temp_dir.path().join("exports")));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        let path = system.export_selected(&[ada], ExportKind::Analytics).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("analytics-export-"));
        assert_eq!(content.lines().count(), 2);
        assert!(system.export_selected(&[Uuid::new_v4()], ExportKind::Analytics).is_err());
    }

    #[tokio::test]
    async fn test_event_report_is_saved() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let ada = register(&mut system, "Ada");
        let team_id = system.create_team("Alpha".to_string(), Track::Buildathon, None, None).unwrap();
        system.add_member(team_id, ada, None).unwrap();

        let report = system.event_report();
        assert!(report.contains("### Alpha"));
        assert!(report.contains("    *   Ada (Engineer)"));

        let path = system.save_event_report().unwrap();
        assert!(path.starts_with(temp_dir.path().join("reports").join("AI_Hackathon")));
        let saved = std::fs::read_to_string(path).unwrap();
        assert!(saved.starts_with("# AI Hackathon - Event Summary"));
        assert!(saved.contains("| Registered | 1 |"));
    }

    #[tokio::test]
    async fn test_share_links_use_public_url() {
        let temp_dir = TempDir::new().unwrap();
        let mut system = create_test_event_system(&temp_dir);
        let ada = register(&mut system, "Ada");
        let links = system.share_links(ada).unwrap();
        assert!(links.share_url.starts_with(&system.config().public_url));
        assert!(links.share_text.contains(&system.state().settings().event_name));
    }
}
