// src/core/state.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::changes::NotificationCenter;
use crate::core::models::{
    names_equal, AuditEntry, Award, Challenge, EventSettings, Integration, IntegrationType, Judge,
    JudgeAssignment, NotificationTemplate, Prize, Registration, Score, Submission, Team,
    TeamMember, TeamNote, TeamSeeker, TemplateType,
};

/// Every table of the event, persisted as one document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EventState {
    registrations: HashMap<Uuid, Registration>,
    teams: HashMap<Uuid, Team>,
    team_members: HashMap<Uuid, TeamMember>,
    team_notes: HashMap<Uuid, TeamNote>,
    team_seekers: HashMap<Uuid, TeamSeeker>,
    submissions: HashMap<Uuid, Submission>,
    judges: HashMap<Uuid, Judge>,
    judge_assignments: HashMap<Uuid, JudgeAssignment>,
    scores: HashMap<Uuid, Score>,
    awards: HashMap<Uuid, Award>,
    challenges: HashMap<Uuid, Challenge>,
    prizes: HashMap<Uuid, Prize>,
    integrations: HashMap<Uuid, Integration>,
    notification_templates: HashMap<Uuid, NotificationTemplate>,
    settings: EventSettings,
    next_registration_number: u32,
    audit_log: Vec<AuditEntry>,
    notifications: NotificationCenter,
    timestamp: DateTime<Utc>,
}

impl Default for EventState {
    fn default() -> Self {
        Self::new()
    }
}

impl EventState {
    pub fn new() -> Self {
        let notification_templates = NotificationTemplate::defaults()
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Self {
            registrations: HashMap::new(),
            teams: HashMap::new(),
            team_members: HashMap::new(),
            team_notes: HashMap::new(),
            team_seekers: HashMap::new(),
            submissions: HashMap::new(),
            judges: HashMap::new(),
            judge_assignments: HashMap::new(),
            scores: HashMap::new(),
            awards: HashMap::new(),
            challenges: HashMap::new(),
            prizes: HashMap::new(),
            integrations: HashMap::new(),
            notification_templates,
            settings: EventSettings::default(),
            next_registration_number: 1,
            audit_log: Vec::new(),
            notifications: NotificationCenter::default(),
            timestamp: Utc::now(),
        }
    }

    // Getters
    pub fn registrations(&self) -> &HashMap<Uuid, Registration> {
        &self.registrations
    }

    pub fn teams(&self) -> &HashMap<Uuid, Team> {
        &self.teams
    }

    pub fn team_members(&self) -> &HashMap<Uuid, TeamMember> {
        &self.team_members
    }

    pub fn team_notes(&self) -> &HashMap<Uuid, TeamNote> {
        &self.team_notes
    }

    pub fn team_seekers(&self) -> &HashMap<Uuid, TeamSeeker> {
        &self.team_seekers
    }

    pub fn submissions(&self) -> &HashMap<Uuid, Submission> {
        &self.submissions
    }

    pub fn judges(&self) -> &HashMap<Uuid, Judge> {
        &self.judges
    }

    pub fn judge_assignments(&self) -> &HashMap<Uuid, JudgeAssignment> {
        &self.judge_assignments
    }

    pub fn scores(&self) -> &HashMap<Uuid, Score> {
        &self.scores
    }

    pub fn awards(&self) -> &HashMap<Uuid, Award> {
        &self.awards
    }

    pub fn challenges(&self) -> &HashMap<Uuid, Challenge> {
        &self.challenges
    }

    pub fn prizes(&self) -> &HashMap<Uuid, Prize> {
        &self.prizes
    }

    pub fn integrations(&self) -> &HashMap<Uuid, Integration> {
        &self.integrations
    }

    pub fn notification_templates(&self) -> &HashMap<Uuid, NotificationTemplate> {
        &self.notification_templates
    }

    pub fn settings(&self) -> &EventSettings {
        &self.settings
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit_log
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn next_registration_number(&self) -> u32 {
        self.next_registration_number
    }

    // Modifiers
    pub fn settings_mut(&mut self) -> &mut EventSettings {
        &mut self.settings
    }

    pub fn set_settings(&mut self, settings: EventSettings) {
        self.settings = settings;
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = Utc::now();
    }

    /// Hands out the next registration number. Numbers are never reused.
    pub fn take_registration_number(&mut self) -> u32 {
        let number = self.next_registration_number.max(1);
        self.next_registration_number = number + 1;
        number
    }

    pub fn record_audit(&mut self, entry: AuditEntry) {
        self.audit_log.push(entry);
    }

    pub fn add_registration(&mut self, registration: Registration) -> Uuid {
        let id = registration.id;
        self.registrations.insert(id, registration);
        id
    }

    pub fn get_registration(&self, id: &Uuid) -> Option<&Registration> {
        self.registrations.get(id)
    }

    pub fn get_registration_mut(&mut self, id: &Uuid) -> Option<&mut Registration> {
        self.registrations.get_mut(id)
    }

    pub fn find_registration_by_email(&self, email: &str) -> Option<&Registration> {
        self.registrations.values().find(|r| r.has_email(email))
    }

    /// Removes a registration along with its team memberships.
    pub fn remove_registration(&mut self, id: Uuid) -> Option<(Registration, Vec<TeamMember>)> {
        let registration = self.registrations.remove(&id)?;
        let memberships = self.drain_members(|m| m.registration_id == id);
        Some((registration, memberships))
    }

    pub fn add_team(&mut self, team: Team) -> Uuid {
        let id = team.id;
        self.teams.insert(id, team);
        id
    }

    pub fn get_team(&self, id: &Uuid) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn get_team_mut(&mut self, id: &Uuid) -> Option<&mut Team> {
        self.teams.get_mut(id)
    }

    pub fn team_name_taken(&self, name: &str) -> bool {
        self.teams.values().any(|t| names_equal(&t.name, name))
    }

    pub fn project_name_taken(&self, project_name: &str) -> bool {
        self.submissions.values().any(|s| names_equal(&s.project_name, project_name))
    }

    /// Removes a team with its members, notes, and submission (plus that
    /// submission's scores, awards, and assignments).
    pub fn remove_team_cascade(&mut self, id: Uuid) -> Option<Team> {
        let team = self.teams.remove(&id)?;
        self.drain_members(|m| m.team_id == id);
        self.team_notes.retain(|_, n| n.team_id != id);
        let submission_ids: Vec<Uuid> = self.submissions.values()
            .filter(|s| s.team_id == id)
            .map(|s| s.id)
            .collect();
        for submission_id in submission_ids {
            self.remove_submission_cascade(submission_id);
        }
        Some(team)
    }

    pub fn add_member(&mut self, member: TeamMember) -> Uuid {
        let id = member.id;
        self.team_members.insert(id, member);
        id
    }

    pub fn remove_member(&mut self, id: Uuid) -> Option<TeamMember> {
        self.team_members.remove(&id)
    }

    pub fn members_of(&self, team_id: Uuid) -> Vec<&TeamMember> {
        let mut members: Vec<&TeamMember> = self.team_members.values()
            .filter(|m| m.team_id == team_id)
            .collect();
        members.sort_by_key(|m| m.joined_at);
        members
    }

    pub fn member_count(&self, team_id: Uuid) -> usize {
        self.team_members.values().filter(|m| m.team_id == team_id).count()
    }

    pub fn membership_of(&self, registration_id: Uuid) -> Option<&TeamMember> {
        self.team_members.values().find(|m| m.registration_id == registration_id)
    }

    fn drain_members<F: Fn(&TeamMember) -> bool>(&mut self, predicate: F) -> Vec<TeamMember> {
        let ids: Vec<Uuid> = self.team_members.values()
            .filter(|m| predicate(m))
            .map(|m| m.id)
            .collect();
        ids.into_iter().filter_map(|id| self.team_members.remove(&id)).collect()
    }

    pub fn add_note(&mut self, note: TeamNote) -> Uuid {
        let id = note.id;
        self.team_notes.insert(id, note);
        id
    }

    pub fn notes_of(&self, team_id: Uuid) -> Vec<&TeamNote> {
        let mut notes: Vec<&TeamNote> = self.team_notes.values()
            .filter(|n| n.team_id == team_id)
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    pub fn add_seeker(&mut self, seeker: TeamSeeker) -> Uuid {
        let id = seeker.id;
        self.team_seekers.insert(id, seeker);
        id
    }

    pub fn get_seeker(&self, id: &Uuid) -> Option<&TeamSeeker> {
        self.team_seekers.get(id)
    }

    pub fn get_seeker_mut(&mut self, id: &Uuid) -> Option<&mut TeamSeeker> {
        self.team_seekers.get_mut(id)
    }

    pub fn remove_seeker(&mut self, id: Uuid) -> Option<TeamSeeker> {
        self.team_seekers.remove(&id)
    }

    pub fn add_submission(&mut self, submission: Submission) -> Uuid {
        let id = submission.id;
        self.submissions.insert(id, submission);
        id
    }

    pub fn get_submission(&self, id: &Uuid) -> Option<&Submission> {
        self.submissions.get(id)
    }

    pub fn get_submission_mut(&mut self, id: &Uuid) -> Option<&mut Submission> {
        self.submissions.get_mut(id)
    }

    pub fn submission_for_team(&self, team_id: Uuid) -> Option<&Submission> {
        self.submissions.values().find(|s| s.team_id == team_id)
    }

    pub fn remove_submission_cascade(&mut self, id: Uuid) -> Option<Submission> {
        let submission = self.submissions.remove(&id)?;
        self.scores.retain(|_, s| s.submission_id != id);
        self.awards.retain(|_, a| a.submission_id != id);
        self.judge_assignments.retain(|_, a| a.submission_id != id);
        Some(submission)
    }

    pub fn add_judge(&mut self, judge: Judge) -> Uuid {
        let id = judge.id;
        self.judges.insert(id, judge);
        id
    }

    pub fn get_judge(&self, id: &Uuid) -> Option<&Judge> {
        self.judges.get(id)
    }

    pub fn add_assignment(&mut self, assignment: JudgeAssignment) -> Uuid {
        let id = assignment.id;
        self.judge_assignments.insert(id, assignment);
        id
    }

    pub fn find_assignment(&self, judge_id: Uuid, submission_id: Uuid) -> Option<&JudgeAssignment> {
        self.judge_assignments.values()
            .find(|a| a.judge_id == judge_id && a.submission_id == submission_id)
    }

    /// Inserts the score, replacing an earlier one by the same judge.
    /// Returns the replaced score.
    pub fn upsert_score(&mut self, score: Score) -> Option<Score> {
        let existing = self.scores.values()
            .find(|s| s.judge_id == score.judge_id && s.submission_id == score.submission_id)
            .map(|s| s.id);
        let replaced = existing.and_then(|id| self.scores.remove(&id));
        self.scores.insert(score.id, score);
        replaced
    }

    pub fn scores_for(&self, submission_id: Uuid) -> Vec<&Score> {
        self.scores.values().filter(|s| s.submission_id == submission_id).collect()
    }

    pub fn add_award(&mut self, award: Award) -> Uuid {
        let id = award.id;
        self.awards.insert(id, award);
        id
    }

    pub fn remove_award(&mut self, id: Uuid) -> Option<Award> {
        self.awards.remove(&id)
    }

    pub fn awards_for(&self, submission_id: Uuid) -> Vec<&Award> {
        let mut awards: Vec<&Award> = self.awards.values()
            .filter(|a| a.submission_id == submission_id)
            .collect();
        awards.sort_by_key(|a| a.awarded_at);
        awards
    }

    pub fn add_challenge(&mut self, challenge: Challenge) -> Uuid {
        let id = challenge.id;
        self.challenges.insert(id, challenge);
        id
    }

    pub fn get_challenge_mut(&mut self, id: &Uuid) -> Option<&mut Challenge> {
        self.challenges.get_mut(id)
    }

    pub fn remove_challenge(&mut self, id: Uuid) -> Option<Challenge> {
        self.challenges.remove(&id)
    }

    pub fn add_prize(&mut self, prize: Prize) -> Uuid {
        let id = prize.id;
        self.prizes.insert(id, prize);
        id
    }

    pub fn get_prize_mut(&mut self, id: &Uuid) -> Option<&mut Prize> {
        self.prizes.get_mut(id)
    }

    pub fn remove_prize(&mut self, id: Uuid) -> Option<Prize> {
        self.prizes.remove(&id)
    }

    pub fn integration_by_type(&self, integration_type: IntegrationType) -> Option<&Integration> {
        self.integrations.values().find(|i| i.integration_type == integration_type)
    }

    pub fn integration_by_type_mut(&mut self, integration_type: IntegrationType) -> Option<&mut Integration> {
        self.integrations.values_mut().find(|i| i.integration_type == integration_type)
    }

    pub fn add_integration(&mut self, integration: Integration) -> Uuid {
        let id = integration.id;
        self.integrations.insert(id, integration);
        id
    }

    pub fn template_by_type(&self, template_type: TemplateType) -> Option<&NotificationTemplate> {
        self.notification_templates.values().find(|t| t.template_type == template_type)
    }

    pub fn template_by_type_mut(&mut self, template_type: TemplateType) -> Option<&mut NotificationTemplate> {
        self.notification_templates.values_mut().find(|t| t.template_type == template_type)
    }

    /// Clears every participant table. Settings, catalog, judges, and the
    /// registration counter are kept.
    pub fn clear_participant_data(&mut self) {
        self.scores.clear();
        self.awards.clear();
        self.judge_assignments.clear();
        self.submissions.clear();
        self.team_members.clear();
        self.team_notes.clear();
        self.teams.clear();
        self.team_seekers.clear();
        self.registrations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::registration::sample_input;
    use crate::core::models::{Criteria, SubmissionInput, Track};

    fn registration(state: &mut EventState, name: &str, email: &str) -> Uuid {
        let number = state.take_registration_number();
        let reg = Registration::new(sample_input(name, email, Track::Buildathon), number).unwrap();
        state.add_registration(reg)
    }

    #[test]
    fn test_new_state_seeds_templates() {
        let state = EventState::new();
        assert_eq!(state.notification_templates().len(), 4);
        assert!(state.template_by_type(TemplateType::WinnerAnnouncement).is_some());
        assert_eq!(state.next_registration_number(), 1);
    }

    #[test]
    fn test_registration_numbers_survive_reset() {
        let mut state = EventState::new();
        registration(&mut state, "Ada", "ada@example.com");
        registration(&mut state, "Grace", "grace@example.com");
        state.clear_participant_data();
        assert!(state.registrations().is_empty());
        assert_eq!(state.take_registration_number(), 3);
    }

    #[test]
    fn test_team_cascade() {
        let mut state = EventState::new();
        let reg_id = registration(&mut state, "Ada", "ada@example.com");
        let team = Team::new("Alpha".to_string(), Track::Buildathon, None, 4).unwrap();
        let team_id = state.add_team(team);
        state.add_member(TeamMember::new(team_id, reg_id, None));
        state.add_note(TeamNote::new(team_id, "kickoff".to_string(), None).unwrap());

        let submission = Submission::new(team_id, SubmissionInput {
            project_name: "Pipeline".to_string(),
            ..Default::default()
        }).unwrap();
        let submission_id = state.add_submission(submission);
        let judge_id = state.add_judge(Judge::new("Judy").unwrap());
        state.upsert_score(Score::new(submission_id, judge_id, Criteria::new(5, 5, 5, 5).unwrap(), None).unwrap());
        state.add_award(Award::new(submission_id, "Best UX").unwrap());
        state.add_assignment(JudgeAssignment::new(judge_id, submission_id));

        assert!(state.remove_team_cascade(team_id).is_some());
        assert!(state.team_members().is_empty());
        assert!(state.team_notes().is_empty());
        assert!(state.submissions().is_empty());
        assert!(state.scores().is_empty());
        assert!(state.awards().is_empty());
        assert!(state.judge_assignments().is_empty());
        assert_eq!(state.judges().len(), 1);
        assert_eq!(state.registrations().len(), 1);
    }

    #[test]
    fn test_upsert_score_replaces_same_judge() {
        let mut state = EventState::new();
        let submission_id = Uuid::new_v4();
        let judge_id = Uuid::new_v4();
        let first = Score::new(submission_id, judge_id, Criteria::new(3, 3, 3, 3).unwrap(), None).unwrap();
        let second = Score::new(submission_id, judge_id, Criteria::new(9, 9, 9, 9).unwrap(), None).unwrap();

        assert!(state.upsert_score(first).is_none());
        assert!(state.upsert_score(second).is_some());
        assert_eq!(state.scores().len(), 1);
        assert_eq!(state.scores_for(submission_id)[0].criteria.innovation, 9);
    }

    #[test]
    fn test_remove_registration_drops_memberships() {
        let mut state = EventState::new();
        let reg_id = registration(&mut state, "Ada", "ada@example.com");
        let team_id = state.add_team(Team::new("Alpha".to_string(), Track::Buildathon, None, 4).unwrap());
        state.add_member(TeamMember::new(team_id, reg_id, None));

        let (_, memberships) = state.remove_registration(reg_id).unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(state.member_count(team_id), 0);
    }
}
