use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::{EventError, EventResult};
use super::common::{names_equal, NameMatches};
use super::registration::Track;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChallengeInput {
    pub name: String,
    pub description: Option<String>,
    pub sponsor: Option<String>,
    pub prize_amount: Option<u64>,
    pub recommended_track: Option<Track>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sponsor: Option<String>,
    pub prize_amount: Option<u64>,
    pub recommended_track: Option<Track>,
    pub display_order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    pub fn new(input: ChallengeInput, display_order: u32) -> EventResult<Self> {
        if input.name.trim().is_empty() {
            return Err(EventError::invalid("Challenge name cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            sponsor: input.sponsor,
            prize_amount: input.prize_amount,
            recommended_track: input.recommended_track,
            display_order,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields, keeping id and display order.
    pub fn update(&mut self, input: ChallengeInput) -> EventResult<()> {
        if input.name.trim().is_empty() {
            return Err(EventError::invalid("Challenge name cannot be empty"));
        }
        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.sponsor = input.sponsor;
        self.prize_amount = input.prize_amount;
        self.recommended_track = input.recommended_track;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl NameMatches for Challenge {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.name, name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prize {
    pub id: Uuid,
    pub prize_type: String,
    pub amount: u64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prize {
    pub fn new(prize_type: &str, amount: u64, description: Option<String>) -> EventResult<Self> {
        if prize_type.trim().is_empty() {
            return Err(EventError::invalid("Prize type cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            prize_type: prize_type.trim().to_string(),
            amount,
            description,
            created_at: now,
            updated_at: now,
        })
    }
}

impl NameMatches for Prize {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.prize_type, name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationType {
    Slack,
    Discord,
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationType::Slack => f.write_str("slack"),
            IntegrationType::Discord => f.write_str("discord"),
        }
    }
}

impl FromStr for IntegrationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slack" => Ok(IntegrationType::Slack),
            "discord" => Ok(IntegrationType::Discord),
            other => Err(format!("Unknown integration type: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub integration_type: IntegrationType,
    pub webhook_url: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Integration {
    pub fn new(integration_type: IntegrationType, webhook_url: Option<String>, enabled: bool) -> EventResult<Self> {
        validate_webhook(&webhook_url, enabled)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            integration_type,
            webhook_url,
            enabled,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, webhook_url: Option<String>, enabled: bool) -> EventResult<()> {
        validate_webhook(&webhook_url, enabled)?;
        self.webhook_url = webhook_url;
        self.enabled = enabled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Webhook URL when the integration is switched on.
    pub fn active_webhook(&self) -> Option<&str> {
        if self.enabled { self.webhook_url.as_deref() } else { None }
    }
}

fn validate_webhook(webhook_url: &Option<String>, enabled: bool) -> EventResult<()> {
    match webhook_url.as_deref() {
        Some(url) if !url.starts_with("https://") && !url.starts_with("http://") => {
            Err(EventError::invalid(format!("Webhook URL must be http(s): {}", url)))
        }
        None if enabled => Err(EventError::invalid("An enabled integration needs a webhook URL")),
        _ => Ok(()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    RegistrationConfirmation,
    TeamFormationReminder,
    SubmissionReminder,
    WinnerAnnouncement,
}

impl TemplateType {
    pub const ALL: [TemplateType; 4] = [
        TemplateType::RegistrationConfirmation,
        TemplateType::TeamFormationReminder,
        TemplateType::SubmissionReminder,
        TemplateType::WinnerAnnouncement,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            TemplateType::RegistrationConfirmation => "Registration Confirmation",
            TemplateType::TeamFormationReminder => "Team Formation Reminder",
            TemplateType::SubmissionReminder => "Submission Reminder",
            TemplateType::WinnerAnnouncement => "Winner Announcement",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TemplateType::RegistrationConfirmation => "Sent when someone registers for the event",
            TemplateType::TeamFormationReminder => "Sent to remind participants to form teams",
            TemplateType::SubmissionReminder => "Sent to remind teams to submit their projects",
            TemplateType::WinnerAnnouncement => "Sent to announce winners",
        }
    }

    fn default_content(&self) -> (&'static str, &'static str) {
        match self {
            TemplateType::RegistrationConfirmation => (
                "You're registered for {{event_name}}!",
                "Hi {{name}},\n\nThanks for registering for the {{track}} track. Your registration number is #{{registration_number}}.",
            ),
            TemplateType::TeamFormationReminder => (
                "Find your team for {{event_name}}",
                "Hi {{name}},\n\nTeams are forming now. Post on the matching board to find teammates.",
            ),
            TemplateType::SubmissionReminder => (
                "Submissions for {{event_name}} close soon",
                "Hi {{team_name}},\n\nDon't forget to submit your project before {{deadline}}.",
            ),
            TemplateType::WinnerAnnouncement => (
                "Congratulations from {{event_name}}!",
                "Congratulations {{team_name}}! {{project_name}} won {{award}}.",
            ),
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for TemplateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.iter()
            .find(|t| t.title().to_lowercase().replace(' ', "_") == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown template type: {}", s.trim()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub id: Uuid,
    pub template_type: TemplateType,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTemplate {
    pub fn seeded(template_type: TemplateType) -> Self {
        let (subject, body) = template_type.default_content();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            template_type,
            subject: subject.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn defaults() -> Vec<Self> {
        TemplateType::ALL.iter().map(|t| Self::seeded(*t)).collect()
    }

    /// Fills `{{key}}` placeholders. Unknown keys are left as written.
    pub fn render(&self, values: &HashMap<String, String>) -> (String, String) {
        (fill_placeholders(&self.subject, values), fill_placeholders(&self.body, values))
    }
}

fn fill_placeholders(text: &str, values: &HashMap<String, String>) -> String {
    values.iter().fold(text.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{}}}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_render() {
        let template = NotificationTemplate::seeded(TemplateType::RegistrationConfirmation);
        let values: HashMap<String, String> = [
            ("event_name", "Spring Jam"),
            ("name", "Ada"),
            ("track", "Buildathon"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let (subject, body) = template.render(&values);
        assert_eq!(subject, "You're registered for Spring Jam!");
        assert!(body.starts_with("Hi Ada,"));
        assert!(body.contains("Buildathon track"));
        assert!(body.contains("{{registration_number}}"));
    }

    #[test]
    fn test_defaults_cover_every_type() {
        let defaults = NotificationTemplate::defaults();
        assert_eq!(defaults.len(), 4);
        for t in TemplateType::ALL {
            assert!(defaults.iter().any(|d| d.template_type == t));
        }
    }

    #[test]
    fn test_template_type_parsing() {
        assert_eq!("winner_announcement".parse::<TemplateType>().unwrap(), TemplateType::WinnerAnnouncement);
        assert_eq!("Submission Reminder".parse::<TemplateType>().unwrap(), TemplateType::SubmissionReminder);
    }

    #[test]
    fn test_enabled_integration_needs_url() {
        assert!(Integration::new(IntegrationType::Slack, None, true).is_err());
        assert!(Integration::new(IntegrationType::Slack, Some("ftp://x".to_string()), false).is_err());
        let integration = Integration::new(IntegrationType::Discord, Some("https://discord.com/api/webhooks/1".to_string()), false).unwrap();
        assert!(integration.active_webhook().is_none());
    }
}
