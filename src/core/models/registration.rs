use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::{EventError, EventResult};
use super::common::{names_equal, NameMatches};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Promptathon,
    Buildathon,
    Vibeathon,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Promptathon, Track::Buildathon, Track::Vibeathon];

    pub fn label(&self) -> &'static str {
        match self {
            Track::Promptathon => "Promptathon",
            Track::Buildathon => "Buildathon",
            Track::Vibeathon => "Vibeathon",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Track::Promptathon => "For non-technical builders - describe and watch it materialize",
            Track::Buildathon => "For PMs & designers - prototype real products",
            Track::Vibeathon => "For multidisciplinary teams - build, integrate, ship",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Track {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "promptathon" => Ok(Track::Promptathon),
            "buildathon" => Ok(Track::Buildathon),
            "vibeathon" => Ok(Track::Vibeathon),
            other => Err(format!("Unknown track: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParticipantTeamStatus {
    Solo,
    Looking,
    HasTeam,
}

impl ParticipantTeamStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ParticipantTeamStatus::Solo => "Solo",
            ParticipantTeamStatus::Looking => "Looking",
            ParticipantTeamStatus::HasTeam => "Has Team",
        }
    }
}

impl fmt::Display for ParticipantTeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParticipantTeamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "solo" => Ok(ParticipantTeamStatus::Solo),
            "looking" => Ok(ParticipantTeamStatus::Looking),
            "has-team" => Ok(ParticipantTeamStatus::HasTeam),
            other => Err(format!("Unknown team status: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationInput {
    pub full_name: String,
    pub email: String,
    pub company: Option<String>,
    pub role: String,
    pub track: Track,
    #[serde(default)]
    pub challenges: Vec<String>,
    pub team_status: ParticipantTeamStatus,
    pub experience_level: String,
    pub how_heard: String,
    pub agreed_to_code_of_conduct: bool,
}

impl RegistrationInput {
    pub fn validate(&self) -> EventResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(EventError::invalid("Full name is required"));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {},
            _ => return Err(EventError::invalid(format!("Invalid email address: {}", email))),
        }
        if self.role.trim().is_empty() {
            return Err(EventError::invalid("Role is required"));
        }
        if !self.agreed_to_code_of_conduct {
            return Err(EventError::invalid("The code of conduct must be accepted"));
        }
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub registration_number: u32,
    pub full_name: String,
    pub email: String,
    pub company: Option<String>,
    pub role: String,
    pub track: Track,
    pub challenges: Vec<String>,
    pub team_status: ParticipantTeamStatus,
    pub experience_level: String,
    pub how_heard: String,
    pub agreed_to_code_of_conduct: bool,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(input: RegistrationInput, registration_number: u32) -> EventResult<Self> {
        input.validate()?;

        let company = input.company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id: Uuid::new_v4(),
            registration_number,
            full_name: input.full_name.trim().to_string(),
            email: input.email.trim().to_string(),
            company,
            role: input.role.trim().to_string(),
            track: input.track,
            challenges: input.challenges,
            team_status: input.team_status,
            experience_level: input.experience_level,
            how_heard: input.how_heard,
            agreed_to_code_of_conduct: input.agreed_to_code_of_conduct,
            created_at: Utc::now(),
        })
    }

    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }

    pub fn display_name(&self) -> String {
        match &self.company {
            Some(company) => format!("{} from {}", self.full_name, company),
            None => self.full_name.clone(),
        }
    }
}

impl NameMatches for Registration {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.full_name, name) || self.has_email(name)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateRegistrationDetails {
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub track: Option<Track>,
    pub challenges: Option<Vec<String>>,
    pub team_status: Option<ParticipantTeamStatus>,
    pub experience_level: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_input(name: &str, email: &str, track: Track) -> RegistrationInput {
    RegistrationInput {
        full_name: name.to_string(),
        email: email.to_string(),
        company: None,
        role: "Engineer".to_string(),
        track,
        challenges: vec!["Internal Tools".to_string()],
        team_status: ParticipantTeamStatus::Looking,
        experience_level: "intermediate".to_string(),
        how_heard: "Friend".to_string(),
        agreed_to_code_of_conduct: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_parsing_and_labels() {
        assert_eq!("Buildathon".parse::<Track>().unwrap(), Track::Buildathon);
        assert_eq!(" vibeathon ".parse::<Track>().unwrap(), Track::Vibeathon);
        assert!("hackathon".parse::<Track>().is_err());
        assert_eq!(Track::Promptathon.to_string(), "Promptathon");
        assert_eq!(serde_json::to_string(&Track::Promptathon).unwrap(), "\"promptathon\"");
    }

    #[test]
    fn test_team_status_wire_format() {
        assert_eq!(serde_json::to_string(&ParticipantTeamStatus::HasTeam).unwrap(), "\"has-team\"");
        assert_eq!("has team".parse::<ParticipantTeamStatus>().unwrap(), ParticipantTeamStatus::HasTeam);
        assert_eq!("has_team".parse::<ParticipantTeamStatus>().unwrap(), ParticipantTeamStatus::HasTeam);
    }

    #[test]
    fn test_registration_requires_code_of_conduct() {
        let mut input = sample_input("Ada", "ada@example.com", Track::Buildathon);
        input.agreed_to_code_of_conduct = false;
        assert!(matches!(Registration::new(input, 1), Err(EventError::Validation(_))));
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        for email in ["", "ada", "@example.com", "ada@"] {
            let input = sample_input("Ada", email, Track::Buildathon);
            assert!(Registration::new(input, 1).is_err(), "accepted {:?}", email);
        }
    }

    #[test]
    fn test_registration_trims_and_drops_empty_company() {
        let mut input = sample_input("  Ada  ", " ada@example.com ", Track::Buildathon);
        input.company = Some("   ".to_string());
        let reg = Registration::new(input, 7).unwrap();
        assert_eq!(reg.full_name, "Ada");
        assert_eq!(reg.email, "ada@example.com");
        assert!(reg.company.is_none());
        assert_eq!(reg.registration_number, 7);
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let reg = Registration::new(sample_input("Ada", "Ada@Example.com", Track::Buildathon), 1).unwrap();
        assert!(reg.has_email("ada@example.COM "));
        assert!(reg.name_matches("ada"));
    }
}
