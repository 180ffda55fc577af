use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::error::{EventError, EventResult};
use super::common::{names_equal, split_tags, NameMatches};
use super::registration::{normalize_email, Track};

/// Form input for the team matching board. Skills arrive as comma separated text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeekerInput {
    pub user_name: String,
    pub email: String,
    pub role: String,
    pub track: Track,
    #[serde(default)]
    pub skills_offered: String,
    #[serde(default)]
    pub skills_needed: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamSeeker {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub role: String,
    pub track: Track,
    pub skills_offered: Vec<String>,
    pub skills_needed: Vec<String>,
    pub looking_for_team: bool,
    pub created_at: DateTime<Utc>,
}

impl TeamSeeker {
    pub fn new(input: SeekerInput) -> EventResult<Self> {
        if input.user_name.trim().is_empty() {
            return Err(EventError::invalid("Name is required"));
        }
        if !input.email.contains('@') {
            return Err(EventError::invalid(format!("Invalid email address: {}", input.email)));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_name: input.user_name.trim().to_string(),
            email: input.email.trim().to_string(),
            role: input.role.trim().to_string(),
            track: input.track,
            skills_offered: split_tags(&input.skills_offered),
            skills_needed: split_tags(&input.skills_needed),
            looking_for_team: true,
            created_at: Utc::now(),
        })
    }

    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }

    pub fn offers(&self, skill: &str) -> bool {
        self.skills_offered.iter().any(|s| names_equal(s, skill))
    }
}

impl NameMatches for TeamSeeker {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.user_name, name) || self.has_email(name)
    }
}
