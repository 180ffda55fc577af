use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::{EventError, EventResult};
use super::common::{names_equal, NameMatches};
use super::registration::Track;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    Forming,
    Complete,
    Building,
    Submitted,
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TeamStatus::Forming => "forming",
            TeamStatus::Complete => "complete",
            TeamStatus::Building => "building",
            TeamStatus::Submitted => "submitted",
        };
        f.write_str(label)
    }
}

impl FromStr for TeamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forming" => Ok(TeamStatus::Forming),
            "complete" => Ok(TeamStatus::Complete),
            "building" => Ok(TeamStatus::Building),
            "submitted" => Ok(TeamStatus::Submitted),
            other => Err(format!("Unknown team status: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub track: Track,
    pub challenge: Option<String>,
    pub max_members: u32,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: String, track: Track, challenge: Option<String>, max_members: u32) -> EventResult<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EventError::invalid("Team name cannot be empty"));
        }
        if max_members == 0 {
            return Err(EventError::invalid("A team needs room for at least one member"));
        }

        let now = Utc::now();
        Ok(Team {
            id: Uuid::new_v4(),
            name,
            track,
            challenge: challenge.filter(|c| !c.trim().is_empty()),
            max_members,
            status: TeamStatus::Forming,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: TeamStatus) {
        self.status = status;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl NameMatches for Team {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.name, name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub registration_id: Uuid,
    pub role: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn new(team_id: Uuid, registration_id: Uuid, role: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            registration_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamNote {
    pub id: Uuid,
    pub team_id: Uuid,
    pub note: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TeamNote {
    pub fn new(team_id: Uuid, note: String, created_by: Option<String>) -> EventResult<Self> {
        if note.trim().is_empty() {
            return Err(EventError::invalid("Note cannot be empty"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            note: note.trim().to_string(),
            created_by,
            created_at: Utc::now(),
        })
    }
}
