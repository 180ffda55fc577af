// src/core/error.rs

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("More than one {entity} matches {name}; use the email or a unique name")]
    AmbiguousName { entity: &'static str, name: String },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("This email is already registered for the hackathon")]
    AlreadyRegistered,
    #[error("Registration is full ({limit} spots)")]
    RegistrationFull { limit: u32 },
    #[error("Registration is closed")]
    RegistrationClosed,
    #[error("Event is archived")]
    EventArchived,
    #[error("Team {team} is full ({max_members} members)")]
    TeamFull { team: String, max_members: u32 },
    #[error("Registration is already on a team")]
    AlreadyOnTeam,
    #[error("A team named {0} already exists")]
    DuplicateTeamName(String),
    #[error("A project named {0} was already submitted")]
    DuplicateProjectName(String),
    #[error("Team already has a submission")]
    DuplicateSubmission,
    #[error("Award {0} was already given to this submission")]
    DuplicateAward(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EventError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        EventError::NotFound { entity, id: id.to_string() }
    }

    pub fn not_found_by_name(entity: &'static str, name: &str) -> Self {
        EventError::NotFound { entity, id: name.to_string() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EventError::Validation(message.into())
    }
}

pub type EventResult<T> = Result<T, EventError>;
