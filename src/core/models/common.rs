use uuid::Uuid;
use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::error::{EventError, EventResult};

pub trait NameMatches {
    fn name_matches(&self, name: &str) -> bool;
}

/// Case-insensitive for any script, ignoring surrounding whitespace.
pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// The single record matching `name`. Two or more matches is an error rather
/// than a guess.
pub fn get_id_by_name<T: NameMatches>(map: &HashMap<Uuid, T>, entity: &'static str, name: &str) -> EventResult<Uuid> {
    let mut matches = map.iter()
        .filter(|(_, item)| item.name_matches(name))
        .map(|(id, _)| *id);
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(EventError::not_found_by_name(entity, name)),
        (Some(_), Some(_)) => Err(EventError::AmbiguousName { entity, name: name.trim().to_string() }),
    }
}

/// Splits a comma separated tag list, trimming entries and dropping empty ones.
pub fn split_tags(input: &str) -> Vec<String> {
    input.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: &str, entity_type: &str, entity_id: Option<Uuid>, details: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            details,
            created_at: Utc::now(),
        }
    }
}
