// src/core/changes.rs

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Serialize, Deserialize};
use std::fmt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::core::models::ChangeKind;

/// Notification center holds at most this many entries.
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Registrations,
    Teams,
    TeamMembers,
    TeamNotes,
    TeamSeekers,
    Submissions,
    Judges,
    JudgeAssignments,
    Scores,
    Awards,
    Challenges,
    Prizes,
    Integrations,
    NotificationTemplates,
    EventSettings,
}

impl fmt::Display for ChangeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeTable::Registrations => "registrations",
            ChangeTable::Teams => "teams",
            ChangeTable::TeamMembers => "team_members",
            ChangeTable::TeamNotes => "team_notes",
            ChangeTable::TeamSeekers => "team_seekers",
            ChangeTable::Submissions => "submissions",
            ChangeTable::Judges => "judges",
            ChangeTable::JudgeAssignments => "judge_assignments",
            ChangeTable::Scores => "scores",
            ChangeTable::Awards => "awards",
            ChangeTable::Challenges => "challenges",
            ChangeTable::Prizes => "prizes",
            ChangeTable::Integrations => "integrations",
            ChangeTable::NotificationTemplates => "notification_templates",
            ChangeTable::EventSettings => "event_settings",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    pub record_id: Option<Uuid>,
    pub summary: String,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: ChangeTable, kind: ChangeKind, record_id: Option<Uuid>, summary: impl Into<String>) -> Self {
        Self {
            table,
            kind,
            record_id,
            summary: summary.into(),
            at: Utc::now(),
        }
    }
}

/// Fan-out of table changes to any number of subscribers.
#[derive(Clone, Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        debug!("change: {} {:?} {:?}", event.table, event.kind, event.record_id);
        // No subscribers is fine; the event is simply dropped.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Subscribes as a stream. Lagged receivers skip what they missed.
    pub fn stream(&self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        BroadcastStream::new(self.sender.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Change subscriber lagged, skipped {} events", skipped);
                None
            }
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub table: ChangeTable,
    pub record_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Registrations, teams and submissions raise a notification when inserted.
    pub fn from_change(event: &ChangeEvent) -> Option<Self> {
        if event.kind != ChangeKind::Insert {
            return None;
        }
        let (title, message) = match event.table {
            ChangeTable::Registrations => ("New registration", format!("New registration: {}", event.summary)),
            ChangeTable::Teams => ("Team formed", format!("Team formed: {}", event.summary)),
            ChangeTable::Submissions => ("Submission received", format!("Submission received: {}", event.summary)),
            _ => return None,
        };
        Some(Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            message,
            table: event.table,
            record_id: event.record_id,
            read: false,
            created_at: event.at,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
}

impl NotificationCenter {
    pub fn push(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
        self.notifications.truncate(MAX_NOTIFICATIONS);
    }

    /// Newest first.
    pub fn list(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        self.notifications.iter_mut().for_each(|n| n.read = true);
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}
