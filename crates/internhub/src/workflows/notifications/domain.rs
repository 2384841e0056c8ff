use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::internships::domain::{ApplicationId, InternshipSummary, Role, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

/// Topic a notification is published on. Mirrors the recipient's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Student,
    Company,
}

impl From<Role> for Audience {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => Audience::Student,
            Role::Company => Audience::Company,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationSubmitted,
    StatusChange,
    NewApplication,
    Milestone,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::ApplicationSubmitted => "application_submitted",
            NotificationKind::StatusChange => "status_change",
            NotificationKind::NewApplication => "new_application",
            NotificationKind::Milestone => "milestone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub audience: Audience,
    pub recipient: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub metadata: BTreeMap<String, String>,
}

/// Storage key of one bounded inbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InboxKey {
    pub audience: Audience,
    pub recipient: UserId,
}

impl InboxKey {
    pub fn new(audience: Audience, recipient: UserId) -> Self {
        Self {
            audience,
            recipient,
        }
    }

    pub fn student(recipient: &UserId) -> Self {
        Self::new(Audience::Student, recipient.clone())
    }

    pub fn company(recipient: &UserId) -> Self {
        Self::new(Audience::Company, recipient.clone())
    }
}

/// What the posting owner learns about a fresh application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSummary {
    pub internship: InternshipSummary,
    pub application_id: ApplicationId,
    pub student: UserId,
    pub student_name: String,
}
