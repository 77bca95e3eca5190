//! Applicant notifications emitted as a side effect of review decisions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permits::domain::{IntentId, PermitId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTone {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationTone {
    /// Tone shown to the applicant for a record that just moved to `status`.
    pub fn for_status(status: &str) -> Self {
        match status {
            "approved" => NotificationTone::Success,
            "rejected" => NotificationTone::Error,
            "requires_clarification" => NotificationTone::Warning,
            _ => NotificationTone::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NotificationSubject {
    Intent(IntentId),
    Permit(PermitId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub tone: NotificationTone,
    pub subject: NotificationSubject,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Text for a review decision notice: `(title, message)`.
pub fn review_notice(
    subject_label: &str,
    headline: &str,
    status_label: &str,
    reviewer_name: &str,
    notes: Option<&str>,
) -> (String, String) {
    let status_text = status_label.replace('_', " ");
    let title = format!("{} {}", capitalize(subject_label), status_text);

    let mut message = format!(
        "Your {subject_label} \"{headline}\" is now {status_text}. Reviewed by {reviewer_name}."
    );
    if let Some(notes) = notes.map(str::trim).filter(|notes| !notes.is_empty()) {
        message.push_str(" Notes: ");
        message.push_str(notes);
    }

    (title, message)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Outbound notification sink (the `notifications` table in production).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
    fn for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, NotificationError>;
    fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification {0} not found")]
    NotFound(NotificationId),
}
