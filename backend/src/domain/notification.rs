//! Per-user notification inbox entries.
//!
//! Notifications are written for level promotions and admin broadcasts and
//! are only ever read or changed by the user they belong to.

use chrono::{DateTime, Utc};

use super::{NotificationId, UserId, UserLevel};

/// Why a notification was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// Generated by the system, such as a level promotion.
    System,
    /// An admin broadcast; carries the broadcast's own type label.
    Broadcast(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "SYSTEM",
            Self::Broadcast(kind) => kind,
        }
    }

    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "SYSTEM" => Self::System,
            other => Self::Broadcast(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::random(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            is_read: false,
            created_at: now,
        }
    }

    /// Congratulation written when a contributor reaches a higher level.
    pub fn level_up(user_id: UserId, level: UserLevel, now: DateTime<Utc>) -> Self {
        Self::new(
            user_id,
            NotificationKind::System,
            "Level up!",
            format!("Congratulations! You've reached {} level!", level.as_str()),
            now,
        )
    }
}

/// Title, message and kind shared by every copy of a fanned-out notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NotificationTemplate {
    pub fn for_user(&self, user_id: UserId, now: DateTime<Utc>) -> Notification {
        Notification::new(
            user_id,
            self.kind.clone(),
            self.title.clone(),
            self.message.clone(),
            now,
        )
    }
}
