//! Port for the per-user notification inbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::notification::{Notification, NotificationTemplate};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        Connection =>
            "notification repository connection failed: {message}",
        Query =>
            "notification repository query failed: {message}",
    }
}

/// Every method taking a `user_id` only touches that user's notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Write one copy of `template` for every user with a contribution
    /// record, returning how many were written.
    async fn fan_out(
        &self,
        template: &NotificationTemplate,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError>;

    /// Newest first.
    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, NotificationRepositoryError>;

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError>;

    /// Returns `None` when the notification does not exist or belongs to
    /// someone else.
    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError>;

    /// Returns whether a notification owned by `user_id` was deleted.
    async fn delete(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError>;
}
