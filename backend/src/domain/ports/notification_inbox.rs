//! Driving port for a user's own notifications.

use async_trait::async_trait;

use crate::domain::notification::Notification;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{Error, NotificationId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, Error>;

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, Error>;

    /// `not_found` unless the notification belongs to `user_id`.
    async fn mark_read(&self, user_id: &UserId, id: &NotificationId)
    -> Result<Notification, Error>;

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, Error>;

    /// `not_found` unless the notification belongs to `user_id`.
    async fn delete(&self, user_id: &UserId, id: &NotificationId) -> Result<(), Error>;
}
