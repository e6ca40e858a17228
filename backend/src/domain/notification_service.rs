//! Service behind the notification inbox routes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::notification::Notification;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{NotificationInbox, NotificationRepository};
use crate::domain::{Error, NotificationId, UserId};

pub struct NotificationService<N> {
    notifications: Arc<N>,
}

impl<N> NotificationService<N> {
    pub fn new(notifications: Arc<N>) -> Self {
        Self { notifications }
    }
}

fn missing(id: &NotificationId) -> Error {
    Error::not_found(format!("notification {id} not found"))
}

#[async_trait]
impl<N> NotificationInbox for NotificationService<N>
where
    N: NotificationRepository,
{
    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, Error> {
        Ok(self.notifications.list(user_id, unread_only, page).await?)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, Error> {
        Ok(self.notifications.unread_count(user_id).await?)
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, Error> {
        self.notifications
            .mark_read(user_id, id)
            .await?
            .ok_or_else(|| missing(id))
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, Error> {
        let changed = self.notifications.mark_all_read(user_id).await?;
        debug!(user_id = %user_id, changed, "notifications marked read");
        Ok(changed)
    }

    async fn delete(&self, user_id: &UserId, id: &NotificationId) -> Result<(), Error> {
        if !self.notifications.delete(user_id, id).await? {
            return Err(missing(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::notification::NotificationKind;
    use crate::domain::ports::{MockNotificationRepository, NotificationRepositoryError};
    use chrono::Utc;
    use rstest::rstest;

    fn service(repo: MockNotificationRepository) -> NotificationService<MockNotificationRepository> {
        NotificationService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn marking_someone_elses_notification_is_not_found() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read().times(1).returning(|_, _| Ok(None));

        let err = service(repo)
            .mark_read(&UserId::random(), &NotificationId::random())
            .await
            .expect_err("not owned");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn marking_returns_the_read_notification() {
        let owner = UserId::random();
        let mut note = Notification::new(
            owner,
            NotificationKind::System,
            "Level up!",
            "Congratulations!",
            Utc::now(),
        );
        note.is_read = true;
        let stored = note.clone();
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read()
            .withf(move |user, _| *user == owner)
            .returning(move |_, _| Ok(Some(stored.clone())));

        let read = service(repo)
            .mark_read(&owner, &note.id)
            .await
            .expect("marked");

        assert!(read.is_read);
    }

    #[rstest]
    #[case(true, None)]
    #[case(false, Some(ErrorCode::NotFound))]
    #[tokio::test]
    async fn delete_reports_missing_rows(
        #[case] deleted: bool,
        #[case] expected: Option<ErrorCode>,
    ) {
        let mut repo = MockNotificationRepository::new();
        repo.expect_delete().returning(move |_, _| Ok(deleted));

        let result = service(repo)
            .delete(&UserId::random(), &NotificationId::random())
            .await;

        assert_eq!(result.err().map(|err| err.code()), expected);
    }

    #[tokio::test]
    async fn repository_outages_are_unavailable() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_unread_count()
            .returning(|_| Err(NotificationRepositoryError::connection("refused")));

        let err = service(repo)
            .unread_count(&UserId::random())
            .await
            .expect_err("outage");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
