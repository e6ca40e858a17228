//! Admin broadcasts to every connected client and every contributor's inbox.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::events::{BroadcastNotice, EventTopic, RealtimeEvent};
use crate::domain::notification::{NotificationKind, NotificationTemplate};
use crate::domain::ports::{AlertEventPublisher, BroadcastCommand, NotificationRepository};
use crate::domain::{Actor, Error};

pub struct BroadcastService<N> {
    notifications: Arc<N>,
    publisher: Arc<dyn AlertEventPublisher>,
    clock: Arc<dyn Clock>,
}

impl<N> BroadcastService<N> {
    pub fn new(
        notifications: Arc<N>,
        publisher: Arc<dyn AlertEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            publisher,
            clock,
        }
    }
}

#[async_trait]
impl<N> BroadcastCommand for BroadcastService<N>
where
    N: NotificationRepository,
{
    async fn broadcast(&self, actor: &Actor, notice: BroadcastNotice) -> Result<(), Error> {
        if !actor.is_admin() {
            return Err(Error::forbidden("admin access required"));
        }
        if notice.title.trim().is_empty() || notice.message.trim().is_empty() {
            return Err(Error::invalid_request("title and message are required"));
        }
        let template = NotificationTemplate {
            kind: NotificationKind::Broadcast(notice.kind.clone()),
            title: notice.title.clone(),
            message: notice.message.clone(),
        };
        let recipients = self
            .notifications
            .fan_out(&template, self.clock.utc())
            .await?;
        info!(
            user_id = %actor.user_id(),
            kind = notice.kind.as_str(),
            recipients,
            "admin broadcast"
        );
        self.publisher
            .publish(EventTopic::Global, RealtimeEvent::Broadcast(notice));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::DEFAULT_BROADCAST_KIND;
    use crate::domain::ports::{
        MockAlertEventPublisher, MockNotificationRepository, NotificationRepositoryError,
    };
    use crate::domain::{ErrorCode, UserId};
    use chrono::Utc;
    use mockable::MockClock;

    fn notice() -> BroadcastNotice {
        BroadcastNotice {
            title: "Cyclone warning".to_owned(),
            message: "Avoid coastal roads tonight".to_owned(),
            kind: DEFAULT_BROADCAST_KIND.to_owned(),
        }
    }

    fn clock() -> Arc<MockClock> {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(Utc::now());
        Arc::new(clock)
    }

    fn service(
        notifications: MockNotificationRepository,
        publisher: MockAlertEventPublisher,
    ) -> BroadcastService<MockNotificationRepository> {
        BroadcastService::new(Arc::new(notifications), Arc::new(publisher), clock())
    }

    #[tokio::test]
    async fn admins_broadcast_globally_and_to_every_inbox() {
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_fan_out()
            .withf(|template, _| {
                template.kind == NotificationKind::Broadcast(DEFAULT_BROADCAST_KIND.to_owned())
                    && template.title == "Cyclone warning"
            })
            .times(1)
            .returning(|_, _| Ok(3));
        let mut publisher = MockAlertEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|topic, event| {
                *topic == EventTopic::Global && *event == RealtimeEvent::Broadcast(notice())
            })
            .times(1)
            .return_const(());

        service(notifications, publisher)
            .broadcast(&Actor::admin(UserId::random()), notice())
            .await
            .expect("broadcast succeeds");
    }

    #[tokio::test]
    async fn users_cannot_broadcast() {
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_fan_out().never();
        let mut publisher = MockAlertEventPublisher::new();
        publisher.expect_publish().never();

        let err = service(notifications, publisher)
            .broadcast(&Actor::user(UserId::random()), notice())
            .await
            .expect_err("not an admin");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn nothing_is_published_when_the_inbox_write_fails() {
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_fan_out()
            .returning(|_, _| Err(NotificationRepositoryError::connection("refused")));
        let mut publisher = MockAlertEventPublisher::new();
        publisher.expect_publish().never();

        let err = service(notifications, publisher)
            .broadcast(&Actor::admin(UserId::random()), notice())
            .await
            .expect_err("inbox unavailable");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
