//! SOS request service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::events::{EventTopic, RealtimeEvent};
use crate::domain::geo::{Coordinates, SearchRadius, nearest_within};
use crate::domain::ports::{AlertEventPublisher, NearbySos, SosCommand, SosRepository};
use crate::domain::sos::{SosDraft, SosRequest, SosStatus};
use crate::domain::{Actor, Error, SosId, UserId};

pub struct SosService<S> {
    requests: Arc<S>,
    publisher: Arc<dyn AlertEventPublisher>,
    clock: Arc<dyn Clock>,
}

impl<S> SosService<S> {
    pub fn new(
        requests: Arc<S>,
        publisher: Arc<dyn AlertEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            requests,
            publisher,
            clock,
        }
    }
}

impl<S: SosRepository> SosService<S> {
    async fn load(&self, id: &SosId) -> Result<SosRequest, Error> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("sos request {id} not found")))
    }

    async fn advance(
        &self,
        mut request: SosRequest,
        next: SosStatus,
    ) -> Result<SosRequest, Error> {
        let previous = request.status;
        if !request.advance(next, self.clock.utc()) {
            return Err(Error::conflict(format!(
                "sos request cannot move from {} to {}",
                previous.as_str(),
                next.as_str()
            )));
        }
        if !self.requests.save_transition(&request, previous).await? {
            return Err(Error::conflict("sos request changed concurrently"));
        }
        info!(
            sos_id = %request.id,
            from = previous.as_str(),
            to = next.as_str(),
            "sos status changed"
        );
        Ok(request)
    }
}

#[async_trait]
impl<S: SosRepository> SosCommand for SosService<S> {
    async fn raise(&self, actor: &Actor, draft: SosDraft) -> Result<SosRequest, Error> {
        draft.validate()?;
        if self
            .requests
            .find_active_for_user(actor.user_id())
            .await?
            .is_some()
        {
            return Err(Error::conflict("you already have an active SOS request"));
        }

        let request = SosRequest::raise(*actor.user_id(), draft, self.clock.utc());
        self.requests.insert(&request).await?;
        info!(
            sos_id = %request.id,
            user_id = %request.user_id,
            kind = request.kind.as_str(),
            "sos raised"
        );
        self.publisher.publish(
            EventTopic::at(request.position),
            RealtimeEvent::sos_nearby(request.clone()),
        );
        Ok(request)
    }

    async fn active_for(&self, user_id: &UserId) -> Result<Option<SosRequest>, Error> {
        Ok(self.requests.find_active_for_user(user_id).await?)
    }

    async fn nearby(
        &self,
        centre: Coordinates,
        radius: SearchRadius,
    ) -> Result<Vec<NearbySos>, Error> {
        let active = self.requests.list_active().await?;
        Ok(nearest_within(active, centre, radius, |request| request.position)
            .into_iter()
            .map(|(request, distance_metres)| NearbySos {
                request,
                distance_metres,
            })
            .collect())
    }

    async fn respond(
        &self,
        _actor: &Actor,
        id: &SosId,
        status: SosStatus,
    ) -> Result<SosRequest, Error> {
        if !matches!(status, SosStatus::Responded | SosStatus::Resolved) {
            return Err(Error::invalid_request(
                "status must be RESPONDED or RESOLVED",
            ));
        }
        let request = self.load(id).await?;
        self.advance(request, status).await
    }

    async fn cancel(&self, actor: &Actor, id: &SosId) -> Result<SosRequest, Error> {
        let request = self.load(id).await?;
        if !actor.may_manage(&request.user_id) {
            return Err(Error::forbidden(
                "only the requester or an admin may cancel this request",
            ));
        }
        self.advance(request, SosStatus::Cancelled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockAlertEventPublisher, MockSosRepository};
    use crate::domain::sos::SosKind;
    use chrono::{DateTime, TimeZone, Utc};
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 21, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn draft() -> SosDraft {
        SosDraft {
            kind: SosKind::Medical,
            description: Some("chest pain".to_owned()),
            address: None,
            position: Coordinates::new(23.78, 90.40).expect("valid"),
        }
    }

    fn service(
        repo: MockSosRepository,
        publisher: MockAlertEventPublisher,
        now: DateTime<Utc>,
    ) -> SosService<MockSosRepository> {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(now);
        SosService::new(Arc::new(repo), Arc::new(publisher), Arc::new(clock))
    }

    #[rstest]
    #[tokio::test]
    async fn raise_publishes_sos_nearby(now: DateTime<Utc>) {
        let mut repo = MockSosRepository::new();
        repo.expect_find_active_for_user().return_once(|_| Ok(None));
        repo.expect_insert().times(1).return_once(|_| Ok(()));
        let mut publisher = MockAlertEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|_, event| match event {
                RealtimeEvent::SosNearby { message, .. } => {
                    message == "Emergency MEDICAL request nearby!"
                }
                _ => false,
            })
            .times(1)
            .return_const(());

        let request = service(repo, publisher, now)
            .raise(&Actor::user(UserId::random()), draft())
            .await
            .expect("raise succeeds");

        assert_eq!(request.status, SosStatus::Active);
        assert_eq!(request.created_at, now);
    }

    #[rstest]
    #[tokio::test]
    async fn second_active_request_conflicts(now: DateTime<Utc>) {
        let user = UserId::random();
        let existing = SosRequest::raise(user, draft(), now);
        let mut repo = MockSosRepository::new();
        repo.expect_find_active_for_user()
            .return_once(move |_| Ok(Some(existing)));
        repo.expect_insert().never();

        let err = service(repo, MockAlertEventPublisher::new(), now)
            .raise(&Actor::user(user), draft())
            .await
            .expect_err("one active request per user");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn respond_stamps_responded_at(now: DateTime<Utc>) {
        let existing = SosRequest::raise(UserId::random(), draft(), now);
        let id = existing.id;
        let mut repo = MockSosRepository::new();
        repo.expect_find_by_id().return_once(move |_| Ok(Some(existing)));
        repo.expect_save_transition()
            .withf(|request, expected| {
                request.status == SosStatus::Responded && *expected == SosStatus::Active
            })
            .return_once(|_, _| Ok(true));

        let updated = service(repo, MockAlertEventPublisher::new(), now)
            .respond(&Actor::user(UserId::random()), &id, SosStatus::Responded)
            .await
            .expect("respond succeeds");

        assert_eq!(updated.responded_at, Some(now));
    }

    #[rstest]
    #[tokio::test]
    async fn respond_cannot_cancel(now: DateTime<Utc>) {
        let err = service(MockSosRepository::new(), MockAlertEventPublisher::new(), now)
            .respond(&Actor::user(UserId::random()), &SosId::random(), SosStatus::Cancelled)
            .await
            .expect_err("cancel goes through cancel");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn strangers_cannot_cancel(now: DateTime<Utc>) {
        let existing = SosRequest::raise(UserId::random(), draft(), now);
        let id = existing.id;
        let mut repo = MockSosRepository::new();
        repo.expect_find_by_id().return_once(move |_| Ok(Some(existing)));
        repo.expect_save_transition().never();

        let err = service(repo, MockAlertEventPublisher::new(), now)
            .cancel(&Actor::user(UserId::random()), &id)
            .await
            .expect_err("not the owner");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn resolved_requests_cannot_be_cancelled(now: DateTime<Utc>) {
        let owner = UserId::random();
        let mut existing = SosRequest::raise(owner, draft(), now);
        existing.status = SosStatus::Resolved;
        let id = existing.id;
        let mut repo = MockSosRepository::new();
        repo.expect_find_by_id().return_once(move |_| Ok(Some(existing)));

        let err = service(repo, MockAlertEventPublisher::new(), now)
            .cancel(&Actor::user(owner), &id)
            .await
            .expect_err("terminal request");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }
}
