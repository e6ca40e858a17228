//! Sweep behaviour and scheduler lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use mockable::MockClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    AlertRepositoryError, MockAlertEventPublisher, MockAlertRepository,
};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 9, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn clock(now: DateTime<Utc>) -> Arc<MockClock> {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(now);
    Arc::new(clock)
}

fn quiet_publisher() -> Arc<MockAlertEventPublisher> {
    let mut publisher = MockAlertEventPublisher::new();
    publisher.expect_publish().return_const(());
    Arc::new(publisher)
}

#[rstest]
#[tokio::test]
async fn sweep_publishes_one_event_per_expired_alert(now: DateTime<Utc>) {
    let due = vec![AlertId::random(), AlertId::random()];
    let returned = due.clone();
    let mut alerts = MockAlertRepository::new();
    alerts
        .expect_expire_due()
        .withf(move |at| *at == now)
        .times(1)
        .return_once(move |_| Ok(returned));
    let mut publisher = MockAlertEventPublisher::new();
    for id in due.clone() {
        publisher
            .expect_publish()
            .withf(move |topic, event| {
                *topic == EventTopic::Global && *event == RealtimeEvent::AlertExpired { id }
            })
            .times(1)
            .return_const(());
    }

    let sweeper = ExpirationSweeper::new(Arc::new(alerts), Arc::new(publisher), clock(now));
    let expired = sweeper.sweep().await.expect("sweep succeeds");

    assert_eq!(expired, due);
}

#[rstest]
#[tokio::test]
async fn empty_sweep_publishes_nothing(now: DateTime<Utc>) {
    let mut alerts = MockAlertRepository::new();
    alerts.expect_expire_due().return_once(|_| Ok(Vec::new()));
    let mut publisher = MockAlertEventPublisher::new();
    publisher.expect_publish().never();

    let sweeper = ExpirationSweeper::new(Arc::new(alerts), Arc::new(publisher), clock(now));
    assert!(sweeper.sweep().await.expect("sweep succeeds").is_empty());
}

#[rstest]
#[tokio::test]
async fn sweep_reports_repository_failures(now: DateTime<Utc>) {
    let mut alerts = MockAlertRepository::new();
    alerts
        .expect_expire_due()
        .return_once(|_| Err(AlertRepositoryError::connection("database is down")));

    let sweeper = ExpirationSweeper::new(Arc::new(alerts), quiet_publisher(), clock(now));
    let err = sweeper.sweep().await.expect_err("sweep fails");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

fn counting_repository(calls: Arc<AtomicUsize>, fail_first: bool) -> MockAlertRepository {
    let mut alerts = MockAlertRepository::new();
    alerts.expect_expire_due().returning(move |_| {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        if fail_first && call == 0 {
            Err(AlertRepositoryError::query("deadlock detected"))
        } else {
            Ok(Vec::new())
        }
    });
    alerts
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn scheduler_sweeps_immediately_then_every_period(now: DateTime<Utc>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sweeper = Arc::new(ExpirationSweeper::new(
        Arc::new(counting_repository(Arc::clone(&calls), false)),
        quiet_publisher(),
        clock(now),
    ));

    let handle = spawn_expiration_scheduler(sweeper, DEFAULT_SWEEP_PERIOD);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    handle.shutdown().await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn scheduler_keeps_ticking_after_a_failed_sweep(now: DateTime<Utc>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sweeper = Arc::new(ExpirationSweeper::new(
        Arc::new(counting_repository(Arc::clone(&calls), true)),
        quiet_publisher(),
        clock(now),
    ));

    let handle = spawn_expiration_scheduler(sweeper, Duration::from_secs(10));
    tokio::time::sleep(Duration::from_secs(25)).await;
    handle.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_stops_further_sweeps(now: DateTime<Utc>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sweeper = Arc::new(ExpirationSweeper::new(
        Arc::new(counting_repository(Arc::clone(&calls), false)),
        quiet_publisher(),
        clock(now),
    ));

    let handle = spawn_expiration_scheduler(sweeper, Duration::from_secs(5));
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.shutdown().await;
    let after_shutdown = calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_shutdown);
}
