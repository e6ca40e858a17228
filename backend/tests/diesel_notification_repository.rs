//! Integration tests for `DieselNotificationRepository` against embedded
//! PostgreSQL.

use chrono::{Duration, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

use roadguard::domain::alert::{Alert, AlertDetails, AlertReport, AlertType, Severity};
use roadguard::domain::geo::Coordinates;
use roadguard::domain::notification::{NotificationKind, NotificationTemplate};
use roadguard::domain::pagination::PageRequest;
use roadguard::domain::ports::{AlertRepository, NotificationRepository};
use roadguard::domain::{ContributionChange, ContributionPoints, NotificationId, UserId};
use roadguard::outbound::persistence::{DieselAlertRepository, DieselNotificationRepository};

mod support;

use support::{handle_cluster_setup_failure, test_pool};

struct TestContext {
    runtime: Runtime,
    notifications: DieselNotificationRepository,
    owner: UserId,
    other: UserId,
    _database: TemporaryDatabase,
}

/// Give `user_id` a contributor row by storing one report for them.
fn seed_contributor(
    runtime: &Runtime,
    alerts: &DieselAlertRepository,
    user_id: UserId,
) -> Result<(), String> {
    let alert = Alert::report(
        user_id,
        AlertReport {
            kind: AlertType::Flood,
            severity: Severity::Low,
            position: Coordinates::new(23.75, 90.39).map_err(|err| err.to_string())?,
            details: AlertDetails::default(),
        },
        Utc::now(),
    );
    let credit = ContributionChange::reported(user_id, &ContributionPoints::default());
    runtime
        .block_on(alerts.insert_reported(&alert, &credit))
        .map_err(|err| err.to_string())
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let (pool, database) = test_pool(&runtime)?;
    let alerts = DieselAlertRepository::new(pool.clone());
    let owner = UserId::random();
    let other = UserId::random();
    seed_contributor(&runtime, &alerts, owner)?;
    seed_contributor(&runtime, &alerts, other)?;

    Ok(TestContext {
        notifications: DieselNotificationRepository::new(pool),
        owner,
        other,
        runtime,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn notice(title: &str) -> NotificationTemplate {
    NotificationTemplate {
        kind: NotificationKind::Broadcast("ROAD_CLOSURE".to_owned()),
        title: title.to_owned(),
        message: "Expect delays".to_owned(),
    }
}

fn first_page() -> PageRequest {
    PageRequest::new(1, 20).expect("valid page")
}

#[rstest]
fn fan_out_reaches_every_contributor(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: fan_out_reaches_every_contributor skipped");
        return;
    };
    let repo = &context.notifications;

    context.runtime.block_on(async {
        let written = repo
            .fan_out(&notice("Bridge closed"), Utc::now())
            .await
            .expect("fan out");
        assert_eq!(written, 2);

        for user_id in [&context.owner, &context.other] {
            let inbox = repo.list(user_id, false, first_page()).await.expect("inbox");
            assert_eq!(inbox.total, 1);
            let note = &inbox.items[0];
            assert_eq!(&note.user_id, user_id);
            assert_eq!(note.kind, NotificationKind::Broadcast("ROAD_CLOSURE".to_owned()));
            assert_eq!(note.title, "Bridge closed");
            assert!(!note.is_read);
        }
    });
}

#[rstest]
fn inbox_lists_newest_first_and_filters_unread(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: inbox_lists_newest_first_and_filters_unread skipped");
        return;
    };
    let repo = &context.notifications;
    let start = Utc::now();

    context.runtime.block_on(async {
        for (offset, title) in ["first", "second", "third"].into_iter().enumerate() {
            let at = start + Duration::minutes(i64::try_from(offset).expect("small offset"));
            repo.fan_out(&notice(title), at).await.expect("fan out");
        }

        let inbox = repo
            .list(&context.owner, false, PageRequest::new(1, 2).expect("valid page"))
            .await
            .expect("inbox");
        let titles: Vec<&str> = inbox.items.iter().map(|note| note.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second"]);
        assert_eq!(inbox.total, 3);
        assert_eq!(inbox.total_pages(), 2);

        let newest = inbox.items[0].id;
        let read = repo
            .mark_read(&context.owner, &newest)
            .await
            .expect("mark read")
            .expect("owned notification");
        assert!(read.is_read);

        assert_eq!(repo.unread_count(&context.owner).await.expect("count"), 2);
        let unread = repo
            .list(&context.owner, true, first_page())
            .await
            .expect("unread inbox");
        let titles: Vec<&str> = unread.items.iter().map(|note| note.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        assert_eq!(repo.mark_all_read(&context.owner).await.expect("read all"), 2);
        assert_eq!(repo.unread_count(&context.owner).await.expect("count"), 0);
        assert_eq!(repo.unread_count(&context.other).await.expect("count"), 3);
    });
}

#[rstest]
fn other_users_cannot_touch_an_inbox(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: other_users_cannot_touch_an_inbox skipped");
        return;
    };
    let repo = &context.notifications;

    context.runtime.block_on(async {
        repo.fan_out(&notice("Bridge closed"), Utc::now())
            .await
            .expect("fan out");
        let mine = repo
            .list(&context.owner, false, first_page())
            .await
            .expect("inbox")
            .items[0]
            .id;

        let read = repo
            .mark_read(&context.other, &mine)
            .await
            .expect("mark read");
        assert!(read.is_none());
        assert!(!repo.delete(&context.other, &mine).await.expect("delete"));
        assert_eq!(repo.unread_count(&context.owner).await.expect("count"), 1);

        assert!(repo.delete(&context.owner, &mine).await.expect("delete"));
        assert!(!repo.delete(&context.owner, &mine).await.expect("delete again"));
        assert!(
            repo.mark_read(&context.owner, &NotificationId::random())
                .await
                .expect("mark read")
                .is_none()
        );
    });
}
