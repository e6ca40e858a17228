//! Handler tests for the alert endpoints.

use super::*;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};

use crate::domain::alert::{Alert, AlertStatus, AlertType, Severity};
use crate::domain::geo::Coordinates;
use crate::domain::pagination::PageRequest;
use crate::domain::{AlertId, UserId, VoteDirection};
use crate::inbound::http::test_utils::{
    ALERT_ID, MockPorts, USER_ID, admin, login_cookie, test_session_middleware, user,
};

fn stored_alert() -> Alert {
    let now = Utc
        .with_ymd_and_hms(2026, 2, 14, 6, 0, 0)
        .single()
        .expect("valid timestamp");
    let mut alert = Alert::report(
        UserId::new(USER_ID).expect("fixture id"),
        AlertReport {
            kind: AlertType::Flood,
            severity: Severity::High,
            position: Coordinates::new(23.8103, 90.4125).expect("valid coordinates"),
            details: AlertDetails {
                title: Some("Water on Airport Road".to_owned()),
                ..AlertDetails::default()
            },
        },
        now,
    );
    alert.id = AlertId::new(ALERT_ID).expect("fixture id");
    alert
}

macro_rules! alerts_app {
    ($ports:expr) => {
        actix_test::init_service(
            App::new()
                .app_data($ports.into_state())
                .wrap(test_session_middleware())
                .service(create_alert)
                .service(list_alerts)
                .service(nearby_alerts)
                .service(alerts_in_area)
                .service(sync_offline_alerts)
                .service(get_alert)
                .service(update_alert)
                .service(delete_alert),
        )
        .await
    };
}

#[rstest]
fn create_request_requires_type_and_severity() {
    let err = parse_create_request(CreateAlertRequest {
        severity: Some("LOW".to_owned()),
        latitude: Some(1.0),
        longitude: Some(1.0),
        ..CreateAlertRequest::default()
    })
    .expect_err("type missing");
    assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!("type")));

    let err = parse_create_request(CreateAlertRequest {
        kind: Some("FLOOD".to_owned()),
        latitude: Some(1.0),
        longitude: Some(1.0),
        ..CreateAlertRequest::default()
    })
    .expect_err("severity missing");
    assert_eq!(
        err.details().and_then(|d| d.get("field")),
        Some(&json!("severity"))
    );
}

#[rstest]
fn create_request_rejects_unknown_type() {
    let err = parse_create_request(CreateAlertRequest {
        kind: Some("SINKHOLE".to_owned()),
        severity: Some("CRITICAL".to_owned()),
        latitude: Some(23.8),
        longitude: Some(90.4),
        ..CreateAlertRequest::default()
    })
    .expect_err("unknown type");
    assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!("type")));
}

#[rstest]
fn update_request_rejects_unknown_status() {
    let err = parse_update_request(UpdateAlertRequest {
        status: Some("ARCHIVED".to_owned()),
        ..UpdateAlertRequest::default()
    })
    .expect_err("unknown status");
    assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
}

#[actix_web::test]
async fn create_returns_201_with_the_alert() {
    let mut ports = MockPorts::default();
    ports
        .alerts
        .expect_report()
        .withf(|actor, report| {
            *actor == user() && report.kind == AlertType::Flood && report.severity == Severity::High
        })
        .times(1)
        .return_once(|_, _| Ok(stored_alert()));
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::post()
        .uri("/alerts")
        .cookie(login_cookie(&user()).await)
        .set_json(json!({
            "type": "FLOOD",
            "severity": "HIGH",
            "latitude": 23.8103,
            "longitude": 90.4125,
            "title": "Water on Airport Road"
        }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["id"], ALERT_ID);
    assert_eq!(body["type"], "FLOOD");
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["reporterId"], USER_ID);
    assert_eq!(body["description"], Value::Null);
}

#[actix_web::test]
async fn create_without_session_is_unauthorised() {
    let app = alerts_app!(MockPorts::default());
    let req = actix_test::TestRequest::post()
        .uri("/alerts")
        .set_json(json!({ "type": "FLOOD", "severity": "HIGH", "latitude": 1.0, "longitude": 1.0 }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case(json!({ "type": "FLOOD", "severity": "HIGH", "latitude": 95.0, "longitude": 1.0 }), "latitude")]
#[case(json!({ "type": "FLOOD", "severity": "SEVERE", "latitude": 1.0, "longitude": 1.0 }), "severity")]
#[case(json!({ "type": "FLOOD", "severity": "HIGH", "latitude": 1.0 }), "longitude")]
#[case(json!({ "type": "METEOR_STRIKE", "severity": "LOW", "latitude": 1.0, "longitude": 1.0 }), "type")]
#[actix_web::test]
async fn create_rejects_invalid_fields(#[case] payload: Value, #[case] field: &str) {
    let app = alerts_app!(MockPorts::default());
    let req = actix_test::TestRequest::post()
        .uri("/alerts")
        .cookie(login_cookie(&user()).await)
        .set_json(payload)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn nearby_uses_the_notification_radius_by_default() {
    let mut ports = MockPorts::default();
    ports
        .alert_query
        .expect_nearby()
        .withf(|_, radius| radius.metres() == 500.0)
        .return_once(|_, _| {
            Ok(vec![NearbyAlert {
                alert: stored_alert(),
                distance_metres: 120.5,
            }])
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::get()
        .uri("/alerts/nearby?latitude=23.81&longitude=90.41")
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["id"], ALERT_ID);
    assert_eq!(body[0]["distance"], 120.5);
}

#[actix_web::test]
async fn nearby_requires_coordinates() {
    let app = alerts_app!(MockPorts::default());
    let req = actix_test::TestRequest::get()
        .uri("/alerts/nearby?latitude=23.81")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn anonymous_get_has_no_user_vote() {
    let mut ports = MockPorts::default();
    ports
        .alert_query
        .expect_get()
        .withf(|viewer, _| viewer.is_none())
        .return_once(|_, _| {
            Ok(AlertView {
                alert: stored_alert(),
                caller_vote: None,
            })
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::get()
        .uri(&format!("/alerts/{ALERT_ID}"))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], ALERT_ID);
    assert_eq!(body["userVote"], Value::Null);
}

#[actix_web::test]
async fn signed_in_get_includes_user_vote() {
    let mut ports = MockPorts::default();
    ports
        .alert_query
        .expect_get()
        .withf(|viewer, _| viewer.as_ref() == Some(user().user_id()))
        .return_once(|_, _| {
            Ok(AlertView {
                alert: stored_alert(),
                caller_vote: Some(VoteDirection::Up),
            })
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::get()
        .uri(&format!("/alerts/{ALERT_ID}"))
        .cookie(login_cookie(&user()).await)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userVote"], "upvote");
}

#[actix_web::test]
async fn malformed_id_is_rejected_before_the_port() {
    let app = alerts_app!(MockPorts::default());
    let req = actix_test::TestRequest::get().uri("/alerts/42").to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn patch_to_removed_reaches_the_command() {
    let mut ports = MockPorts::default();
    ports
        .alerts
        .expect_update()
        .withf(|_, _, update| update.status == Some(AlertStatus::Removed) && update.edit.is_empty())
        .return_once(|_, _, _| {
            let mut alert = stored_alert();
            alert.status = AlertStatus::Removed;
            Ok(alert)
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::patch()
        .uri(&format!("/alerts/{ALERT_ID}"))
        .cookie(login_cookie(&user()).await)
        .set_json(json!({ "status": "REMOVED" }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "REMOVED");
}

#[actix_web::test]
async fn patch_conflict_maps_to_409() {
    let mut ports = MockPorts::default();
    ports
        .alerts
        .expect_update()
        .return_once(|_, _, _| Err(Error::conflict("alert is EXPIRED")));
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::patch()
        .uri(&format!("/alerts/{ALERT_ID}"))
        .cookie(login_cookie(&user()).await)
        .set_json(json!({ "severity": "LOW" }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn admin_delete_passes_the_admin_actor() {
    let mut ports = MockPorts::default();
    ports
        .alerts
        .expect_delete()
        .withf(|actor, id| actor.is_admin() && id.to_string() == ALERT_ID)
        .times(1)
        .return_once(|_, _| Ok(()));
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/alerts/{ALERT_ID}"))
        .cookie(login_cookie(&admin()).await)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Alert deleted successfully");
}

#[actix_web::test]
async fn listing_defaults_to_active_alerts_without_a_centre() {
    let mut ports = MockPorts::default();
    ports
        .alert_query
        .expect_list()
        .withf(|filter, near, page| {
            *filter == AlertFilter::default()
                && near.is_none()
                && *page == PageRequest::new(1, 50).expect("valid page")
        })
        .times(1)
        .return_once(|_, _, page| {
            Ok(page.slice(vec![ListedAlert {
                alert: stored_alert(),
                distance_metres: None,
            }]))
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::get().uri("/alerts").to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["alerts"][0]["id"], ALERT_ID);
    assert!(body["alerts"][0].get("distance").is_none());
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "limit": 50, "total": 1, "totalPages": 1 })
    );
}

#[actix_web::test]
async fn listing_with_coordinates_uses_the_map_radius() {
    let mut ports = MockPorts::default();
    ports
        .alert_query
        .expect_list()
        .withf(|filter, near, page| {
            filter.kind == Some(AlertType::Flood)
                && filter.verified_only
                && filter.road_name.as_deref() == Some("Airport Road")
                && near
                    .as_ref()
                    .is_some_and(|(_, radius)| radius.metres() == 10_000.0)
                && page.page() == 2
        })
        .times(1)
        .return_once(|_, _, page| {
            Ok(page.slice(vec![ListedAlert {
                alert: stored_alert(),
                distance_metres: Some(42.0),
            }]))
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::get()
        .uri("/alerts?type=FLOOD&verified=true&roadName=%20Airport%20Road%20&latitude=23.81&longitude=90.41&page=2&limit=1")
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["alerts"], json!([]));
}

#[rstest]
#[case("/alerts?type=METEOR_STRIKE", "type")]
#[case("/alerts?limit=500", "limit")]
#[case("/alerts?radius=200", "latitude")]
#[case("/alerts?status=GONE", "status")]
#[actix_web::test]
async fn listing_rejects_bad_filters(#[case] uri: &str, #[case] field: &str) {
    let app = alerts_app!(MockPorts::default());
    let req = actix_test::TestRequest::get().uri(uri).to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn area_search_is_not_mistaken_for_an_id() {
    let mut ports = MockPorts::default();
    ports
        .alert_query
        .expect_in_area()
        .withf(|filter| filter.area.as_deref() == Some("Mirpur") && filter.road_name.is_none())
        .times(1)
        .return_once(|_| Ok(vec![stored_alert()]));
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::get()
        .uri("/alerts/area?area=Mirpur&roadName=")
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["id"], ALERT_ID);
}

#[actix_web::test]
async fn offline_sync_reports_skips_by_submitted_position() {
    let mut ports = MockPorts::default();
    ports
        .alerts
        .expect_sync_offline()
        .withf(|actor, reports| {
            *actor == user()
                && reports.len() == 2
                && reports[0].observed_at.is_some()
                && reports[1].observed_at.is_none()
        })
        .times(1)
        .return_once(|_, _| {
            Ok(OfflineSync {
                created: vec![stored_alert()],
                skipped: vec![SkippedReport {
                    index: 1,
                    reason: Error::invalid_request("alert expired before it was synced"),
                }],
            })
        });
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::post()
        .uri("/alerts/offline")
        .cookie(login_cookie(&user()).await)
        .set_json(json!({
            "alerts": [
                { "type": "FLOOD", "severity": "HIGH", "latitude": 23.81, "longitude": 90.41,
                  "timestamp": "2026-02-14T05:30:00Z" },
                { "type": "FLOOD", "severity": "SEVERE", "latitude": 23.81, "longitude": 90.41 },
                { "type": "POTHOLE", "severity": "LOW", "latitude": 23.81, "longitude": 90.41 }
            ]
        }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Processed 1 of 3 offline alerts");
    assert_eq!(body["alerts"][0]["id"], ALERT_ID);
    assert_eq!(body["skipped"][0]["index"], 1);
    assert_eq!(body["skipped"][0]["error"]["details"]["field"], "severity");
    assert_eq!(body["skipped"][1]["index"], 2);
}

#[actix_web::test]
async fn offline_sync_never_calls_the_port_when_every_item_is_invalid() {
    let mut ports = MockPorts::default();
    ports.alerts.expect_sync_offline().never();
    let app = alerts_app!(ports);

    let req = actix_test::TestRequest::post()
        .uri("/alerts/offline")
        .cookie(login_cookie(&user()).await)
        .set_json(json!({
            "alerts": [{ "type": "FLOOD", "severity": "HIGH", "latitude": 23.81,
                         "longitude": 90.41, "timestamp": "last tuesday" }]
        }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["alerts"], json!([]));
    assert_eq!(body["skipped"][0]["error"]["details"]["field"], "timestamp");
}

#[rstest]
#[case(json!({ "alerts": [] }))]
#[case(json!({ "alerts": vec![json!({}); 51] }))]
#[actix_web::test]
async fn offline_sync_bounds_the_batch(#[case] payload: Value) {
    let app = alerts_app!(MockPorts::default());
    let req = actix_test::TestRequest::post()
        .uri("/alerts/offline")
        .cookie(login_cookie(&user()).await)
        .set_json(payload)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
