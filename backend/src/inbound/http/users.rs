//! Per-user read models.
//!
//! ```text
//! GET /api/v1/users/me/contribution
//! GET /api/v1/users/me/alerts?status&page&limit
//! GET /api/v1/users/leaderboard?limit
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_alert_status, parse_limit, parse_page};
use crate::inbound::payloads::{
    AlertPayload, ContributionPayload, LeaderboardEntryPayload, PaginationPayload,
};

const DEFAULT_MY_ALERTS_LIMIT: u32 = 20;
const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyAlertsQuery {
    /// Only alerts in this lifecycle state.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyAlertsResponse {
    pub alerts: Vec<AlertPayload>,
    pub pagination: PaginationPayload,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Rows to return, 1 to 100; defaults to 10.
    pub limit: Option<u32>,
}

/// The caller's contribution score, level and report counts.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/contribution",
    responses(
        (status = 200, description = "Contribution stats", body = ContributionPayload),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "myContribution"
)]
#[get("/users/me/contribution")]
pub async fn my_contribution(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ContributionPayload>> {
    let actor = session.require_actor()?;
    let stats = state.alert_query.contribution(actor.user_id()).await?;
    Ok(web::Json(ContributionPayload::from(stats)))
}

/// Alerts the caller reported, newest first, in any status.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/alerts",
    params(MyAlertsQuery),
    responses(
        (status = 200, description = "The caller's alerts", body = MyAlertsResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "myAlerts"
)]
#[get("/users/me/alerts")]
pub async fn my_alerts(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<MyAlertsQuery>,
) -> ApiResult<web::Json<MyAlertsResponse>> {
    let actor = session.require_actor()?;
    let MyAlertsQuery {
        status,
        page,
        limit,
    } = query.into_inner();
    let page = parse_page(page, limit, DEFAULT_MY_ALERTS_LIMIT)?;
    let status = status.as_deref().map(parse_alert_status).transpose()?;
    let mine = state
        .alert_query
        .reported_by(actor.user_id(), status, page)
        .await?;
    Ok(web::Json(MyAlertsResponse {
        pagination: PaginationPayload::from(&mine),
        alerts: mine.items.iter().map(AlertPayload::from).collect(),
    }))
}

/// Top contributors by score.
#[utoipa::path(
    get,
    path = "/api/v1/users/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Ranked contributors", body = [LeaderboardEntryPayload]),
        (status = 400, description = "Invalid limit", body = Error)
    ),
    tags = ["users"],
    security([]),
    operation_id = "leaderboard"
)]
#[get("/users/leaderboard")]
pub async fn leaderboard(
    state: web::Data<HttpState>,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult<web::Json<Vec<LeaderboardEntryPayload>>> {
    let limit = parse_limit(query.into_inner().limit, DEFAULT_LEADERBOARD_LIMIT)?;
    let board = state.alert_query.leaderboard(limit).await?;
    Ok(web::Json(
        board.into_iter().map(LeaderboardEntryPayload::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};

    use crate::domain::alert::AlertStatus;
    use crate::domain::pagination::PageRequest;
    use crate::domain::ports::LeaderboardEntry;
    use crate::domain::{ContributorStats, UserId};
    use crate::inbound::http::test_utils::{
        MockPorts, USER_ID, login_cookie, test_session_middleware, user,
    };

    #[actix_web::test]
    async fn newcomers_see_zeroed_stats() {
        let mut ports = MockPorts::default();
        ports
            .alert_query
            .expect_contribution()
            .return_once(|id| Ok(ContributorStats::empty(*id)));
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .wrap(test_session_middleware())
                .service(my_contribution),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/users/me/contribution")
            .cookie(login_cookie(&user()).await)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({
                "userId": USER_ID,
                "contributionScore": 0,
                "level": "BRONZE",
                "totalReports": 0,
                "verifiedReports": 0
            })
        );
    }

    #[actix_web::test]
    async fn anonymous_callers_are_unauthorised() {
        let app = actix_test::init_service(
            App::new()
                .app_data(MockPorts::default().into_state())
                .wrap(test_session_middleware())
                .service(my_contribution),
        )
        .await;
        let req = actix_test::TestRequest::get().uri("/users/me/contribution").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn my_alerts_are_scoped_to_the_caller() {
        let mut ports = MockPorts::default();
        ports
            .alert_query
            .expect_reported_by()
            .withf(|reporter, status, page| {
                reporter.to_string() == USER_ID
                    && *status == Some(AlertStatus::Removed)
                    && *page == PageRequest::new(2, 20).expect("valid page")
            })
            .times(1)
            .return_once(|_, _, page| Ok(page.slice(Vec::new())));
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .wrap(test_session_middleware())
                .service(my_alerts),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/users/me/alerts?status=REMOVED&page=2")
            .cookie(login_cookie(&user()).await)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["alerts"], json!([]));
        assert_eq!(body["pagination"]["page"], 2);
        assert_eq!(body["pagination"]["totalPages"], 0);
    }

    #[actix_web::test]
    async fn leaderboard_is_public_and_ranked() {
        let leader = UserId::new(USER_ID).expect("fixture id");
        let mut ports = MockPorts::default();
        ports
            .alert_query
            .expect_leaderboard()
            .withf(|limit| *limit == 10)
            .times(1)
            .return_once(move |_| {
                Ok(vec![LeaderboardEntry {
                    rank: 1,
                    stats: ContributorStats {
                        contribution_score: 215,
                        level: crate::domain::UserLevel::Gold,
                        ..ContributorStats::empty(leader)
                    },
                }])
            });
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .service(leaderboard),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/users/leaderboard").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["rank"], 1);
        assert_eq!(body[0]["userId"], USER_ID);
        assert_eq!(body[0]["level"], "GOLD");
    }

    #[actix_web::test]
    async fn leaderboard_limit_is_validated() {
        let app = actix_test::init_service(
            App::new()
                .app_data(MockPorts::default().into_state())
                .service(leaderboard),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/users/leaderboard?limit=0")
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
