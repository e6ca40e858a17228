//! SOS HTTP handlers.
//!
//! ```text
//! POST  /api/v1/sos
//! GET   /api/v1/sos/active
//! GET   /api/v1/sos/nearby?latitude&longitude&radius
//! PATCH /api/v1/sos/{id}/status
//! POST  /api/v1/sos/{id}/cancel
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::geo::SearchRadius;
use crate::domain::ports::NearbySos;
use crate::domain::sos::{SosDraft, SosKind};
use crate::inbound::http::ApiResult;
use crate::inbound::http::alerts::{MessageResponse, NearbyQuery};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_coordinates, parse_radius, parse_sos_id, parse_sos_kind, parse_sos_status,
    require,
};
use crate::inbound::payloads::SosPayload;

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSosRequest {
    /// Defaults to `OTHER`.
    #[serde(rename = "type")]
    #[schema(example = "MEDICAL")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

fn parse_create_request(payload: CreateSosRequest) -> Result<SosDraft, Error> {
    let kind = match payload.kind.as_deref() {
        Some(raw) => parse_sos_kind(raw)?,
        None => SosKind::Other,
    };
    let draft = SosDraft {
        kind,
        description: payload.description,
        address: payload.address,
        position: parse_coordinates(payload.latitude, payload.longitude)?,
    };
    draft.validate()?;
    Ok(draft)
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SosStatusRequest {
    /// `RESPONDED` or `RESOLVED`.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbySosItem {
    #[serde(flatten)]
    pub request: SosPayload,
    /// Metres from the query centre.
    pub distance: f64,
}

impl From<NearbySos> for NearbySosItem {
    fn from(nearby: NearbySos) -> Self {
        Self {
            request: SosPayload::from(&nearby.request),
            distance: nearby.distance_metres,
        }
    }
}

/// Ask nearby road users for help.
#[utoipa::path(
    post,
    path = "/api/v1/sos",
    request_body = CreateSosRequest,
    responses(
        (status = 201, description = "SOS raised", body = SosPayload),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "An active request already exists", body = Error)
    ),
    tags = ["sos"],
    operation_id = "createSos"
)]
#[post("/sos")]
pub async fn create_sos(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateSosRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor()?;
    let draft = parse_create_request(payload.into_inner())?;
    let request = state.sos.raise(&actor, draft).await?;
    Ok(HttpResponse::Created().json(SosPayload::from(&request)))
}

/// The caller's active request, or `null`.
#[utoipa::path(
    get,
    path = "/api/v1/sos/active",
    responses(
        (status = 200, description = "Active request, or null when there is none", body = SosPayload),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["sos"],
    operation_id = "activeSos"
)]
#[get("/sos/active")]
pub async fn active_sos(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Option<SosPayload>>> {
    let actor = session.require_actor()?;
    let active = state.sos.active_for(actor.user_id()).await?;
    Ok(web::Json(active.as_ref().map(SosPayload::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sos/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Active requests nearby", body = [NearbySosItem]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["sos"],
    operation_id = "nearbySos"
)]
#[get("/sos/nearby")]
pub async fn nearby_sos(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<NearbyQuery>,
) -> ApiResult<web::Json<Vec<NearbySosItem>>> {
    session.require_actor()?;
    let NearbyQuery {
        latitude,
        longitude,
        radius,
    } = query.into_inner();
    let centre = parse_coordinates(latitude, longitude)?;
    let radius = parse_radius(radius, SearchRadius::MAP_VIEW)?;
    let requests = state.sos.nearby(centre, radius).await?;
    Ok(web::Json(requests.into_iter().map(NearbySosItem::from).collect()))
}

/// Responder progress update.
#[utoipa::path(
    patch,
    path = "/api/v1/sos/{id}/status",
    params(("id" = String, Path, description = "SOS id")),
    request_body = SosStatusRequest,
    responses(
        (status = 200, description = "Updated request", body = SosPayload),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Illegal transition", body = Error)
    ),
    tags = ["sos"],
    operation_id = "updateSosStatus"
)]
#[patch("/sos/{id}/status")]
pub async fn update_sos_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SosStatusRequest>,
) -> ApiResult<web::Json<SosPayload>> {
    let actor = session.require_actor()?;
    let id = parse_sos_id(&path)?;
    let raw = require(payload.into_inner().status, FieldName::new("status"))?;
    let status = parse_sos_status(&raw)?;
    let request = state.sos.respond(&actor, &id, status).await?;
    Ok(web::Json(SosPayload::from(&request)))
}

/// Owner or admin cancellation.
#[utoipa::path(
    post,
    path = "/api/v1/sos/{id}/cancel",
    params(("id" = String, Path, description = "SOS id")),
    responses(
        (status = 200, description = "Request cancelled", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the requester", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already closed", body = Error)
    ),
    tags = ["sos"],
    operation_id = "cancelSos"
)]
#[post("/sos/{id}/cancel")]
pub async fn cancel_sos(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let actor = session.require_actor()?;
    let id = parse_sos_id(&path)?;
    state.sos.cancel(&actor, &id).await?;
    Ok(web::Json(MessageResponse::new("SOS request cancelled")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use crate::domain::geo::Coordinates;
    use crate::domain::sos::{SosRequest, SosStatus};
    use crate::domain::{SosId, UserId};
    use crate::inbound::http::test_utils::{
        MockPorts, SOS_ID, USER_ID, login_cookie, test_session_middleware, user,
    };

    fn active_request() -> SosRequest {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 14, 6, 0, 0)
            .single()
            .expect("valid timestamp");
        let mut request = SosRequest::raise(
            UserId::new(USER_ID).expect("fixture id"),
            SosDraft {
                kind: SosKind::Breakdown,
                description: None,
                address: Some("Mirpur Road".to_owned()),
                position: Coordinates::new(23.75, 90.38).expect("valid coordinates"),
            },
            now,
        );
        request.id = SosId::new(SOS_ID).expect("fixture id");
        request
    }

    macro_rules! sos_app {
        ($ports:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data($ports.into_state())
                    .wrap(test_session_middleware())
                    .service(create_sos)
                    .service(active_sos)
                    .service(nearby_sos)
                    .service(update_sos_status)
                    .service(cancel_sos),
            )
            .await
        };
    }

    #[test]
    fn missing_kind_defaults_to_other() {
        let draft = parse_create_request(CreateSosRequest {
            latitude: Some(23.7),
            longitude: Some(90.4),
            ..CreateSosRequest::default()
        })
        .expect("valid draft");
        assert_eq!(draft.kind, SosKind::Other);
    }

    #[actix_web::test]
    async fn create_returns_201() {
        let mut ports = MockPorts::default();
        ports
            .sos
            .expect_raise()
            .withf(|_, draft| draft.kind == SosKind::Breakdown)
            .return_once(|_, _| Ok(active_request()));
        let app = sos_app!(ports);

        let req = actix_test::TestRequest::post()
            .uri("/sos")
            .cookie(login_cookie(&user()).await)
            .set_json(json!({ "type": "BREAKDOWN", "latitude": 23.75, "longitude": 90.38 }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["id"], SOS_ID);
        assert_eq!(body["status"], "ACTIVE");
        assert_eq!(body["respondedAt"], Value::Null);
    }

    #[actix_web::test]
    async fn second_active_request_is_a_conflict() {
        let mut ports = MockPorts::default();
        ports
            .sos
            .expect_raise()
            .return_once(|_, _| Err(Error::conflict("you already have an active SOS request")));
        let app = sos_app!(ports);

        let req = actix_test::TestRequest::post()
            .uri("/sos")
            .cookie(login_cookie(&user()).await)
            .set_json(json!({ "type": "FUEL", "latitude": 23.75, "longitude": 90.38 }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn no_active_request_is_null() {
        let mut ports = MockPorts::default();
        ports.sos.expect_active_for().return_once(|_| Ok(None));
        let app = sos_app!(ports);

        let req = actix_test::TestRequest::get()
            .uri("/sos/active")
            .cookie(login_cookie(&user()).await)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, Value::Null);
    }

    #[actix_web::test]
    async fn nearby_defaults_to_the_map_radius() {
        let mut ports = MockPorts::default();
        ports
            .sos
            .expect_nearby()
            .withf(|_, radius| radius.metres() == 10_000.0)
            .return_once(|_, _| {
                Ok(vec![NearbySos {
                    request: active_request(),
                    distance_metres: 850.0,
                }])
            });
        let app = sos_app!(ports);

        let req = actix_test::TestRequest::get()
            .uri("/sos/nearby?latitude=23.76&longitude=90.38")
            .cookie(login_cookie(&user()).await)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["type"], "BREAKDOWN");
        assert_eq!(body[0]["distance"], 850.0);
    }

    #[actix_web::test]
    async fn status_update_parses_the_target() {
        let mut ports = MockPorts::default();
        ports
            .sos
            .expect_respond()
            .withf(|_, _, status| *status == SosStatus::Responded)
            .return_once(|_, _, _| {
                let mut request = active_request();
                request.status = SosStatus::Responded;
                Ok(request)
            });
        let app = sos_app!(ports);

        let req = actix_test::TestRequest::patch()
            .uri(&format!("/sos/{SOS_ID}/status"))
            .cookie(login_cookie(&user()).await)
            .set_json(json!({ "status": "RESPONDED" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "RESPONDED");
    }

    #[actix_web::test]
    async fn status_update_rejects_unknown_values() {
        let app = sos_app!(MockPorts::default());
        let req = actix_test::TestRequest::patch()
            .uri(&format!("/sos/{SOS_ID}/status"))
            .cookie(login_cookie(&user()).await)
            .set_json(json!({ "status": "PANIC" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn stranger_cancel_is_forbidden() {
        let mut ports = MockPorts::default();
        ports
            .sos
            .expect_cancel()
            .return_once(|_, _| Err(Error::forbidden("not yours")));
        let app = sos_app!(ports);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/sos/{SOS_ID}/cancel"))
            .cookie(login_cookie(&user()).await)
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
