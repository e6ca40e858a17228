//! Alert HTTP handlers.
//!
//! ```text
//! POST   /api/v1/alerts
//! GET    /api/v1/alerts?type&severity&status&verified&area&roadName&latitude&longitude&radius&page&limit
//! GET    /api/v1/alerts/nearby?latitude&longitude&radius
//! GET    /api/v1/alerts/area?area&roadName
//! POST   /api/v1/alerts/offline
//! GET    /api/v1/alerts/{id}
//! PATCH  /api/v1/alerts/{id}
//! DELETE /api/v1/alerts/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::domain::alert::{
    AlertDetails, AlertEdit, AlertFilter, AlertReport, AlertStatus, OFFLINE_BATCH_MAX,
    OfflineReport,
};
use crate::domain::geo::{Coordinates, SearchRadius};
use crate::domain::ports::{
    AlertUpdate, AlertView, ListedAlert, NearbyAlert, OfflineSync, SkippedReport,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_alert_id, parse_alert_status, parse_alert_type, parse_coordinates,
    parse_page, parse_radius, parse_severity, parse_timestamp, require,
};
use crate::inbound::http::votes::vote_label;
use crate::inbound::payloads::{AlertPayload, PaginationPayload};

const DEFAULT_LIST_LIMIT: u32 = 50;

/// Request payload for reporting a hazard.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    #[serde(rename = "type")]
    #[schema(example = "POTHOLE")]
    pub kind: Option<String>,
    #[schema(example = "HIGH")]
    pub severity: Option<String>,
    #[schema(example = 23.8103)]
    pub latitude: Option<f64>,
    #[schema(example = 90.4125)]
    pub longitude: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub road_name: Option<String>,
    pub area: Option<String>,
}

fn parse_create_request(payload: CreateAlertRequest) -> Result<AlertReport, Error> {
    let kind = require(payload.kind, FieldName::new("type"))?;
    let severity = require(payload.severity, FieldName::new("severity"))?;
    Ok(AlertReport {
        kind: parse_alert_type(&kind)?,
        severity: parse_severity(&severity)?,
        position: parse_coordinates(payload.latitude, payload.longitude)?,
        details: AlertDetails {
            title: payload.title,
            description: payload.description,
            address: payload.address,
            road_name: payload.road_name,
            area: payload.area,
        },
    })
}

/// Partial update; at least one field must be present.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertRequest {
    pub severity: Option<String>,
    pub description: Option<String>,
    /// Only `REMOVED` is accepted.
    pub status: Option<String>,
}

fn parse_update_request(payload: UpdateAlertRequest) -> Result<AlertUpdate, Error> {
    Ok(AlertUpdate {
        edit: AlertEdit {
            severity: payload.severity.as_deref().map(parse_severity).transpose()?,
            description: payload.description,
        },
        status: payload.status.as_deref().map(parse_alert_status).transpose()?,
    })
}

/// Filters for the alert listing. Without coordinates the most severe alerts
/// come first; with them, only alerts inside `radius` are listed, nearest
/// first.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListAlertsQuery {
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub kind: Option<String>,
    pub severity: Option<String>,
    /// Defaults to `ACTIVE`.
    pub status: Option<String>,
    /// Only verified alerts when `true`.
    pub verified: Option<bool>,
    pub area: Option<String>,
    pub road_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Metres; defaults to 10 km when coordinates are given.
    pub radius: Option<f64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Blank text criteria are treated as absent.
fn text_criterion(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn parse_list_query(
    query: ListAlertsQuery,
) -> Result<(AlertFilter, Option<(Coordinates, SearchRadius)>), Error> {
    let filter = AlertFilter {
        kind: query.kind.as_deref().map(parse_alert_type).transpose()?,
        severity: query.severity.as_deref().map(parse_severity).transpose()?,
        status: Some(
            query
                .status
                .as_deref()
                .map(parse_alert_status)
                .transpose()?
                .unwrap_or(AlertStatus::Active),
        ),
        verified_only: query.verified.unwrap_or(false),
        area: text_criterion(query.area),
        road_name: text_criterion(query.road_name),
    };
    let near = match (query.latitude, query.longitude, query.radius) {
        (None, None, None) => None,
        (latitude, longitude, radius) => Some((
            parse_coordinates(latitude, longitude)?,
            parse_radius(radius, SearchRadius::MAP_VIEW)?,
        )),
    };
    Ok((filter, near))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListedAlertItem {
    #[serde(flatten)]
    pub alert: AlertPayload,
    /// Metres from the query centre; present when coordinates were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<ListedAlert> for ListedAlertItem {
    fn from(listed: ListedAlert) -> Self {
        Self {
            alert: AlertPayload::from(&listed.alert),
            distance: listed.distance_metres,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertListResponse {
    pub alerts: Vec<ListedAlertItem>,
    pub pagination: PaginationPayload,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct AreaQuery {
    /// Case-insensitive substring of the alert's area.
    pub area: Option<String>,
    /// Case-insensitive substring of the alert's road name.
    pub road_name: Option<String>,
}

/// One alert captured offline.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfflineAlertRequest {
    #[serde(flatten)]
    pub alert: CreateAlertRequest,
    /// RFC 3339 time the hazard was observed; the sync time when absent.
    #[schema(example = "2026-05-04T11:30:00Z")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct OfflineSyncRequest {
    pub alerts: Vec<OfflineAlertRequest>,
}

fn parse_offline_item(item: OfflineAlertRequest) -> Result<OfflineReport, Error> {
    let observed_at = item
        .timestamp
        .as_deref()
        .map(|raw| parse_timestamp(raw, FieldName::new("timestamp")))
        .transpose()?;
    Ok(OfflineReport {
        report: parse_create_request(item.alert)?,
        observed_at,
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SkippedAlertItem {
    /// Position in the submitted `alerts` array.
    pub index: usize,
    pub error: Error,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfflineSyncResponse {
    pub message: String,
    pub alerts: Vec<AlertPayload>,
    pub skipped: Vec<SkippedAlertItem>,
}

impl OfflineSyncResponse {
    fn new(sync: OfflineSync, submitted: usize) -> Self {
        Self {
            message: format!(
                "Processed {} of {submitted} offline alerts",
                sync.created.len()
            ),
            alerts: sync.created.iter().map(AlertPayload::from).collect(),
            skipped: sync
                .skipped
                .into_iter()
                .map(|skip| SkippedAlertItem {
                    index: skip.index,
                    error: skip.reason,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Metres.
    pub radius: Option<f64>,
}

/// An alert with the caller's own vote, if any.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetailResponse {
    #[serde(flatten)]
    pub alert: AlertPayload,
    /// `upvote`, `downvote`, or null.
    pub user_vote: Option<String>,
}

impl From<AlertView> for AlertDetailResponse {
    fn from(view: AlertView) -> Self {
        Self {
            alert: AlertPayload::from(&view.alert),
            user_vote: view.caller_vote.map(|direction| vote_label(direction).to_owned()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyAlertItem {
    #[serde(flatten)]
    pub alert: AlertPayload,
    /// Metres from the query centre.
    pub distance: f64,
}

impl From<NearbyAlert> for NearbyAlertItem {
    fn from(nearby: NearbyAlert) -> Self {
        Self {
            alert: AlertPayload::from(&nearby.alert),
            distance: nearby.distance_metres,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Report a new road hazard.
#[utoipa::path(
    post,
    path = "/api/v1/alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 201, description = "Alert created", body = AlertPayload),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "createAlert"
)]
#[post("/alerts")]
pub async fn create_alert(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateAlertRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor()?;
    let report = parse_create_request(payload.into_inner())?;
    let alert = state.alerts.report(&actor, report).await?;
    Ok(HttpResponse::Created().json(AlertPayload::from(&alert)))
}

/// Unexpired alerts matching the filters, one page at a time.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    params(ListAlertsQuery),
    responses(
        (status = 200, description = "Matching alerts", body = AlertListResponse),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["alerts"],
    security([]),
    operation_id = "listAlerts"
)]
#[get("/alerts")]
pub async fn list_alerts(
    state: web::Data<HttpState>,
    query: web::Query<ListAlertsQuery>,
) -> ApiResult<web::Json<AlertListResponse>> {
    let query = query.into_inner();
    let page = parse_page(query.page, query.limit, DEFAULT_LIST_LIMIT)?;
    let (filter, near) = parse_list_query(query)?;
    let listed = state.alert_query.list(filter, near, page).await?;
    Ok(web::Json(AlertListResponse {
        pagination: PaginationPayload::from(&listed),
        alerts: listed.items.into_iter().map(ListedAlertItem::from).collect(),
    }))
}

/// Active alerts whose area or road name contains the given text.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/area",
    params(AreaQuery),
    responses(
        (status = 200, description = "Alerts in the area", body = [AlertPayload]),
        (status = 400, description = "Neither area nor roadName given", body = Error)
    ),
    tags = ["alerts"],
    security([]),
    operation_id = "alertsInArea"
)]
#[get("/alerts/area")]
pub async fn alerts_in_area(
    state: web::Data<HttpState>,
    query: web::Query<AreaQuery>,
) -> ApiResult<web::Json<Vec<AlertPayload>>> {
    let AreaQuery { area, road_name } = query.into_inner();
    let filter = AlertFilter {
        area: text_criterion(area),
        road_name: text_criterion(road_name),
        ..AlertFilter::default()
    };
    let alerts = state.alert_query.in_area(filter).await?;
    Ok(web::Json(alerts.iter().map(AlertPayload::from).collect()))
}

/// Store alerts captured while offline. Items that fail validation are
/// skipped and reported by index; the rest are stored together.
#[utoipa::path(
    post,
    path = "/api/v1/alerts/offline",
    request_body = OfflineSyncRequest,
    responses(
        (status = 200, description = "Sync outcome", body = OfflineSyncResponse),
        (status = 400, description = "Empty or oversized batch", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "syncOfflineAlerts"
)]
#[post("/alerts/offline")]
pub async fn sync_offline_alerts(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OfflineSyncRequest>,
) -> ApiResult<web::Json<OfflineSyncResponse>> {
    let actor = session.require_actor()?;
    let OfflineSyncRequest { alerts } = payload.into_inner();
    let submitted = alerts.len();
    if submitted == 0 || submitted > OFFLINE_BATCH_MAX {
        return Err(Error::invalid_request(format!(
            "alerts must hold between 1 and {OFFLINE_BATCH_MAX} items"
        )));
    }

    let mut positions = Vec::with_capacity(submitted);
    let mut reports = Vec::with_capacity(submitted);
    let mut rejected = Vec::new();
    for (index, item) in alerts.into_iter().enumerate() {
        match parse_offline_item(item) {
            Ok(report) => {
                positions.push(index);
                reports.push(report);
            }
            Err(reason) => rejected.push(SkippedReport { index, reason }),
        }
    }

    let mut sync = if reports.is_empty() {
        OfflineSync::default()
    } else {
        state.alerts.sync_offline(&actor, reports).await?
    };
    for skip in &mut sync.skipped {
        skip.index = positions.get(skip.index).copied().unwrap_or(skip.index);
    }
    sync.skipped.extend(rejected);
    sync.skipped.sort_by_key(|skip| skip.index);
    Ok(web::Json(OfflineSyncResponse::new(sync, submitted)))
}

/// Live alerts around a point, nearest first.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Nearby alerts", body = [NearbyAlertItem]),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["alerts"],
    security([]),
    operation_id = "nearbyAlerts"
)]
#[get("/alerts/nearby")]
pub async fn nearby_alerts(
    state: web::Data<HttpState>,
    query: web::Query<NearbyQuery>,
) -> ApiResult<web::Json<Vec<NearbyAlertItem>>> {
    let NearbyQuery {
        latitude,
        longitude,
        radius,
    } = query.into_inner();
    let centre = parse_coordinates(latitude, longitude)?;
    let radius = parse_radius(radius, SearchRadius::NOTIFICATION)?;
    let alerts = state.alert_query.nearby(centre, radius).await?;
    Ok(web::Json(alerts.into_iter().map(NearbyAlertItem::from).collect()))
}

/// Read one alert; signed-in callers also see their own vote.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert", body = AlertDetailResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["alerts"],
    security([]),
    operation_id = "getAlert"
)]
#[get("/alerts/{id}")]
pub async fn get_alert(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<AlertDetailResponse>> {
    let id = parse_alert_id(&path)?;
    let viewer = session.user_id()?;
    let view = state.alert_query.get(viewer, &id).await?;
    Ok(web::Json(AlertDetailResponse::from(view)))
}

/// Edit severity or description, or remove via `status: REMOVED`.
#[utoipa::path(
    patch,
    path = "/api/v1/alerts/{id}",
    params(("id" = String, Path, description = "Alert id")),
    request_body = UpdateAlertRequest,
    responses(
        (status = 200, description = "Updated alert", body = AlertPayload),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the reporter", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Illegal transition", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "updateAlert"
)]
#[patch("/alerts/{id}")]
pub async fn update_alert(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateAlertRequest>,
) -> ApiResult<web::Json<AlertPayload>> {
    let actor = session.require_actor()?;
    let id = parse_alert_id(&path)?;
    let update = parse_update_request(payload.into_inner())?;
    let alert = state.alerts.update(&actor, &id, update).await?;
    Ok(web::Json(AlertPayload::from(&alert)))
}

/// Delete an alert outright. Reporter or admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/alerts/{id}",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert deleted", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the reporter", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "deleteAlert"
)]
#[delete("/alerts/{id}")]
pub async fn delete_alert(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let actor = session.require_actor()?;
    let id = parse_alert_id(&path)?;
    state.alerts.delete(&actor, &id).await?;
    Ok(web::Json(MessageResponse::new("Alert deleted successfully")))
}

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;
