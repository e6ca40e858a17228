//! Admin HTTP handlers.
//!
//! ```text
//! POST /api/v1/admin/alerts/{id}/remove
//! POST /api/v1/admin/broadcast
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::events::{BroadcastNotice, DEFAULT_BROADCAST_KIND};
use crate::domain::{Actor, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::alerts::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_alert_id, require};

fn require_admin(session: &SessionContext) -> Result<Actor, Error> {
    let actor = session.require_actor()?;
    if !actor.is_admin() {
        return Err(Error::forbidden("admin access required"));
    }
    Ok(actor)
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RemoveAlertRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct BroadcastRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    /// Defaults to `EMERGENCY_BROADCAST`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn parse_broadcast_request(payload: BroadcastRequest) -> Result<BroadcastNotice, Error> {
    Ok(BroadcastNotice {
        title: require(payload.title, FieldName::new("title"))?,
        message: require(payload.message, FieldName::new("message"))?,
        kind: payload
            .kind
            .unwrap_or_else(|| DEFAULT_BROADCAST_KIND.to_owned()),
    })
}

/// Moderator removal with an optional reason.
#[utoipa::path(
    post,
    path = "/api/v1/admin/alerts/{id}/remove",
    params(("id" = String, Path, description = "Alert id")),
    request_body = RemoveAlertRequest,
    responses(
        (status = 200, description = "Alert removed", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Alert already closed", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminRemoveAlert"
)]
#[post("/admin/alerts/{id}/remove")]
pub async fn remove_alert(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: Option<web::Json<RemoveAlertRequest>>,
) -> ApiResult<web::Json<MessageResponse>> {
    let actor = require_admin(&session)?;
    let id = parse_alert_id(&path)?;
    let reason = payload.and_then(|body| body.into_inner().reason);
    state.alerts.remove(&actor, &id, reason).await?;
    Ok(web::Json(MessageResponse::new("Alert removed successfully")))
}

/// Push a message to every connected client.
#[utoipa::path(
    post,
    path = "/api/v1/admin/broadcast",
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Broadcast sent", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminBroadcast"
)]
#[post("/admin/broadcast")]
pub async fn broadcast(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BroadcastRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let actor = require_admin(&session)?;
    let notice = parse_broadcast_request(payload.into_inner())?;
    state.broadcast.broadcast(&actor, notice).await?;
    Ok(web::Json(MessageResponse::new("Broadcast sent successfully")))
}
