//! The caller's notification inbox.
//!
//! ```text
//! GET    /api/v1/notifications?page&limit&unreadOnly
//! GET    /api/v1/notifications/unread-count
//! PUT    /api/v1/notifications/read-all
//! PUT    /api/v1/notifications/{id}/read
//! DELETE /api/v1/notifications/{id}
//! ```

use actix_web::{delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::alerts::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_notification_id, parse_page};
use crate::inbound::payloads::{NotificationPayload, PaginationPayload};

const DEFAULT_INBOX_LIMIT: u32 = 20;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct InboxQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Only unread notifications when `true`.
    pub unread_only: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InboxResponse {
    pub notifications: Vec<NotificationPayload>,
    pub pagination: PaginationPayload,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(InboxQuery),
    responses(
        (status = 200, description = "Inbox page", body = InboxResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<InboxQuery>,
) -> ApiResult<web::Json<InboxResponse>> {
    let actor = session.require_actor()?;
    let InboxQuery {
        page,
        limit,
        unread_only,
    } = query.into_inner();
    let page = parse_page(page, limit, DEFAULT_INBOX_LIMIT)?;
    let inbox = state
        .notifications
        .list(actor.user_id(), unread_only.unwrap_or(false), page)
        .await?;
    Ok(web::Json(InboxResponse {
        pagination: PaginationPayload::from(&inbox),
        notifications: inbox.items.iter().map(NotificationPayload::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notifications", body = UnreadCountResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "unreadNotificationCount"
)]
#[get("/notifications/unread-count")]
pub async fn unread_count(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UnreadCountResponse>> {
    let actor = session.require_actor()?;
    let unread_count = state.notifications.unread_count(actor.user_id()).await?;
    Ok(web::Json(UnreadCountResponse { unread_count }))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Inbox marked read", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[put("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MessageResponse>> {
    let actor = session.require_actor()?;
    state.notifications.mark_all_read(actor.user_id()).await?;
    Ok(web::Json(MessageResponse::new(
        "All notifications marked as read",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationPayload),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not the caller's notification", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[put("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NotificationPayload>> {
    let actor = session.require_actor()?;
    let id = parse_notification_id(&path)?;
    let note = state.notifications.mark_read(actor.user_id(), &id).await?;
    Ok(web::Json(NotificationPayload::from(&note)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not the caller's notification", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "deleteNotification"
)]
#[delete("/notifications/{id}")]
pub async fn delete_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let actor = session.require_actor()?;
    let id = parse_notification_id(&path)?;
    state.notifications.delete(actor.user_id(), &id).await?;
    Ok(web::Json(MessageResponse::new("Notification deleted")))
}
