//! Vote HTTP handlers.
//!
//! ```text
//! POST   /api/v1/alerts/{id}/vote
//! DELETE /api/v1/alerts/{id}/vote
//! GET    /api/v1/alerts/{id}/vote/status
//! ```

use actix_web::{delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::alert::AlertTally;
use crate::domain::ports::VoteStatus;
use crate::domain::{Error, VoteDirection};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_alert_id, require};
use crate::inbound::payloads::AlertTallyPayload;

pub(crate) fn vote_label(direction: VoteDirection) -> &'static str {
    match direction {
        VoteDirection::Up => "upvote",
        VoteDirection::Down => "downvote",
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub is_upvote: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub message: String,
    pub alert: AlertTallyPayload,
}

impl VoteResponse {
    fn new(message: &str, tally: AlertTally) -> Self {
        Self {
            message: message.to_owned(),
            alert: AlertTallyPayload::from(tally),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusResponse {
    pub has_voted: bool,
    /// `upvote`, `downvote`, or null.
    pub vote_type: Option<String>,
}

impl From<VoteStatus> for VoteStatusResponse {
    fn from(status: VoteStatus) -> Self {
        Self {
            has_voted: status.has_voted,
            vote_type: status.direction.map(|direction| vote_label(direction).to_owned()),
        }
    }
}

/// Cast or flip a vote on someone else's alert.
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/vote",
    params(("id" = String, Path, description = "Alert id")),
    request_body = CastVoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Own alert", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Duplicate vote or closed alert", body = Error)
    ),
    tags = ["votes"],
    operation_id = "castVote"
)]
#[post("/alerts/{id}/vote")]
pub async fn cast_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CastVoteRequest>,
) -> ApiResult<web::Json<VoteResponse>> {
    let actor = session.require_actor()?;
    let id = parse_alert_id(&path)?;
    let is_upvote = require(payload.into_inner().is_upvote, FieldName::new("isUpvote"))?;
    let direction = VoteDirection::from_upvote(is_upvote);
    let tally = state.votes.cast(actor.user_id(), &id, direction).await?;
    let message = if is_upvote {
        "Upvoted successfully"
    } else {
        "Downvoted successfully"
    };
    Ok(web::Json(VoteResponse::new(message, tally)))
}

/// Withdraw the caller's vote.
#[utoipa::path(
    delete,
    path = "/api/v1/alerts/{id}/vote",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Vote removed", body = VoteResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No vote to remove", body = Error)
    ),
    tags = ["votes"],
    operation_id = "removeVote"
)]
#[delete("/alerts/{id}/vote")]
pub async fn remove_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<VoteResponse>> {
    let actor = session.require_actor()?;
    let id = parse_alert_id(&path)?;
    let tally = state.votes.retract(actor.user_id(), &id).await?;
    Ok(web::Json(VoteResponse::new("Vote removed", tally)))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}/vote/status",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Caller's vote", body = VoteStatusResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["votes"],
    operation_id = "voteStatus"
)]
#[get("/alerts/{id}/vote/status")]
pub async fn vote_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<VoteStatusResponse>> {
    let actor = session.require_actor()?;
    let id = parse_alert_id(&path)?;
    let status = state.votes.status(actor.user_id(), &id).await?;
    Ok(web::Json(VoteStatusResponse::from(status)))
}
