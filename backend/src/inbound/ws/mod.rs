//! WebSocket inbound adapter: live alert, SOS and broadcast frames.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured Origin allow-list
//! - register the connection with the [`GridRouter`](crate::outbound::realtime::GridRouter)
//! - run the per-connection session task

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod origin;
pub mod state;

pub use origin::{AllowedOrigins, OriginRuleError};
pub use state::WsState;

/// Handle WebSocket upgrade for the `/ws` endpoint.
///
/// Anonymous connections are accepted; a signed-in caller's id is recorded
/// against the client for diagnostics.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    identity: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(origin_header, &state.allowed_origins)?;

    let user_id = identity.user_id().unwrap_or_else(|err| {
        warn!(error = %err, "Ignoring unreadable session on WebSocket upgrade");
        None
    });

    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;

    let (client, events) = state.router.connect(user_id);
    actix_web::rt::spawn(session::handle_ws_session(
        state.router.clone(),
        client,
        events,
        ws_session,
        messages,
    ));
    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue, allowed: &AllowedOrigins) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
