//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AlertCommand, AlertQuery, BroadcastCommand, NotificationInbox, SosCommand, VoteCommand,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub alerts: Arc<dyn AlertCommand>,
    pub alert_query: Arc<dyn AlertQuery>,
    pub votes: Arc<dyn VoteCommand>,
    pub sos: Arc<dyn SosCommand>,
    pub broadcast: Arc<dyn BroadcastCommand>,
    pub notifications: Arc<dyn NotificationInbox>,
}
