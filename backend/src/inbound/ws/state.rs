//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::inbound::ws::origin::AllowedOrigins;
use crate::outbound::realtime::GridRouter;

/// Dependency bundle for the `/ws` upgrade handler and its sessions.
#[derive(Clone)]
pub struct WsState {
    pub router: Arc<GridRouter>,
    pub allowed_origins: Arc<AllowedOrigins>,
}

impl WsState {
    pub fn new(router: Arc<GridRouter>, allowed_origins: AllowedOrigins) -> Self {
        Self {
            router,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
