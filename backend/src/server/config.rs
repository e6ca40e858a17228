//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use roadguard::domain::expiration::DEFAULT_SWEEP_PERIOD;
use roadguard::inbound::ws::AllowedOrigins;
use roadguard::outbound::persistence::DbPool;
use roadguard::outbound::realtime::FanoutMode;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) fanout: FanoutMode,
    pub(crate) allowed_origins: AllowedOrigins,
    pub(crate) sweep_period: Duration,
}

impl ServerConfig {
    /// Construct a configuration with the in-memory store, broadcast-all
    /// fan-out and localhost WebSocket origins.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            fanout: FanoutMode::default(),
            allowed_origins: AllowedOrigins::default(),
            sweep_period: DEFAULT_SWEEP_PERIOD,
        }
    }

    /// Attach a database connection pool; repositories switch to Diesel.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_fanout(mut self, fanout: FanoutMode) -> Self {
        self.fanout = fanout;
        self
    }

    #[must_use]
    pub fn with_allowed_origins(mut self, allowed_origins: AllowedOrigins) -> Self {
        self.allowed_origins = allowed_origins;
        self
    }

    #[must_use]
    pub fn with_sweep_period(mut self, period: Duration) -> Self {
        self.sweep_period = period;
        self
    }
}
