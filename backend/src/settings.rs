//! Process configuration loaded via OrthoConfig.
//!
//! Values merge from CLI flags, `ROADGUARD_*` environment variables and an
//! optional configuration file. Unset values fall back to the defaults
//! returned by the accessors below.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::expiration::DEFAULT_SWEEP_PERIOD;
use crate::outbound::realtime::FanoutMode;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:*";

/// Runtime settings for the RoadGuard backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROADGUARD")]
pub struct RoadGuardSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL; without one the in-memory store is used.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Seconds between expiration sweeps.
    pub expiry_sweep_secs: Option<u64>,
    /// Route cell events only to subscribed clients.
    #[ortho_config(default = false)]
    pub geo_filtered_fanout: bool,
    /// File holding the session signing key.
    pub session_key_file: Option<PathBuf>,
    /// Permit a generated session key when the key file is missing.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Mark the session cookie `Secure`; on unless set to `false`.
    pub cookie_secure: Option<bool>,
    /// WebSocket Origin allow-list. The environment variable takes a
    /// comma-separated list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_origins: Option<Vec<String>>,
}

/// A list setting supplied either as a single string or as a sequence.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        OneOrMany::One(entry) => vec![entry],
        OneOrMany::Many(entries) => entries,
    }))
}

impl RoadGuardSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn expiry_sweep_period(&self) -> Duration {
        self.expiry_sweep_secs
            .map_or(DEFAULT_SWEEP_PERIOD, Duration::from_secs)
    }

    pub fn fanout_mode(&self) -> FanoutMode {
        if self.geo_filtered_fanout {
            FanoutMode::GeoFiltered
        } else {
            FanoutMode::BroadcastAll
        }
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    /// Allow-list entries, trimmed, with blanks dropped. Entries that still
    /// hold commas are split as well.
    pub fn allowed_origins(&self) -> Vec<String> {
        let Some(entries) = self.allowed_origins.as_ref() else {
            return vec![DEFAULT_ALLOWED_ORIGINS.to_owned()];
        };
        entries
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
