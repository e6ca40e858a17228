//! RoadGuard backend entry-point: loads settings, wires the REST API,
//! WebSocket entry and expiration scheduler, then serves until shutdown.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use roadguard::inbound::http::health::HealthState;
use roadguard::inbound::http::session_config::{
    BuildMode, SessionInputs, key_fingerprint, session_settings,
};
use roadguard::inbound::ws::AllowedOrigins;
use roadguard::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use roadguard::settings::RoadGuardSettings;

use server::{RunningServer, ServerConfig, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = RoadGuardSettings::load().wrap_err("failed to load configuration")?;

    let session = session_settings(
        &SessionInputs {
            key_file: settings.session_key_file(),
            allow_ephemeral: settings.session_allow_ephemeral,
            cookie_secure: settings.cookie_secure(),
        },
        BuildMode::from_debug_assertions(),
    )?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );

    let allowed_origins = AllowedOrigins::parse(settings.allowed_origins())?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.bind_addr(),
    )
    .with_fanout(settings.fanout_mode())
    .with_allowed_origins(allowed_origins)
    .with_sweep_period(settings.expiry_sweep_period());

    if let Some(database_url) = settings.database_url.as_deref() {
        run_pending_migrations(database_url).await?;
        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.pool_max_size()),
        )
        .await
        .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
        info!("using PostgreSQL persistence");
    } else {
        warn!("no database configured; alerts are kept in memory");
    }

    let health_state = web::Data::new(HealthState::new());
    let RunningServer { server, expiration } =
        create_server(health_state.clone(), config).wrap_err("failed to start HTTP server")?;
    info!(addr = %settings.bind_addr(), "RoadGuard backend listening");

    let outcome = server.await;
    health_state.mark_unhealthy();
    expiration.shutdown().await;
    outcome.wrap_err("HTTP server terminated with an error")
}
