//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_domain_ports;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use roadguard::Trace;
#[cfg(debug_assertions)]
use roadguard::doc::ApiDoc;
use roadguard::domain::expiration::{ExpirationHandle, spawn_expiration_scheduler};
use roadguard::inbound::http::configure_api;
use roadguard::inbound::http::health::{HealthState, live, ready};
use roadguard::inbound::http::state::HttpState;
use roadguard::inbound::ws;
use roadguard::inbound::ws::WsState;
use roadguard::outbound::realtime::GridRouter;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

const SESSION_TTL: actix_web::cookie::time::Duration =
    actix_web::cookie::time::Duration::hours(2);

/// Private cookie sessions written by the auth service: `user_id` and `role`
/// live for two hours.
fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(SESSION_TTL))
        .build()
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    // The session wraps `/ws` too so upgrades can read the caller's identity.
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(session_middleware(key, cookie_secure, same_site))
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// A bound server plus the background sweep it owns.
pub struct RunningServer {
    pub server: Server,
    pub expiration: ExpirationHandle,
}

/// Construct the Actix HTTP server and start the expiration scheduler.
///
/// Must be called inside a Tokio runtime. Readiness is flipped once the
/// listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<RunningServer> {
    let server_health_state = health_state.clone();
    let router = Arc::new(GridRouter::new(config.fanout));
    let ports = build_domain_ports(&config, router.clone());
    let http_state = web::Data::new(ports.http);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        db_pool: _,
        fanout: _,
        allowed_origins,
        sweep_period,
    } = config;
    let ws_state = web::Data::new(WsState::new(router, allowed_origins));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    let expiration = spawn_expiration_scheduler(ports.sweeper, sweep_period);
    health_state.mark_ready();
    Ok(RunningServer { server, expiration })
}
