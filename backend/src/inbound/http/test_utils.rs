//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, HttpResponse, test, web};

use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::{
    MockAlertCommand, MockAlertQuery, MockBroadcastCommand, MockNotificationInbox, MockSosCommand,
    MockVoteCommand,
};
use crate::domain::{Actor, Error, UserId};

pub const USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const ADMIN_ID: &str = "9b2d5c1e-8a44-4f0c-9d7e-2f6a1b3c4d5e";
pub const ALERT_ID: &str = "0f5b3c2a-1d4e-4a6b-8c9d-7e1f2a3b4c5d";
pub const SOS_ID: &str = "6c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f";

/// Fixed signing key so cookies minted by [`login_cookie`] verify in any
/// test app.
fn test_key() -> Key {
    Key::from(&[7_u8; 64])
}

/// Build a session middleware configured for tests.
///
/// The cookie is named `session` and the `Secure` flag is off for local
/// HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), test_key())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

pub fn user() -> Actor {
    Actor::user(UserId::new(USER_ID).expect("fixture id"))
}

pub fn admin() -> Actor {
    Actor::admin(UserId::new(ADMIN_ID).expect("fixture id"))
}

/// Mint a session cookie carrying `actor`.
pub async fn login_cookie(actor: &Actor) -> Cookie<'static> {
    let actor = *actor;
    let app = test::init_service(App::new().wrap(test_session_middleware()).route(
        "/login",
        web::post().to(move |session: SessionContext| async move {
            session.persist_actor(&actor)?;
            Ok::<_, Error>(HttpResponse::NoContent().finish())
        }),
    ))
    .await;
    let res = test::call_service(&app, test::TestRequest::post().uri("/login").to_request()).await;
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Mocks for every driving port; tests set expectations on the ones they use.
#[derive(Default)]
pub struct MockPorts {
    pub alerts: MockAlertCommand,
    pub alert_query: MockAlertQuery,
    pub votes: MockVoteCommand,
    pub sos: MockSosCommand,
    pub broadcast: MockBroadcastCommand,
    pub notifications: MockNotificationInbox,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            alerts: Arc::new(self.alerts),
            alert_query: Arc::new(self.alert_query),
            votes: Arc::new(self.votes),
            sos: Arc::new(self.sos),
            broadcast: Arc::new(self.broadcast),
            notifications: Arc::new(self.notifications),
        })
    }
}
