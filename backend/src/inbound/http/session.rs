//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The external auth service writes `user_id` and `role` into the cookie
//! session; handlers only ever see an [`Actor`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Actor, Error, Role, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ROLE_KEY: &str = "role";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the caller's identity in the session cookie.
    pub fn persist_actor(&self, actor: &Actor) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, actor.user_id().to_string())
            .and_then(|()| self.0.insert(ROLE_KEY, actor.role().as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    fn read(&self, key: &str) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// The caller's identity, if the session carries a well-formed user id.
    ///
    /// A missing or unknown role reads as `USER`.
    pub fn actor(&self) -> Result<Option<Actor>, Error> {
        let Some(raw) = self.read(USER_ID_KEY)? else {
            return Ok(None);
        };
        let user_id = match UserId::new(&raw) {
            Ok(id) => id,
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                return Ok(None);
            }
        };
        let role = self
            .read(ROLE_KEY)?
            .map_or(Role::User, |raw| Role::from_stored(&raw));
        Ok(Some(Actor::new(user_id, role)))
    }

    /// Require an authenticated caller or return `401 Unauthorized`.
    pub fn require_actor(&self) -> Result<Actor, Error> {
        self.actor()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        Ok(self.actor()?.map(|actor| *actor.user_id()))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
