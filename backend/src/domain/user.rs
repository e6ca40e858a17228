//! Who is acting: the authenticated user and their role.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Account role carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse the stored role name; anything unrecognised is a plain user.
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "ADMIN" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// The authenticated caller of a command.
///
/// # Examples
/// ```
/// use roadguard::domain::{Actor, Role, UserId};
///
/// let owner = UserId::random();
/// let actor = Actor::new(owner, Role::User);
/// assert!(actor.may_manage(&owner));
/// assert!(!actor.may_manage(&UserId::random()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, Role::User)
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Admins manage everything; users manage what they own.
    pub fn may_manage(&self, owner: &UserId) -> bool {
        self.is_admin() || &self.user_id == owner
    }
}
