//! Driving port for admin broadcasts.

use async_trait::async_trait;

use crate::domain::events::BroadcastNotice;
use crate::domain::{Actor, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BroadcastCommand: Send + Sync {
    /// Push `notice` to every connected client. Admins only.
    async fn broadcast(&self, actor: &Actor, notice: BroadcastNotice) -> Result<(), Error>;
}
