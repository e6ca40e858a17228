//! Driving port for SOS requests.

use async_trait::async_trait;

use crate::domain::geo::{Coordinates, SearchRadius};
use crate::domain::sos::{SosDraft, SosRequest, SosStatus};
use crate::domain::{Actor, Error, SosId, UserId};

/// An active SOS request paired with its distance from the query centre.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbySos {
    pub request: SosRequest,
    pub distance_metres: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SosCommand: Send + Sync {
    /// Raise a request; a user may hold only one `ACTIVE` request.
    async fn raise(&self, actor: &Actor, draft: SosDraft) -> Result<SosRequest, Error>;

    async fn active_for(&self, user_id: &UserId) -> Result<Option<SosRequest>, Error>;

    async fn nearby(
        &self,
        centre: Coordinates,
        radius: SearchRadius,
    ) -> Result<Vec<NearbySos>, Error>;

    /// Responder update to `RESPONDED` or `RESOLVED`.
    async fn respond(
        &self,
        actor: &Actor,
        id: &SosId,
        status: SosStatus,
    ) -> Result<SosRequest, Error>;

    /// Owner or admin cancellation.
    async fn cancel(&self, actor: &Actor, id: &SosId) -> Result<SosRequest, Error>;
}
