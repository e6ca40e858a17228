//! Port for SOS request persistence.

use async_trait::async_trait;

use crate::domain::sos::{SosRequest, SosStatus};
use crate::domain::{SosId, UserId};

use super::define_port_error;

define_port_error! {
    pub enum SosRepositoryError {
        Connection =>
            "sos repository connection failed: {message}",
        Query =>
            "sos repository query failed: {message}",
        /// The user already holds an `ACTIVE` request.
        Conflict =>
            "sos request conflict: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SosRepository: Send + Sync {
    /// Insert a new `ACTIVE` request; conflicts when the user already has one.
    async fn insert(&self, request: &SosRequest) -> Result<(), SosRepositoryError>;

    async fn find_by_id(&self, id: &SosId) -> Result<Option<SosRequest>, SosRepositoryError>;

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SosRequest>, SosRepositoryError>;

    async fn list_active(&self) -> Result<Vec<SosRequest>, SosRepositoryError>;

    /// Persist the status and timestamps of `request` if its stored status is
    /// still `expected`. Returns whether the row was updated.
    async fn save_transition(
        &self,
        request: &SosRequest,
        expected: SosStatus,
    ) -> Result<bool, SosRepositoryError>;
}
