//! Read port for the contribution projection.

use async_trait::async_trait;

use crate::domain::{ContributorStats, UserId};

use super::define_port_error;

define_port_error! {
    pub enum ContributorRepositoryError {
        Connection =>
            "contributor repository connection failed: {message}",
        Query =>
            "contributor repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContributorRepository: Send + Sync {
    /// Stats for `user_id`, or `None` when the user has never contributed.
    async fn find_stats(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ContributorStats>, ContributorRepositoryError>;

    /// Up to `limit` contributors, highest score first; ties go to more
    /// verified reports, then to the lower user id.
    async fn top_by_score(
        &self,
        limit: u32,
    ) -> Result<Vec<ContributorStats>, ContributorRepositoryError>;
}
