//! Port for vote persistence.

use async_trait::async_trait;

use crate::domain::alert::AlertTally;
use crate::domain::{AlertId, UserId, Vote, VoteChange};

use super::define_port_error;

define_port_error! {
    /// Errors raised by vote repository adapters.
    pub enum VoteRepositoryError {
        Connection =>
            "vote repository connection failed: {message}",
        Query =>
            "vote repository query failed: {message}",
        /// A concurrent request changed the vote first (duplicate insert,
        /// stale flip or retract).
        Conflict =>
            "vote changed concurrently: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn find_vote(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
    ) -> Result<Option<Vote>, VoteRepositoryError>;

    /// Apply `change` to the vote row, the alert counters and (for a first
    /// cast) the voter's score in one transaction, returning the new tally.
    async fn apply(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
        change: VoteChange,
    ) -> Result<AlertTally, VoteRepositoryError>;
}
