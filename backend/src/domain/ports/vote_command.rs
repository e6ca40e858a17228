//! Driving port for voting on alerts.

use async_trait::async_trait;

use crate::domain::alert::AlertTally;
use crate::domain::{AlertId, Error, UserId, VoteDirection};

/// Whether a user has voted on an alert, and which way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteStatus {
    pub has_voted: bool,
    pub direction: Option<VoteDirection>,
}

impl From<Option<VoteDirection>> for VoteStatus {
    fn from(direction: Option<VoteDirection>) -> Self {
        Self {
            has_voted: direction.is_some(),
            direction,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteCommand: Send + Sync {
    /// Cast or flip a vote, then run the verification check.
    async fn cast(
        &self,
        voter: &UserId,
        alert_id: &AlertId,
        direction: VoteDirection,
    ) -> Result<AlertTally, Error>;

    /// Withdraw an existing vote.
    async fn retract(&self, voter: &UserId, alert_id: &AlertId) -> Result<AlertTally, Error>;

    async fn status(&self, voter: &UserId, alert_id: &AlertId) -> Result<VoteStatus, Error>;
}
