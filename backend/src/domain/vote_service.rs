//! Voting engine: vote bookkeeping plus the one-shot verification check.
//!
//! Vote writes and verification are separate transactions. The verification
//! write is guarded on `is_verified = false`, so concurrent qualifying votes
//! still reward the reporter exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::alert::{Alert, AlertTally};
use crate::domain::events::{EventTopic, RealtimeEvent};
use crate::domain::ports::{
    AlertEventPublisher, AlertRepository, VoteCommand, VoteRepository, VoteStatus,
};
use crate::domain::{
    AlertId, ContributionChange, ContributionPoints, Error, UserId, VerificationThreshold,
    VoteChange, VoteDirection,
};

pub struct VoteService<A, V> {
    alerts: Arc<A>,
    votes: Arc<V>,
    publisher: Arc<dyn AlertEventPublisher>,
    clock: Arc<dyn Clock>,
    points: ContributionPoints,
    threshold: VerificationThreshold,
}

impl<A, V> VoteService<A, V> {
    pub fn new(
        alerts: Arc<A>,
        votes: Arc<V>,
        publisher: Arc<dyn AlertEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            votes,
            publisher,
            clock,
            points: ContributionPoints::default(),
            threshold: VerificationThreshold::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: VerificationThreshold) -> Self {
        self.threshold = threshold;
        self
    }
}

impl<A, V> VoteService<A, V>
where
    A: AlertRepository,
    V: VoteRepository,
{
    async fn load(&self, id: &AlertId) -> Result<Alert, Error> {
        self.alerts
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("alert {id} not found")))
    }

    /// Verify the alert if the new tally crosses the threshold.
    ///
    /// Returns the tally to report back, reflecting the verification when it
    /// happened here.
    async fn verify_if_due(&self, alert: &Alert, tally: AlertTally) -> Result<AlertTally, Error> {
        if tally.is_verified
            || tally.status.is_terminal()
            || !self.threshold.is_met(tally.upvotes, tally.downvotes)
        {
            return Ok(tally);
        }

        let reward = ContributionChange::verified(alert.reporter_id, &self.points);
        let Some(verified) = self
            .alerts
            .mark_verified(&tally.id, self.clock.utc(), &reward)
            .await?
        else {
            debug!(alert_id = %tally.id, "alert already verified by a concurrent vote");
            return Ok(tally);
        };

        info!(
            alert_id = %verified.id,
            reporter_id = %verified.reporter_id,
            upvotes = verified.upvotes,
            downvotes = verified.downvotes,
            "alert verified"
        );
        let verified_tally = verified.tally();
        self.publisher.publish(
            EventTopic::at(verified.position),
            RealtimeEvent::AlertVerified(verified),
        );
        Ok(verified_tally)
    }
}

#[async_trait]
impl<A, V> VoteCommand for VoteService<A, V>
where
    A: AlertRepository,
    V: VoteRepository,
{
    async fn cast(
        &self,
        voter: &UserId,
        alert_id: &AlertId,
        direction: VoteDirection,
    ) -> Result<AlertTally, Error> {
        let alert = self.load(alert_id).await?;
        if &alert.reporter_id == voter {
            return Err(Error::forbidden("you cannot vote on your own alert"));
        }
        if alert.status.is_terminal() {
            return Err(Error::conflict(format!(
                "alert {alert_id} is {} and no longer accepts votes",
                alert.status.as_str()
            )));
        }

        let change = match self.votes.find_vote(alert_id, voter).await? {
            None => VoteChange::Cast {
                direction,
                voter_bonus: self.points.vote_cast,
            },
            Some(existing) if existing.direction == direction => {
                return Err(Error::conflict("you have already voted this way"));
            }
            Some(_) => VoteChange::Flip { to: direction },
        };

        let tally = self.votes.apply(alert_id, voter, change).await?;
        debug!(
            alert_id = %alert_id,
            user_id = %voter,
            upvotes = tally.upvotes,
            downvotes = tally.downvotes,
            "vote recorded"
        );
        let tally = self.verify_if_due(&alert, tally).await?;
        self.publisher
            .publish(EventTopic::Global, RealtimeEvent::AlertUpdated(tally));
        Ok(tally)
    }

    async fn retract(&self, voter: &UserId, alert_id: &AlertId) -> Result<AlertTally, Error> {
        self.load(alert_id).await?;
        let existing = self
            .votes
            .find_vote(alert_id, voter)
            .await?
            .ok_or_else(|| Error::not_found("you have not voted on this alert"))?;

        // Retraction keeps the voter's cast bonus.
        let tally = self
            .votes
            .apply(
                alert_id,
                voter,
                VoteChange::Retract {
                    direction: existing.direction,
                },
            )
            .await?;
        self.publisher
            .publish(EventTopic::Global, RealtimeEvent::AlertUpdated(tally));
        Ok(tally)
    }

    async fn status(&self, voter: &UserId, alert_id: &AlertId) -> Result<VoteStatus, Error> {
        let vote = self.votes.find_vote(alert_id, voter).await?;
        Ok(VoteStatus::from(vote.map(|vote| vote.direction)))
    }
}

#[cfg(test)]
#[path = "vote_service_tests.rs"]
mod tests;
