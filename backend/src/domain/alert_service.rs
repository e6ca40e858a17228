//! Alert lifecycle service implementing [`AlertCommand`] and [`AlertQuery`].
//!
//! Creation credits the reporter, removal penalises them, and every change
//! is announced through the [`AlertEventPublisher`] port.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::alert::{
    Alert, AlertEdit, AlertFilter, AlertRemoval, AlertReport, AlertStatus, DESCRIPTION_MAX,
    OFFLINE_BATCH_MAX, OfflineReport, check_length, sort_by_severity,
};
use crate::domain::events::{EventTopic, NearbyAlertNotice, RealtimeEvent};
use crate::domain::geo::{Coordinates, SearchRadius, nearest_within};
use crate::domain::pagination::{MAX_PAGE_LIMIT, Page, PageRequest};
use crate::domain::ports::{
    AlertCommand, AlertEventPublisher, AlertQuery, AlertRepository, AlertUpdate, AlertView,
    ContributorRepository, LeaderboardEntry, ListedAlert, NearbyAlert, OfflineSync,
    SkippedReport, VoteRepository,
};
use crate::domain::{
    Actor, AlertId, ContributionChange, ContributionPoints, ContributorStats, Error, UserId,
};

/// Service behind the alert HTTP routes.
pub struct AlertService<A, V, C> {
    alerts: Arc<A>,
    votes: Arc<V>,
    contributors: Arc<C>,
    publisher: Arc<dyn AlertEventPublisher>,
    clock: Arc<dyn Clock>,
    points: ContributionPoints,
}

impl<A, V, C> AlertService<A, V, C> {
    pub fn new(
        alerts: Arc<A>,
        votes: Arc<V>,
        contributors: Arc<C>,
        publisher: Arc<dyn AlertEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            votes,
            contributors,
            publisher,
            clock,
            points: ContributionPoints::default(),
        }
    }

    /// Override the contribution point table.
    pub fn with_points(mut self, points: ContributionPoints) -> Self {
        self.points = points;
        self
    }
}

impl<A, V, C> AlertService<A, V, C>
where
    A: AlertRepository,
    V: VoteRepository,
    C: ContributorRepository,
{
    async fn load(&self, id: &AlertId) -> Result<Alert, Error> {
        self.alerts
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("alert {id} not found")))
    }

    /// Load an alert the actor is allowed to change.
    async fn load_managed(&self, actor: &Actor, id: &AlertId) -> Result<Alert, Error> {
        let alert = self.load(id).await?;
        if !actor.may_manage(&alert.reporter_id) {
            return Err(Error::forbidden(
                "only the reporter or an admin may change this alert",
            ));
        }
        Ok(alert)
    }

    /// Remove `alert`, writing `edit` in the same repository call.
    async fn apply_removal(
        &self,
        alert: &Alert,
        reason: Option<String>,
        edit: AlertEdit,
    ) -> Result<Alert, Error> {
        if alert.status.is_terminal() {
            return Err(terminal_conflict(alert));
        }
        let removal = AlertRemoval {
            reason,
            removed_at: self.clock.utc(),
            edit,
        };
        let penalty = ContributionChange::removed(alert.reporter_id, &self.points);
        let removed = self
            .alerts
            .remove(&alert.id, &removal, &penalty)
            .await?
            .ok_or_else(|| Error::conflict(format!("alert {} is no longer open", alert.id)))?;

        info!(
            alert_id = %removed.id,
            reporter_id = %removed.reporter_id,
            "alert removed"
        );
        self.publisher.publish(
            EventTopic::Global,
            RealtimeEvent::AlertRemoved {
                id: removed.id,
                reason: removed.remove_reason.clone(),
            },
        );
        Ok(removed)
    }

    fn announce_new(&self, alert: &Alert) {
        let topic = EventTopic::at(alert.position);
        self.publisher
            .publish(topic, RealtimeEvent::NewAlert(alert.clone()));
        self.publisher.publish(
            topic,
            RealtimeEvent::NearbyAlert(NearbyAlertNotice::for_alert(alert)),
        );
    }
}

fn terminal_conflict(alert: &Alert) -> Error {
    Error::conflict(format!(
        "alert {} is {} and can no longer change",
        alert.id,
        alert.status.as_str()
    ))
}

#[async_trait]
impl<A, V, C> AlertCommand for AlertService<A, V, C>
where
    A: AlertRepository,
    V: VoteRepository,
    C: ContributorRepository,
{
    async fn report(&self, actor: &Actor, report: AlertReport) -> Result<Alert, Error> {
        report.details.validate()?;
        let alert = Alert::report(*actor.user_id(), report, self.clock.utc());
        let credit = ContributionChange::reported(alert.reporter_id, &self.points);
        self.alerts.insert_reported(&alert, &credit).await?;

        info!(
            alert_id = %alert.id,
            reporter_id = %alert.reporter_id,
            kind = alert.kind.as_str(),
            severity = alert.severity.as_str(),
            expires_at = %alert.expires_at,
            "alert reported"
        );
        self.announce_new(&alert);
        Ok(alert)
    }

    async fn update(
        &self,
        actor: &Actor,
        id: &AlertId,
        update: AlertUpdate,
    ) -> Result<Alert, Error> {
        let AlertUpdate { edit, status } = update;
        if edit.is_empty() && status.is_none() {
            return Err(Error::invalid_request(
                "provide severity, description, or status",
            ));
        }
        check_length("description", edit.description.as_deref(), DESCRIPTION_MAX)?;

        let mut alert = self.load_managed(actor, id).await?;
        if alert.status.is_terminal() {
            return Err(terminal_conflict(&alert));
        }
        if let Some(target) = status {
            if !alert.status.can_transition_to(target) {
                return Err(Error::conflict(format!(
                    "cannot move alert from {} to {}",
                    alert.status.as_str(),
                    target.as_str()
                )));
            }
            if target != AlertStatus::Removed {
                return Err(Error::conflict(format!(
                    "{} is set by the system, not by edits",
                    target.as_str()
                )));
            }
        }

        if status.is_some() {
            alert = self.apply_removal(&alert, None, edit).await?;
        } else {
            alert = self
                .alerts
                .apply_edit(id, &edit)
                .await?
                .ok_or_else(|| terminal_conflict(&alert))?;
        }

        self.publisher
            .publish(EventTopic::Global, RealtimeEvent::AlertUpdated(alert.tally()));
        Ok(alert)
    }

    async fn remove(
        &self,
        actor: &Actor,
        id: &AlertId,
        reason: Option<String>,
    ) -> Result<Alert, Error> {
        let alert = self.load_managed(actor, id).await?;
        self.apply_removal(&alert, reason, AlertEdit::default()).await
    }

    async fn sync_offline(
        &self,
        actor: &Actor,
        reports: Vec<OfflineReport>,
    ) -> Result<OfflineSync, Error> {
        if reports.is_empty() {
            return Err(Error::invalid_request("provide at least one offline alert"));
        }
        if reports.len() > OFFLINE_BATCH_MAX {
            return Err(Error::invalid_request(format!(
                "at most {OFFLINE_BATCH_MAX} offline alerts may be synced at once"
            )));
        }

        let now = self.clock.utc();
        let reporter = *actor.user_id();
        let mut sync = OfflineSync::default();
        for (index, offline) in reports.into_iter().enumerate() {
            if let Err(err) = offline.report.details.validate() {
                sync.skipped.push(SkippedReport {
                    index,
                    reason: err.into(),
                });
                continue;
            }
            let alert = Alert::from_offline(reporter, offline, now);
            if alert.expires_at <= now {
                sync.skipped.push(SkippedReport {
                    index,
                    reason: Error::invalid_request("alert expired before it was synced"),
                });
                continue;
            }
            sync.created.push(alert);
        }
        if sync.created.is_empty() {
            return Ok(sync);
        }

        let count = i32::try_from(sync.created.len()).unwrap_or(i32::MAX);
        let credit = ContributionChange::reported_many(reporter, count, &self.points);
        self.alerts
            .insert_reported_batch(&sync.created, &credit)
            .await?;

        info!(
            reporter_id = %reporter,
            created = sync.created.len(),
            skipped = sync.skipped.len(),
            "offline alerts synced"
        );
        for alert in &sync.created {
            self.announce_new(alert);
        }
        Ok(sync)
    }

    async fn delete(&self, actor: &Actor, id: &AlertId) -> Result<(), Error> {
        let alert = self.load_managed(actor, id).await?;
        if !self.alerts.delete(&alert.id).await? {
            return Err(Error::not_found(format!("alert {id} not found")));
        }
        info!(alert_id = %alert.id, user_id = %actor.user_id(), "alert deleted");
        self.publisher.publish(
            EventTopic::Global,
            RealtimeEvent::AlertRemoved {
                id: alert.id,
                reason: None,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl<A, V, C> AlertQuery for AlertService<A, V, C>
where
    A: AlertRepository,
    V: VoteRepository,
    C: ContributorRepository,
{
    async fn get(&self, viewer: Option<UserId>, id: &AlertId) -> Result<AlertView, Error> {
        let alert = self.load(id).await?;
        let caller_vote = match viewer {
            Some(user_id) => self
                .votes
                .find_vote(id, &user_id)
                .await?
                .map(|vote| vote.direction),
            None => None,
        };
        Ok(AlertView { alert, caller_vote })
    }

    async fn nearby(
        &self,
        centre: Coordinates,
        radius: SearchRadius,
    ) -> Result<Vec<NearbyAlert>, Error> {
        let live = self.alerts.list_live(self.clock.utc()).await?;
        Ok(nearest_within(live, centre, radius, |alert| alert.position)
            .into_iter()
            .map(|(alert, distance_metres)| NearbyAlert {
                alert,
                distance_metres,
            })
            .collect())
    }

    async fn list(
        &self,
        filter: AlertFilter,
        near: Option<(Coordinates, SearchRadius)>,
        page: PageRequest,
    ) -> Result<Page<ListedAlert>, Error> {
        let mut matching = self.alerts.list_matching(&filter, self.clock.utc()).await?;
        let listed: Vec<ListedAlert> = match near {
            Some((centre, radius)) => {
                nearest_within(matching, centre, radius, |alert| alert.position)
                    .into_iter()
                    .map(|(alert, distance)| ListedAlert {
                        alert,
                        distance_metres: Some(distance),
                    })
                    .collect()
            }
            None => {
                sort_by_severity(&mut matching);
                matching
                    .into_iter()
                    .map(|alert| ListedAlert {
                        alert,
                        distance_metres: None,
                    })
                    .collect()
            }
        };
        Ok(page.slice(listed))
    }

    async fn in_area(&self, filter: AlertFilter) -> Result<Vec<Alert>, Error> {
        if filter.area.is_none() && filter.road_name.is_none() {
            return Err(Error::invalid_request("provide area or roadName"));
        }
        let filter = AlertFilter {
            status: Some(AlertStatus::Active),
            ..filter
        };
        let mut matching = self.alerts.list_matching(&filter, self.clock.utc()).await?;
        matching.sort_by_key(|alert| std::cmp::Reverse(alert.created_at));
        Ok(matching)
    }

    async fn reported_by(
        &self,
        reporter: &UserId,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<Page<Alert>, Error> {
        Ok(self.alerts.list_by_reporter(reporter, status, page).await?)
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, Error> {
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        let top = self.contributors.top_by_score(limit).await?;
        Ok((1..)
            .zip(top)
            .map(|(rank, stats)| LeaderboardEntry { rank, stats })
            .collect())
    }

    async fn contribution(&self, user_id: &UserId) -> Result<ContributorStats, Error> {
        Ok(self
            .contributors
            .find_stats(user_id)
            .await?
            .unwrap_or_else(|| ContributorStats::empty(*user_id)))
    }
}

#[cfg(test)]
#[path = "alert_service_tests.rs"]
mod tests;
