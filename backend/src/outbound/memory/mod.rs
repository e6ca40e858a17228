//! Process-local store implementing every repository port.
//!
//! All state sits behind one mutex, so each multi-record mutation (alert plus
//! reporter counters, vote plus alert counters) is atomic in the same way a
//! database transaction is. Level promotions write their inbox notification
//! under the same lock. Used when no database is configured and by the
//! behaviour tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::alert::{
    Alert, AlertEdit, AlertFilter, AlertRemoval, AlertStatus, AlertTally,
};
use crate::domain::notification::{Notification, NotificationTemplate};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{
    AlertRepository, AlertRepositoryError, ContributorRepository, ContributorRepositoryError,
    NotificationRepository, NotificationRepositoryError, SosRepository, SosRepositoryError,
    VoteRepository, VoteRepositoryError,
};
use crate::domain::sos::{SosRequest, SosStatus};
use crate::domain::{
    AlertId, ContributionChange, ContributorStats, NotificationId, SosId, UserId, Vote,
    VoteChange, VoteDirection,
};

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Default)]
struct StoreState {
    alerts: HashMap<AlertId, Alert>,
    votes: HashMap<(AlertId, UserId), VoteDirection>,
    contributors: HashMap<UserId, ContributorStats>,
    notifications: HashMap<NotificationId, Notification>,
    sos: HashMap<SosId, SosRequest>,
}

impl StoreState {
    fn credit(&mut self, change: &ContributionChange) {
        let promoted = self
            .contributors
            .entry(change.user_id)
            .or_insert_with(|| ContributorStats::empty(change.user_id))
            .apply(change);
        if let Some(level) = promoted {
            let note = Notification::level_up(change.user_id, level, Utc::now());
            self.notifications.insert(note.id, note);
        }
    }

    fn owned_notification(
        &mut self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Option<&mut Notification> {
        self.notifications
            .get_mut(id)
            .filter(|note| &note.user_id == user_id)
    }
}

/// In-memory implementation of the alert, vote, contributor and SOS ports.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, &'static str> {
        self.state.lock().map_err(|_| POISONED)
    }

    /// Number of stored votes on `alert_id`, for consistency checks.
    pub fn vote_rows(&self, alert_id: &AlertId) -> Result<(u32, u32), &'static str> {
        let state = self.lock()?;
        let (mut up, mut down) = (0, 0);
        for ((alert, _), direction) in &state.votes {
            if alert == alert_id {
                match direction {
                    VoteDirection::Up => up += 1,
                    VoteDirection::Down => down += 1,
                }
            }
        }
        Ok((up, down))
    }
}

fn shift(counter: u32, delta: i32) -> u32 {
    counter.saturating_add_signed(delta)
}

#[async_trait]
impl AlertRepository for InMemoryStore {
    async fn insert_reported(
        &self,
        alert: &Alert,
        credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        state.alerts.insert(alert.id, alert.clone());
        state.credit(credit);
        Ok(())
    }

    async fn insert_reported_batch(
        &self,
        alerts: &[Alert],
        credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        for alert in alerts {
            state.alerts.insert(alert.id, alert.clone());
        }
        state.credit(credit);
        Ok(())
    }

    async fn find_by_id(&self, id: &AlertId) -> Result<Option<Alert>, AlertRepositoryError> {
        let state = self.lock().map_err(AlertRepositoryError::query)?;
        Ok(state.alerts.get(id).cloned())
    }

    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Alert>, AlertRepositoryError> {
        let state = self.lock().map_err(AlertRepositoryError::query)?;
        let mut live: Vec<Alert> = state
            .alerts
            .values()
            .filter(|alert| alert.is_live(now))
            .cloned()
            .collect();
        live.sort_by_key(|alert| std::cmp::Reverse(alert.created_at));
        Ok(live)
    }

    async fn list_matching(
        &self,
        filter: &AlertFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AlertRepositoryError> {
        let state = self.lock().map_err(AlertRepositoryError::query)?;
        Ok(state
            .alerts
            .values()
            .filter(|alert| filter.matches(alert, now))
            .cloned()
            .collect())
    }

    async fn list_by_reporter(
        &self,
        reporter: &UserId,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<Page<Alert>, AlertRepositoryError> {
        let state = self.lock().map_err(AlertRepositoryError::query)?;
        let mut mine: Vec<Alert> = state
            .alerts
            .values()
            .filter(|alert| &alert.reporter_id == reporter)
            .filter(|alert| status.is_none_or(|status| alert.status == status))
            .cloned()
            .collect();
        mine.sort_by_key(|alert| std::cmp::Reverse(alert.created_at));
        Ok(page.slice(mine))
    }

    async fn apply_edit(
        &self,
        id: &AlertId,
        edit: &AlertEdit,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        let Some(alert) = state.alerts.get_mut(id) else {
            return Ok(None);
        };
        if alert.status.is_terminal() {
            return Ok(None);
        }
        if let Some(severity) = edit.severity {
            alert.severity = severity;
        }
        if let Some(description) = &edit.description {
            alert.details.description = Some(description.clone());
        }
        Ok(Some(alert.clone()))
    }

    async fn remove(
        &self,
        id: &AlertId,
        removal: &AlertRemoval,
        penalty: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        let Some(alert) = state.alerts.get_mut(id) else {
            return Ok(None);
        };
        if !alert.status.can_transition_to(AlertStatus::Removed) {
            return Ok(None);
        }
        if let Some(severity) = removal.edit.severity {
            alert.severity = severity;
        }
        if let Some(description) = &removal.edit.description {
            alert.details.description = Some(description.clone());
        }
        alert.status = AlertStatus::Removed;
        alert.removed_at = Some(removal.removed_at);
        alert.remove_reason = removal.reason.clone();
        let removed = alert.clone();
        state.credit(penalty);
        Ok(Some(removed))
    }

    async fn mark_verified(
        &self,
        id: &AlertId,
        verified_at: DateTime<Utc>,
        reward: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        let Some(alert) = state.alerts.get_mut(id) else {
            return Ok(None);
        };
        if alert.is_verified || !alert.status.can_transition_to(AlertStatus::Verified) {
            return Ok(None);
        }
        alert.is_verified = true;
        alert.status = AlertStatus::Verified;
        alert.verified_at = Some(verified_at);
        let verified = alert.clone();
        state.credit(reward);
        Ok(Some(verified))
    }

    async fn delete(&self, id: &AlertId) -> Result<bool, AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        let existed = state.alerts.remove(id).is_some();
        state.votes.retain(|(alert_id, _), _| alert_id != id);
        Ok(existed)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<AlertId>, AlertRepositoryError> {
        let mut state = self.lock().map_err(AlertRepositoryError::query)?;
        let mut expired: Vec<(DateTime<Utc>, AlertId)> = state
            .alerts
            .values_mut()
            .filter(|alert| alert.is_due(now))
            .map(|alert| {
                alert.status = AlertStatus::Expired;
                (alert.expires_at, alert.id)
            })
            .collect();
        expired.sort();
        Ok(expired.into_iter().map(|(_, id)| id).collect())
    }
}

#[async_trait]
impl VoteRepository for InMemoryStore {
    async fn find_vote(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
    ) -> Result<Option<Vote>, VoteRepositoryError> {
        let state = self.lock().map_err(VoteRepositoryError::query)?;
        Ok(state
            .votes
            .get(&(*alert_id, *user_id))
            .map(|direction| Vote {
                alert_id: *alert_id,
                user_id: *user_id,
                direction: *direction,
            }))
    }

    async fn apply(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
        change: VoteChange,
    ) -> Result<AlertTally, VoteRepositoryError> {
        let mut state = self.lock().map_err(VoteRepositoryError::query)?;
        let Some(status) = state.alerts.get(alert_id).map(|alert| alert.status) else {
            return Err(VoteRepositoryError::conflict(format!(
                "alert {alert_id} no longer exists"
            )));
        };
        if change.needs_open_alert() && status.is_terminal() {
            return Err(VoteRepositoryError::conflict(format!(
                "alert {alert_id} no longer accepts votes"
            )));
        }

        let key = (*alert_id, *user_id);
        let stored = state.votes.get(&key).copied();
        match change {
            VoteChange::Cast {
                direction,
                voter_bonus,
            } => {
                if stored.is_some() {
                    return Err(VoteRepositoryError::conflict("vote already recorded"));
                }
                state.votes.insert(key, direction);
                state.credit(&ContributionChange::score(*user_id, voter_bonus));
            }
            VoteChange::Flip { to } => {
                if stored != Some(to.opposite()) {
                    return Err(VoteRepositoryError::conflict("vote no longer flippable"));
                }
                state.votes.insert(key, to);
            }
            VoteChange::Retract { direction } => {
                if stored != Some(direction) {
                    return Err(VoteRepositoryError::conflict("vote no longer present"));
                }
                state.votes.remove(&key);
            }
        }

        let (up_delta, down_delta) = change.counter_deltas();
        let alert = state
            .alerts
            .get_mut(alert_id)
            .ok_or_else(|| VoteRepositoryError::query("alert vanished under lock"))?;
        alert.upvotes = shift(alert.upvotes, up_delta);
        alert.downvotes = shift(alert.downvotes, down_delta);
        Ok(alert.tally())
    }
}

#[async_trait]
impl ContributorRepository for InMemoryStore {
    async fn find_stats(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ContributorStats>, ContributorRepositoryError> {
        let state = self.lock().map_err(ContributorRepositoryError::query)?;
        Ok(state.contributors.get(user_id).copied())
    }

    async fn top_by_score(
        &self,
        limit: u32,
    ) -> Result<Vec<ContributorStats>, ContributorRepositoryError> {
        let state = self.lock().map_err(ContributorRepositoryError::query)?;
        let mut ranked: Vec<ContributorStats> = state.contributors.values().copied().collect();
        ranked.sort_by(|a, b| {
            b.contribution_score
                .cmp(&a.contribution_score)
                .then_with(|| b.verified_reports.cmp(&a.verified_reports))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit as usize);
        Ok(ranked)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn fan_out(
        &self,
        template: &NotificationTemplate,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut state = self.lock().map_err(NotificationRepositoryError::query)?;
        let recipients: Vec<UserId> = state.contributors.keys().copied().collect();
        for user_id in &recipients {
            let note = template.for_user(*user_id, now);
            state.notifications.insert(note.id, note);
        }
        Ok(recipients.len() as u64)
    }

    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, NotificationRepositoryError> {
        let state = self.lock().map_err(NotificationRepositoryError::query)?;
        let mut mine: Vec<Notification> = state
            .notifications
            .values()
            .filter(|note| &note.user_id == user_id && !(unread_only && note.is_read))
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(page.slice(mine))
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let state = self.lock().map_err(NotificationRepositoryError::query)?;
        Ok(state
            .notifications
            .values()
            .filter(|note| &note.user_id == user_id && !note.is_read)
            .count() as u64)
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut state = self.lock().map_err(NotificationRepositoryError::query)?;
        Ok(state.owned_notification(user_id, id).map(|note| {
            note.is_read = true;
            note.clone()
        }))
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut state = self.lock().map_err(NotificationRepositoryError::query)?;
        let mut changed = 0;
        for note in state.notifications.values_mut() {
            if &note.user_id == user_id && !note.is_read {
                note.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut state = self.lock().map_err(NotificationRepositoryError::query)?;
        if state.owned_notification(user_id, id).is_none() {
            return Ok(false);
        }
        Ok(state.notifications.remove(id).is_some())
    }
}

#[async_trait]
impl SosRepository for InMemoryStore {
    async fn insert(&self, request: &SosRequest) -> Result<(), SosRepositoryError> {
        let mut state = self.lock().map_err(SosRepositoryError::query)?;
        let has_active = state.sos.values().any(|existing| {
            existing.user_id == request.user_id && existing.status == SosStatus::Active
        });
        if has_active {
            return Err(SosRepositoryError::conflict(
                "user already has an active SOS request",
            ));
        }
        state.sos.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SosId) -> Result<Option<SosRequest>, SosRepositoryError> {
        let state = self.lock().map_err(SosRepositoryError::query)?;
        Ok(state.sos.get(id).cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SosRequest>, SosRepositoryError> {
        let state = self.lock().map_err(SosRepositoryError::query)?;
        Ok(state
            .sos
            .values()
            .find(|request| &request.user_id == user_id && request.status == SosStatus::Active)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<SosRequest>, SosRepositoryError> {
        let state = self.lock().map_err(SosRepositoryError::query)?;
        Ok(state
            .sos
            .values()
            .filter(|request| request.status == SosStatus::Active)
            .cloned()
            .collect())
    }

    async fn save_transition(
        &self,
        request: &SosRequest,
        expected: SosStatus,
    ) -> Result<bool, SosRepositoryError> {
        let mut state = self.lock().map_err(SosRepositoryError::query)?;
        match state.sos.get_mut(&request.id) {
            Some(stored) if stored.status == expected => {
                *stored = request.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
