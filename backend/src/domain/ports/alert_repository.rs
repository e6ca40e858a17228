//! Port for alert persistence and the contribution updates tied to it.
//!
//! Every method that changes more than one record (alert plus reporter
//! counters) must apply all of it atomically or none of it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::alert::{Alert, AlertEdit, AlertFilter, AlertRemoval, AlertStatus};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{AlertId, ContributionChange, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by alert repository adapters.
    pub enum AlertRepositoryError {
        /// The store could not be reached.
        Connection =>
            "alert repository connection failed: {message}",
        /// A query or mutation failed.
        Query =>
            "alert repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Insert a freshly reported alert and credit the reporter.
    async fn insert_reported(
        &self,
        alert: &Alert,
        credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError>;

    /// Insert a batch of alerts and apply one combined credit, all or none.
    async fn insert_reported_batch(
        &self,
        alerts: &[Alert],
        credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError>;

    async fn find_by_id(&self, id: &AlertId) -> Result<Option<Alert>, AlertRepositoryError>;

    /// Alerts with status `ACTIVE` and `expires_at > now`.
    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Alert>, AlertRepositoryError>;

    /// Alerts for which `filter.matches(alert, now)` holds, in any order.
    async fn list_matching(
        &self,
        filter: &AlertFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AlertRepositoryError>;

    /// One page of `reporter`'s alerts, newest first.
    async fn list_by_reporter(
        &self,
        reporter: &UserId,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<Page<Alert>, AlertRepositoryError>;

    /// Apply a severity/description edit to a non-terminal alert.
    ///
    /// Returns `None` when the alert is missing or already terminal.
    async fn apply_edit(
        &self,
        id: &AlertId,
        edit: &AlertEdit,
    ) -> Result<Option<Alert>, AlertRepositoryError>;

    /// Move a non-terminal alert to `REMOVED`, write `removal.edit` and apply
    /// the reporter penalty, all in one unit.
    ///
    /// Returns `None` when the alert is missing or already terminal; nothing
    /// is written in that case, not even the edit.
    async fn remove(
        &self,
        id: &AlertId,
        removal: &AlertRemoval,
        penalty: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError>;

    /// Mark a non-terminal, unverified alert `VERIFIED` and reward the reporter.
    ///
    /// Guarded on `is_verified = false`: returns the updated alert only for
    /// the call that performed the transition.
    async fn mark_verified(
        &self,
        id: &AlertId,
        verified_at: DateTime<Utc>,
        reward: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError>;

    /// Physically delete an alert and its votes. Returns whether it existed.
    async fn delete(&self, id: &AlertId) -> Result<bool, AlertRepositoryError>;

    /// Move every expirable alert with `expires_at <= now` to `EXPIRED` in a
    /// single statement, returning the affected ids.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<AlertId>, AlertRepositoryError>;
}

/// Repository with no alerts; every mutation is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAlertRepository;

#[async_trait]
impl AlertRepository for FixtureAlertRepository {
    async fn insert_reported(
        &self,
        _alert: &Alert,
        _credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError> {
        Ok(())
    }

    async fn insert_reported_batch(
        &self,
        _alerts: &[Alert],
        _credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &AlertId) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(None)
    }

    async fn list_live(&self, _now: DateTime<Utc>) -> Result<Vec<Alert>, AlertRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_matching(
        &self,
        _filter: &AlertFilter,
        _now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AlertRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_by_reporter(
        &self,
        _reporter: &UserId,
        _status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<Page<Alert>, AlertRepositoryError> {
        Ok(Page::new(Vec::new(), page, 0))
    }

    async fn apply_edit(
        &self,
        _id: &AlertId,
        _edit: &AlertEdit,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(None)
    }

    async fn remove(
        &self,
        _id: &AlertId,
        _removal: &AlertRemoval,
        _penalty: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(None)
    }

    async fn mark_verified(
        &self,
        _id: &AlertId,
        _verified_at: DateTime<Utc>,
        _reward: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _id: &AlertId) -> Result<bool, AlertRepositoryError> {
        Ok(false)
    }

    async fn expire_due(
        &self,
        _now: DateTime<Utc>,
    ) -> Result<Vec<AlertId>, AlertRepositoryError> {
        Ok(Vec::new())
    }
}
