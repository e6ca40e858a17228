//! Driving port for alert reporting and lifecycle mutations.

use async_trait::async_trait;

use crate::domain::alert::{Alert, AlertEdit, AlertReport, AlertStatus, OfflineReport};
use crate::domain::{Actor, AlertId, Error};

/// Reporter/admin edit of an existing alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertUpdate {
    pub edit: AlertEdit,
    /// Requested lifecycle target; only `REMOVED` is accepted.
    pub status: Option<AlertStatus>,
}

/// An offline report that was not stored, by its position in the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedReport {
    pub index: usize,
    pub reason: Error,
}

/// Outcome of syncing a batch of offline reports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OfflineSync {
    pub created: Vec<Alert>,
    pub skipped: Vec<SkippedReport>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertCommand: Send + Sync {
    /// Persist a new `ACTIVE` alert, credit the reporter, and announce it.
    async fn report(&self, actor: &Actor, report: AlertReport) -> Result<Alert, Error>;

    /// Edit severity or description, or remove via `status: REMOVED`.
    async fn update(
        &self,
        actor: &Actor,
        id: &AlertId,
        update: AlertUpdate,
    ) -> Result<Alert, Error>;

    /// `→ REMOVED` with an optional reason; penalises the reporter.
    async fn remove(
        &self,
        actor: &Actor,
        id: &AlertId,
        reason: Option<String>,
    ) -> Result<Alert, Error>;

    /// Store a batch of offline reports in one unit, crediting the reporter
    /// for each stored alert. Reports that are invalid or already expired
    /// are skipped.
    async fn sync_offline(
        &self,
        actor: &Actor,
        reports: Vec<OfflineReport>,
    ) -> Result<OfflineSync, Error>;

    /// Physical delete, bypassing the lifecycle.
    async fn delete(&self, actor: &Actor, id: &AlertId) -> Result<(), Error>;
}
