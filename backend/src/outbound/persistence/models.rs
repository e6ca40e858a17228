//! Internal Diesel row structs and their translation to domain types.
//!
//! Rows never leave the persistence module; repositories convert them at the
//! boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::alert::{Alert, AlertDetails, AlertEdit, AlertStatus, AlertType, Severity};
use crate::domain::geo::{CoordinateError, Coordinates};
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::sos::{SosKind, SosRequest, SosStatus};
use crate::domain::{AlertId, ContributorStats, NotificationId, SosId, UserId, UserLevel};

use super::schema::{alert_votes, alerts, contributors, notifications, sos_requests};

/// Counters are `u32` in the domain and `INTEGER` with a `>= 0` check in SQL.
pub(crate) fn counter_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

pub(crate) fn counter_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = alerts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AlertRow {
    pub id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub road_name: Option<String>,
    pub area: Option<String>,
    pub reporter_id: Uuid,
    pub status: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
    pub remove_reason: Option<String>,
}

impl AlertRow {
    /// Unknown stored enum values fall back to `OTHER`/`MEDIUM`; an unknown
    /// status reads as `ACTIVE` so the sweep still reaches the row.
    pub(crate) fn into_domain(self) -> Result<Alert, CoordinateError> {
        Ok(Alert {
            id: AlertId::from_uuid(self.id),
            kind: AlertType::from_stored(&self.alert_type),
            severity: Severity::from_stored(&self.severity),
            position: Coordinates::new(self.latitude, self.longitude)?,
            details: AlertDetails {
                title: self.title,
                description: self.description,
                address: self.address,
                road_name: self.road_name,
                area: self.area,
            },
            reporter_id: UserId::from_uuid(self.reporter_id),
            status: AlertStatus::parse(&self.status).unwrap_or(AlertStatus::Active),
            upvotes: counter_from_db(self.upvotes),
            downvotes: counter_from_db(self.downvotes),
            is_verified: self.is_verified,
            created_at: self.created_at,
            expires_at: self.expires_at,
            verified_at: self.verified_at,
            removed_at: self.removed_at,
            remove_reason: self.remove_reason,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = alerts)]
pub(crate) struct NewAlertRow<'a> {
    pub id: Uuid,
    pub alert_type: &'a str,
    pub severity: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub address: Option<&'a str>,
    pub road_name: Option<&'a str>,
    pub area: Option<&'a str>,
    pub reporter_id: Uuid,
    pub status: &'a str,
    pub upvotes: i32,
    pub downvotes: i32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<'a> From<&'a Alert> for NewAlertRow<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self {
            id: *alert.id.as_uuid(),
            alert_type: alert.kind.as_str(),
            severity: alert.severity.as_str(),
            latitude: alert.position.latitude(),
            longitude: alert.position.longitude(),
            title: alert.details.title.as_deref(),
            description: alert.details.description.as_deref(),
            address: alert.details.address.as_deref(),
            road_name: alert.details.road_name.as_deref(),
            area: alert.details.area.as_deref(),
            reporter_id: *alert.reporter_id.as_uuid(),
            status: alert.status.as_str(),
            upvotes: counter_to_db(alert.upvotes),
            downvotes: counter_to_db(alert.downvotes),
            is_verified: alert.is_verified,
            created_at: alert.created_at,
            expires_at: alert.expires_at,
        }
    }
}

/// `None` fields are left untouched by the update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = alerts)]
pub(crate) struct AlertEditChangeset<'a> {
    pub severity: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> From<&'a AlertEdit> for AlertEditChangeset<'a> {
    fn from(edit: &'a AlertEdit) -> Self {
        Self {
            severity: edit.severity.as_ref().map(Severity::as_str),
            description: edit.description.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = alert_votes)]
pub(crate) struct NewVoteRow {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub is_upvote: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = contributors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContributorRow {
    pub user_id: Uuid,
    pub contribution_score: i32,
    #[expect(dead_code, reason = "level is recomputed from the score on read")]
    pub level: String,
    pub total_reports: i32,
    pub verified_reports: i32,
}

impl From<ContributorRow> for ContributorStats {
    fn from(row: ContributorRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            contribution_score: row.contribution_score,
            level: UserLevel::for_score(row.contribution_score),
            total_reports: row.total_reports,
            verified_reports: row.verified_reports,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contributors)]
pub(crate) struct NewContributorRow<'a> {
    pub user_id: Uuid,
    pub contribution_score: i32,
    pub level: &'a str,
    pub total_reports: i32,
    pub verified_reports: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            kind: NotificationKind::from_stored(&row.kind),
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Notification> for NewNotificationRow<'a> {
    fn from(note: &'a Notification) -> Self {
        Self {
            id: *note.id.as_uuid(),
            user_id: *note.user_id.as_uuid(),
            kind: note.kind.as_str(),
            title: &note.title,
            message: &note.message,
            is_read: note.is_read,
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sos_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SosRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sos_type: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SosRow {
    pub(crate) fn into_domain(self) -> Result<SosRequest, CoordinateError> {
        Ok(SosRequest {
            id: SosId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            kind: SosKind::from_stored(&self.sos_type),
            description: self.description,
            address: self.address,
            position: Coordinates::new(self.latitude, self.longitude)?,
            status: SosStatus::parse(&self.status).unwrap_or(SosStatus::Active),
            created_at: self.created_at,
            responded_at: self.responded_at,
            resolved_at: self.resolved_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sos_requests)]
pub(crate) struct NewSosRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sos_type: &'a str,
    pub description: Option<&'a str>,
    pub address: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a SosRequest> for NewSosRow<'a> {
    fn from(request: &'a SosRequest) -> Self {
        Self {
            id: *request.id.as_uuid(),
            user_id: *request.user_id.as_uuid(),
            sos_type: request.kind.as_str(),
            description: request.description.as_deref(),
            address: request.address.as_deref(),
            latitude: request.position.latitude(),
            longitude: request.position.longitude(),
            status: request.status.as_str(),
            created_at: request.created_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = sos_requests)]
pub(crate) struct SosTransitionChangeset<'a> {
    pub status: &'a str,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}
