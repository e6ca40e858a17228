//! JSON payloads shared by the HTTP responses and WebSocket frames.
//!
//! Field names are camelCase on the wire; enum values use their
//! SCREAMING_SNAKE_CASE names.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::alert::{Alert, AlertStatus, AlertTally, AlertType, Severity};
use crate::domain::events::{BroadcastNotice, NearbyAlertNotice};
use crate::domain::notification::Notification;
use crate::domain::pagination::Page;
use crate::domain::ports::LeaderboardEntry;
use crate::domain::sos::{SosKind, SosRequest, SosStatus};
use crate::domain::{AlertId, ContributorStats, NotificationId, SosId, UserId, UserLevel};

/// Full alert record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    #[schema(value_type = String, format = Uuid)]
    pub id: AlertId,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: Severity,
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub road_name: Option<String>,
    pub area: Option<String>,
    #[schema(value_type = String, format = Uuid)]
    pub reporter_id: UserId,
    pub status: AlertStatus,
    pub upvotes: u32,
    pub downvotes: u32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
    pub remove_reason: Option<String>,
}

impl From<&Alert> for AlertPayload {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            kind: alert.kind,
            severity: alert.severity,
            latitude: alert.position.latitude(),
            longitude: alert.position.longitude(),
            title: alert.details.title.clone(),
            description: alert.details.description.clone(),
            address: alert.details.address.clone(),
            road_name: alert.details.road_name.clone(),
            area: alert.details.area.clone(),
            reporter_id: alert.reporter_id,
            status: alert.status,
            upvotes: alert.upvotes,
            downvotes: alert.downvotes,
            is_verified: alert.is_verified,
            created_at: alert.created_at,
            expires_at: alert.expires_at,
            verified_at: alert.verified_at,
            removed_at: alert.removed_at,
            remove_reason: alert.remove_reason.clone(),
        }
    }
}

/// Counters and verification state after a vote or manual update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertTallyPayload {
    #[schema(value_type = String, format = Uuid)]
    pub id: AlertId,
    pub upvotes: u32,
    pub downvotes: u32,
    pub is_verified: bool,
    pub status: AlertStatus,
}

impl From<AlertTally> for AlertTallyPayload {
    fn from(tally: AlertTally) -> Self {
        Self {
            id: tally.id,
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            is_verified: tally.is_verified,
            status: tally.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyAlertData {
    pub alert_id: AlertId,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: Severity,
    pub latitude: f64,
    pub longitude: f64,
}

/// Push-notification shaped payload of `nearby_alert`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyAlertPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub data: NearbyAlertData,
}

impl From<&NearbyAlertNotice> for NearbyAlertPayload {
    fn from(notice: &NearbyAlertNotice) -> Self {
        Self {
            kind: "NEARBY_ALERT",
            title: notice.title.clone(),
            message: notice.message.clone(),
            data: NearbyAlertData {
                alert_id: notice.alert_id,
                kind: notice.kind,
                severity: notice.severity,
                latitude: notice.position.latitude(),
                longitude: notice.position.longitude(),
            },
        }
    }
}

/// Roadside help request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SosPayload {
    #[schema(value_type = String, format = Uuid)]
    pub id: SosId,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: SosKind,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: SosStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&SosRequest> for SosPayload {
    fn from(request: &SosRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            kind: request.kind,
            description: request.description.clone(),
            address: request.address.clone(),
            latitude: request.position.latitude(),
            longitude: request.position.longitude(),
            status: request.status,
            created_at: request.created_at,
            responded_at: request.responded_at,
            resolved_at: request.resolved_at,
        }
    }
}

/// `sos_nearby` frame body: the request plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SosNearbyPayload {
    #[serde(flatten)]
    pub request: SosPayload,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BroadcastPayload {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&BroadcastNotice> for BroadcastPayload {
    fn from(notice: &BroadcastNotice) -> Self {
        Self {
            title: notice.title.clone(),
            message: notice.message.clone(),
            kind: notice.kind.clone(),
        }
    }
}

/// A user's contribution score, level and report counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionPayload {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    pub contribution_score: i32,
    pub level: UserLevel,
    pub total_reports: i32,
    pub verified_reports: i32,
}

impl From<ContributorStats> for ContributionPayload {
    fn from(stats: ContributorStats) -> Self {
        Self {
            user_id: stats.user_id,
            contribution_score: stats.contribution_score,
            level: stats.level,
            total_reports: stats.total_reports,
            verified_reports: stats.verified_reports,
        }
    }
}

/// Position of a page within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationPayload {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> From<&Page<T>> for PaginationPayload {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.request.page(),
            limit: page.request.limit(),
            total: page.total,
            total_pages: page.total_pages(),
        }
    }
}

/// One inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[schema(value_type = String, format = Uuid)]
    pub id: NotificationId,
    /// `SYSTEM` or the broadcast type.
    #[serde(rename = "type")]
    #[schema(example = "SYSTEM")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationPayload {
    fn from(note: &Notification) -> Self {
        Self {
            id: note.id,
            kind: note.kind.as_str().to_owned(),
            title: note.title.clone(),
            message: note.message.clone(),
            is_read: note.is_read,
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryPayload {
    #[schema(example = 1)]
    pub rank: u32,
    #[serde(flatten)]
    pub stats: ContributionPayload,
}

impl From<LeaderboardEntry> for LeaderboardEntryPayload {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            stats: ContributionPayload::from(entry.stats),
        }
    }
}
