//! Road alerts: hazard kinds, severities, lifecycle states, and TTLs.
//!
//! An alert's expiry is fixed when it is reported:
//! `expires_at = created_at + base_ttl(kind) × multiplier(severity)`.
//! Later severity edits never move it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::geo::Coordinates;
use super::{AlertId, UserId};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Kind of road hazard being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Pothole,
    Accident,
    Flood,
    BrokenRoad,
    Landslide,
    RoadClosure,
    PoliceCheckpoint,
    HeavyTraffic,
    Fire,
    AnimalCrossing,
    Roadblock,
    WeatherHazard,
    Construction,
    Other,
}

impl AlertType {
    pub const ALL: [AlertType; 14] = [
        Self::Pothole,
        Self::Accident,
        Self::Flood,
        Self::BrokenRoad,
        Self::Landslide,
        Self::RoadClosure,
        Self::PoliceCheckpoint,
        Self::HeavyTraffic,
        Self::Fire,
        Self::AnimalCrossing,
        Self::Roadblock,
        Self::WeatherHazard,
        Self::Construction,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pothole => "POTHOLE",
            Self::Accident => "ACCIDENT",
            Self::Flood => "FLOOD",
            Self::BrokenRoad => "BROKEN_ROAD",
            Self::Landslide => "LANDSLIDE",
            Self::RoadClosure => "ROAD_CLOSURE",
            Self::PoliceCheckpoint => "POLICE_CHECKPOINT",
            Self::HeavyTraffic => "HEAVY_TRAFFIC",
            Self::Fire => "FIRE",
            Self::AnimalCrossing => "ANIMAL_CROSSING",
            Self::Roadblock => "ROADBLOCK",
            Self::WeatherHazard => "WEATHER_HAZARD",
            Self::Construction => "CONSTRUCTION",
            Self::Other => "OTHER",
        }
    }

    /// Strict parse used for request validation.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    /// Lenient parse for stored rows: unknown kinds read back as `OTHER`.
    pub fn from_stored(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Other)
    }

    /// Base lifetime before the severity multiplier, in milliseconds.
    pub fn base_ttl_ms(&self) -> i64 {
        match self {
            Self::Pothole | Self::Landslide => DAY_MS,
            Self::Accident | Self::Other => 2 * HOUR_MS,
            Self::Flood | Self::Roadblock => 6 * HOUR_MS,
            Self::BrokenRoad | Self::Construction => 7 * DAY_MS,
            Self::RoadClosure => 12 * HOUR_MS,
            Self::PoliceCheckpoint => 4 * HOUR_MS,
            Self::HeavyTraffic => 30 * MINUTE_MS,
            Self::Fire => 3 * HOUR_MS,
            Self::AnimalCrossing | Self::WeatherHazard => HOUR_MS,
        }
    }

    /// Lower-case words for notification text, e.g. `broken road`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_lowercase()
    }
}

/// How serious the hazard is; scales the alert lifetime. Ordered from
/// `LOW` to `CRITICAL`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [Self::Low, Self::Medium, Self::High, Self::Critical]
            .into_iter()
            .find(|severity| severity.as_str() == raw)
    }

    /// Stored rows with an unknown severity read back as `MEDIUM`.
    pub fn from_stored(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Medium)
    }

    /// Multiplier expressed in halves (0.5 → 1, 1.5 → 3) so TTL arithmetic
    /// stays exact in integer milliseconds.
    fn multiplier_halves(&self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 1.0,
            Self::High => 1.5,
            Self::Critical => 2.0,
        }
    }
}

/// Lifetime of a freshly reported alert.
///
/// # Examples
/// ```
/// use chrono::Duration;
/// use roadguard::domain::alert::{alert_lifetime, AlertType, Severity};
///
/// assert_eq!(
///     alert_lifetime(AlertType::Fire, Severity::High),
///     Duration::minutes(270)
/// );
/// ```
pub fn alert_lifetime(kind: AlertType, severity: Severity) -> Duration {
    Duration::milliseconds(kind.base_ttl_ms() * severity.multiplier_halves() / 2)
}

/// Lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Pending,
    Verified,
    Removed,
    Expired,
}

impl AlertStatus {
    /// States the expiration sweep moves to `EXPIRED`.
    pub const EXPIRABLE: [AlertStatus; 3] = [Self::Active, Self::Pending, Self::Verified];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Removed => "REMOVED",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [
            Self::Active,
            Self::Pending,
            Self::Verified,
            Self::Removed,
            Self::Expired,
        ]
        .into_iter()
        .find(|status| status.as_str() == raw)
    }

    /// `REMOVED` and `EXPIRED` never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Removed | Self::Expired)
    }

    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        use AlertStatus::{Active, Expired, Pending, Removed, Verified};
        matches!(
            (*self, next),
            (Active | Pending, Verified | Removed | Expired) | (Verified, Removed | Expired)
        )
    }
}

/// Free-text fields attached to an alert, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub road_name: Option<String>,
    pub area: Option<String>,
}

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const ADDRESS_MAX: usize = 500;
pub const ROAD_NAME_MAX: usize = 200;
pub const AREA_MAX: usize = 200;

/// A text field exceeded its maximum length (counted in characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} must be at most {max} characters")]
pub struct FieldTooLong {
    pub field: &'static str,
    pub max: usize,
}

pub(crate) fn check_length(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), FieldTooLong> {
    match value {
        Some(text) if text.chars().count() > max => Err(FieldTooLong { field, max }),
        _ => Ok(()),
    }
}

impl AlertDetails {
    pub fn validate(&self) -> Result<(), FieldTooLong> {
        check_length("title", self.title.as_deref(), TITLE_MAX)?;
        check_length("description", self.description.as_deref(), DESCRIPTION_MAX)?;
        check_length("address", self.address.as_deref(), ADDRESS_MAX)?;
        check_length("roadName", self.road_name.as_deref(), ROAD_NAME_MAX)?;
        check_length("area", self.area.as_deref(), AREA_MAX)
    }
}

/// A reported road hazard.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertType,
    pub severity: Severity,
    pub position: Coordinates,
    pub details: AlertDetails,
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

/// What a user submits when reporting a hazard.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertReport {
    pub kind: AlertType,
    pub severity: Severity,
    pub position: Coordinates,
    pub details: AlertDetails,
}

impl Alert {
    /// Build a new `ACTIVE` alert with its expiry fixed from `now`.
    pub fn report(reporter_id: UserId, report: AlertReport, now: DateTime<Utc>) -> Self {
        let AlertReport {
            kind,
            severity,
            position,
            details,
        } = report;
        Self {
            id: AlertId::random(),
            kind,
            severity,
            position,
            details,
            reporter_id,
            status: AlertStatus::Active,
            upvotes: 0,
            downvotes: 0,
            is_verified: false,
            created_at: now,
            expires_at: now + alert_lifetime(kind, severity),
            verified_at: None,
            removed_at: None,
            remove_reason: None,
        }
    }

    /// Shown in nearby queries: `ACTIVE` and not yet past its expiry.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, AlertStatus::Active) && self.expires_at > now
    }

    /// Due for the expiration sweep at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        AlertStatus::EXPIRABLE.contains(&self.status) && self.expires_at <= now
    }

    pub fn tally(&self) -> AlertTally {
        AlertTally {
            id: self.id,
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            is_verified: self.is_verified,
            status: self.status,
        }
    }
}

/// Vote counters and verification state of one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTally {
    pub id: AlertId,
    pub upvotes: u32,
    pub downvotes: u32,
    pub is_verified: bool,
    pub status: AlertStatus,
}

/// Severity/description edit requested by the reporter or an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertEdit {
    pub severity: Option<Severity>,
    pub description: Option<String>,
}

impl AlertEdit {
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.description.is_none()
    }
}

/// Most offline reports accepted in one sync.
pub const OFFLINE_BATCH_MAX: usize = 50;

/// An alert captured while the reporter was offline and synced later.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineReport {
    pub report: AlertReport,
    /// When the reporter saw the hazard; the sync time when absent.
    pub observed_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Build an alert from an offline report, dating it from when the hazard
    /// was observed. Future timestamps are clamped to `now`.
    pub fn from_offline(reporter_id: UserId, offline: OfflineReport, now: DateTime<Utc>) -> Self {
        let observed = offline.observed_at.map_or(now, |at| at.min(now));
        Self::report(reporter_id, offline.report, observed)
    }
}

/// Criteria for listing unexpired alerts.
///
/// Text criteria match case-insensitive substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertFilter {
    pub kind: Option<AlertType>,
    pub severity: Option<Severity>,
    /// `None` matches every status.
    pub status: Option<AlertStatus>,
    pub verified_only: bool,
    pub area: Option<String>,
    pub road_name: Option<String>,
}

impl Default for AlertFilter {
    fn default() -> Self {
        Self {
            kind: None,
            severity: None,
            status: Some(AlertStatus::Active),
            verified_only: false,
            area: None,
            road_name: None,
        }
    }
}

fn contains_ignoring_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase()))
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert, now: DateTime<Utc>) -> bool {
        alert.expires_at > now
            && self.kind.is_none_or(|kind| alert.kind == kind)
            && self.severity.is_none_or(|severity| alert.severity == severity)
            && self.status.is_none_or(|status| alert.status == status)
            && (!self.verified_only || alert.is_verified)
            && self
                .area
                .as_deref()
                .is_none_or(|area| contains_ignoring_case(alert.details.area.as_deref(), area))
            && self.road_name.as_deref().is_none_or(|road| {
                contains_ignoring_case(alert.details.road_name.as_deref(), road)
            })
    }
}

/// Most severe first, newest first within a severity.
pub fn sort_by_severity(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Parameters of the `→ REMOVED` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRemoval {
    pub reason: Option<String>,
    pub removed_at: DateTime<Utc>,
    /// Edit written together with the removal; empty for a plain removal.
    pub edit: AlertEdit,
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
