//! Real-time events emitted by the domain services.
//!
//! Services hand these to the [`AlertEventPublisher`](super::ports::AlertEventPublisher)
//! port together with an [`EventTopic`]; the WebSocket adapter owns the wire
//! encoding.

use super::alert::{Alert, AlertTally, AlertType, Severity};
use super::geo::{Coordinates, GridCell};
use super::sos::SosRequest;
use super::AlertId;

/// Where an event is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// Every connected client.
    Global,
    /// Clients subscribed to this cell (every client in broadcast-all mode).
    Cell(GridCell),
}

impl EventTopic {
    /// Cell topic for an event that happened at `position`.
    pub fn at(position: Coordinates) -> Self {
        Self::Cell(position.cell())
    }
}

/// Push notification sent alongside `new_alert`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyAlertNotice {
    pub title: String,
    pub message: String,
    pub alert_id: AlertId,
    pub kind: AlertType,
    pub severity: Severity,
    pub position: Coordinates,
}

impl NearbyAlertNotice {
    /// `New <type words> Alert` / `A <severity> severity <type words> was
    /// reported nearby`.
    pub fn for_alert(alert: &Alert) -> Self {
        Self {
            title: format!("New {} Alert", alert.kind.as_str().replace('_', " ")),
            message: format!(
                "A {} severity {} was reported nearby",
                alert.severity.as_str().to_lowercase(),
                alert.kind.label()
            ),
            alert_id: alert.id,
            kind: alert.kind,
            severity: alert.severity,
            position: alert.position,
        }
    }
}

/// Admin message pushed to every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastNotice {
    pub title: String,
    pub message: String,
    pub kind: String,
}

/// Default `type` of an admin broadcast.
pub const DEFAULT_BROADCAST_KIND: &str = "EMERGENCY_BROADCAST";

/// Everything pushed to live clients.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    NewAlert(Alert),
    AlertUpdated(AlertTally),
    AlertVerified(Alert),
    AlertRemoved {
        id: AlertId,
        reason: Option<String>,
    },
    AlertExpired {
        id: AlertId,
    },
    NearbyAlert(NearbyAlertNotice),
    SosNearby {
        request: SosRequest,
        message: String,
    },
    Broadcast(BroadcastNotice),
}

impl RealtimeEvent {
    /// Wire name used in the `event` field of outbound frames.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewAlert(_) => "new_alert",
            Self::AlertUpdated(_) => "alert_updated",
            Self::AlertVerified(_) => "alert_verified",
            Self::AlertRemoved { .. } => "alert_removed",
            Self::AlertExpired { .. } => "alert_expired",
            Self::NearbyAlert(_) => "nearby_alert",
            Self::SosNearby { .. } => "sos_nearby",
            Self::Broadcast(_) => "broadcast",
        }
    }

    pub fn sos_nearby(request: SosRequest) -> Self {
        let message = format!("Emergency {} request nearby!", request.kind.as_str());
        Self::SosNearby { request, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::domain::alert::{AlertDetails, AlertReport};
    use chrono::Utc;

    #[test]
    fn nearby_notice_wording() {
        let alert = Alert::report(
            UserId::random(),
            AlertReport {
                kind: AlertType::BrokenRoad,
                severity: Severity::Critical,
                position: Coordinates::new(23.7, 90.4).expect("valid"),
                details: AlertDetails::default(),
            },
            Utc::now(),
        );
        let notice = NearbyAlertNotice::for_alert(&alert);
        assert_eq!(notice.title, "New BROKEN ROAD Alert");
        assert_eq!(
            notice.message,
            "A critical severity broken road was reported nearby"
        );
    }
}
