//! Wire-level frames for the WebSocket adapter.
//!
//! Both directions use the envelope `{"event": <name>, "data": <payload>}`.
//! Domain [`RealtimeEvent`]s become [`ServerFrame`]s just before they are
//! written to a socket.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::events::RealtimeEvent;
use crate::domain::geo::{Coordinates, SearchRadius};
use crate::domain::{AlertId, Error};
use crate::inbound::http::validation::{parse_coordinates, parse_radius};
use crate::inbound::payloads::{
    AlertPayload, AlertTallyPayload, BroadcastPayload, NearbyAlertPayload, SosNearbyPayload,
    SosPayload,
};

/// Raw client frame. Anything that fails to parse as this closes the socket.
#[derive(Debug, Deserialize)]
pub struct ClientEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct LocationData {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<f64>,
}

/// Validated client request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientCommand {
    /// Join the cell containing `position` and its eight neighbours.
    JoinLocation {
        position: Coordinates,
        radius: SearchRadius,
    },
    LeaveLocation(Coordinates),
    UpdateLocation(Coordinates),
}

impl TryFrom<ClientEnvelope> for ClientCommand {
    type Error = Error;

    fn try_from(envelope: ClientEnvelope) -> Result<Self, Self::Error> {
        let ClientEnvelope { event, data } = envelope;
        let parse_data = |data: Value| {
            serde_json::from_value::<LocationData>(data).map_err(|err| {
                Error::invalid_request(format!("invalid {event} payload: {err}"))
                    .with_details(json!({ "field": "data" }))
            })
        };
        match event.as_str() {
            "join_location" => {
                let data = parse_data(data)?;
                Ok(Self::JoinLocation {
                    position: parse_coordinates(data.latitude, data.longitude)?,
                    radius: parse_radius(data.radius, SearchRadius::NOTIFICATION)?,
                })
            }
            "leave_location" => {
                let data = parse_data(data)?;
                Ok(Self::LeaveLocation(parse_coordinates(
                    data.latitude,
                    data.longitude,
                )?))
            }
            "update_location" => {
                let data = parse_data(data)?;
                Ok(Self::UpdateLocation(parse_coordinates(
                    data.latitude,
                    data.longitude,
                )?))
            }
            other => Err(Error::invalid_request(format!("unknown event: {other}"))
                .with_details(json!({ "field": "event", "value": other }))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRemovedPayload {
    pub id: AlertId,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertExpiredPayload {
    pub id: AlertId,
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    NewAlert(AlertPayload),
    AlertUpdated(AlertTallyPayload),
    AlertVerified(AlertPayload),
    AlertRemoved(AlertRemovedPayload),
    AlertExpired(AlertExpiredPayload),
    NearbyAlert(NearbyAlertPayload),
    SosNearby(SosNearbyPayload),
    Broadcast(BroadcastPayload),
    Error(Error),
}

impl From<&RealtimeEvent> for ServerFrame {
    fn from(event: &RealtimeEvent) -> Self {
        match event {
            RealtimeEvent::NewAlert(alert) => Self::NewAlert(AlertPayload::from(alert)),
            RealtimeEvent::AlertUpdated(tally) => {
                Self::AlertUpdated(AlertTallyPayload::from(*tally))
            }
            RealtimeEvent::AlertVerified(alert) => Self::AlertVerified(AlertPayload::from(alert)),
            RealtimeEvent::AlertRemoved { id, reason } => {
                Self::AlertRemoved(AlertRemovedPayload {
                    id: *id,
                    reason: reason.clone(),
                })
            }
            RealtimeEvent::AlertExpired { id } => {
                Self::AlertExpired(AlertExpiredPayload { id: *id })
            }
            RealtimeEvent::NearbyAlert(notice) => {
                Self::NearbyAlert(NearbyAlertPayload::from(notice))
            }
            RealtimeEvent::SosNearby { request, message } => Self::SosNearby(SosNearbyPayload {
                request: SosPayload::from(request),
                message: message.clone(),
            }),
            RealtimeEvent::Broadcast(notice) => Self::Broadcast(BroadcastPayload::from(notice)),
        }
    }
}
