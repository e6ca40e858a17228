//! SOS requests: a user asking nearby road users for help.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::alert::{ADDRESS_MAX, DESCRIPTION_MAX, FieldTooLong, check_length};
use super::geo::Coordinates;
use super::{SosId, UserId};

/// What kind of help is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SosKind {
    Medical,
    Accident,
    Breakdown,
    Fuel,
    Security,
    Other,
}

impl SosKind {
    const ALL: [SosKind; 6] = [
        Self::Medical,
        Self::Accident,
        Self::Breakdown,
        Self::Fuel,
        Self::Security,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medical => "MEDICAL",
            Self::Accident => "ACCIDENT",
            Self::Breakdown => "BREAKDOWN",
            Self::Fuel => "FUEL",
            Self::Security => "SECURITY",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    pub fn from_stored(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Other)
    }
}

/// Progress of an SOS request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SosStatus {
    Active,
    Responded,
    Resolved,
    Cancelled,
}

impl SosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Responded => "RESPONDED",
            Self::Resolved => "RESOLVED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [
            Self::Active,
            Self::Responded,
            Self::Resolved,
            Self::Cancelled,
        ]
        .into_iter()
        .find(|status| status.as_str() == raw)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: SosStatus) -> bool {
        use SosStatus::{Active, Cancelled, Resolved, Responded};
        matches!(
            (*self, next),
            (Active, Responded | Resolved | Cancelled) | (Responded, Resolved | Cancelled)
        )
    }
}

/// A request for roadside help.
#[derive(Debug, Clone, PartialEq)]
pub struct SosRequest {
    pub id: SosId,
    pub user_id: UserId,
    pub kind: SosKind,
    pub description: Option<String>,
    pub address: Option<String>,
    pub position: Coordinates,
    pub status: SosStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// What a user submits when raising an SOS.
#[derive(Debug, Clone, PartialEq)]
pub struct SosDraft {
    pub kind: SosKind,
    pub description: Option<String>,
    pub address: Option<String>,
    pub position: Coordinates,
}

impl SosDraft {
    pub fn validate(&self) -> Result<(), FieldTooLong> {
        check_length("description", self.description.as_deref(), DESCRIPTION_MAX)?;
        check_length("address", self.address.as_deref(), ADDRESS_MAX)
    }
}

impl SosRequest {
    pub fn raise(user_id: UserId, draft: SosDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: SosId::random(),
            user_id,
            kind: draft.kind,
            description: draft.description,
            address: draft.address,
            position: draft.position,
            status: SosStatus::Active,
            created_at: now,
            responded_at: None,
            resolved_at: None,
        }
    }

    /// Move to `next`, stamping `responded_at` / `resolved_at` as appropriate.
    ///
    /// Returns `false` and leaves the request untouched for an illegal edge.
    pub fn advance(&mut self, next: SosStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        match next {
            SosStatus::Responded => self.responded_at = Some(now),
            SosStatus::Resolved => self.resolved_at = Some(now),
            SosStatus::Active | SosStatus::Cancelled => {}
        }
        self.status = next;
        true
    }
}
