//! RoadGuard domain: alerts, votes, contribution scoring, SOS requests, and
//! the services that drive them.
//!
//! Nothing in here knows about HTTP, WebSockets, or SQL. Inbound adapters call
//! the driving ports in [`ports`]; outbound adapters implement the driven
//! ones.

pub mod alert;
pub mod contribution;
pub mod error;
pub mod events;
pub mod expiration;
pub mod geo;
pub mod ids;
pub mod notification;
pub mod pagination;
pub mod ports;
pub mod sos;
pub mod trace_id;
pub mod user;
pub mod vote;

mod alert_service;
mod broadcast_service;
mod field_errors;
mod notification_service;
mod repository_errors;
mod sos_service;
mod vote_service;

pub use self::alert_service::AlertService;
pub use self::broadcast_service::BroadcastService;
pub use self::contribution::{
    ContributionChange, ContributionPoints, ContributorStats, UserLevel,
};
pub use self::error::{Error, ErrorCode};
pub use self::ids::{AlertId, InvalidIdentifier, NotificationId, SosId, UserId};
pub use self::notification_service::NotificationService;
pub use self::sos_service::SosService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Actor, Role};
pub use self::vote::{Vote, VerificationThreshold, VoteChange, VoteDirection};
pub use self::vote_service::VoteService;
