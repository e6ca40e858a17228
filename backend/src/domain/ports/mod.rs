//! Ports at the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`AlertEventPublisher`]) are implemented by
//! outbound adapters; driving ports (`*Command`, [`AlertQuery`],
//! [`NotificationInbox`]) are implemented by the domain services and called
//! by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod alert_command;
mod alert_query;
mod alert_repository;
mod broadcast_command;
mod contributor_repository;
mod event_publisher;
mod notification_inbox;
mod notification_repository;
mod sos_command;
mod sos_repository;
mod vote_command;
mod vote_repository;

#[cfg(test)]
pub use alert_command::MockAlertCommand;
pub use alert_command::{AlertCommand, AlertUpdate, OfflineSync, SkippedReport};
#[cfg(test)]
pub use alert_query::MockAlertQuery;
pub use alert_query::{AlertQuery, AlertView, LeaderboardEntry, ListedAlert, NearbyAlert};
#[cfg(test)]
pub use alert_repository::MockAlertRepository;
pub use alert_repository::{AlertRepository, AlertRepositoryError, FixtureAlertRepository};
#[cfg(test)]
pub use broadcast_command::MockBroadcastCommand;
pub use broadcast_command::BroadcastCommand;
#[cfg(test)]
pub use contributor_repository::MockContributorRepository;
pub use contributor_repository::{ContributorRepository, ContributorRepositoryError};
#[cfg(test)]
pub use event_publisher::MockAlertEventPublisher;
pub use event_publisher::{AlertEventPublisher, FixtureEventPublisher};
#[cfg(test)]
pub use notification_inbox::MockNotificationInbox;
pub use notification_inbox::NotificationInbox;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use sos_command::MockSosCommand;
pub use sos_command::{NearbySos, SosCommand};
#[cfg(test)]
pub use sos_repository::MockSosRepository;
pub use sos_repository::{SosRepository, SosRepositoryError};
#[cfg(test)]
pub use vote_command::MockVoteCommand;
pub use vote_command::{VoteCommand, VoteStatus};
#[cfg(test)]
pub use vote_repository::MockVoteRepository;
pub use vote_repository::{VoteRepository, VoteRepositoryError};
